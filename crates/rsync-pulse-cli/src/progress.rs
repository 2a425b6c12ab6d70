use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rsync_pulse_core::model::PREPARING_STATUS;
use rsync_pulse_core::{FileEvent, PresentationModel, RunEnd, RunObserver, RunOutcome, SyncCommand};

/// Terminal rendering of the presentation model.
///
/// - spinner advanced by the run's pulse timer, message = status text
/// - every classified event printed above it, deletions in red
/// - summary once the run completes
pub struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        pb.set_message(PREPARING_STATUS);
        Self { bar: pb }
    }

    fn print(&self, line: String) {
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
    }
}

impl RunObserver for CliObserver {
    fn on_start(&self, command: &SyncCommand, _pid: Option<u32>) {
        self.print(format!("{}", command.to_string().dimmed()));
    }

    fn on_event(&self, event: &FileEvent, model: &PresentationModel) {
        let action = format!("{:<9}", event.action().as_str());
        let line = if event.action().is_destructive() {
            format!("{} {}", action.red(), event.path().red())
        } else {
            format!("{} {}", action.green(), event.path().green())
        };
        self.print(line);
        self.bar.set_message(model.status_text().to_string());
    }

    fn on_pulse(&self) {
        self.bar.tick();
    }

    fn on_read_error(&self, error: &std::io::Error) {
        self.print(format!("{} {}", "read error:".red().bold(), error));
    }

    fn on_complete(&self, outcome: &RunOutcome) {
        self.bar.set_style(
            ProgressStyle::with_template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        let mark = if outcome.succeeded() { "✓".green() } else { "✗".red() };
        self.bar
            .finish_with_message(format!("  {} {}", mark, outcome.model.status_text()));

        let counts = outcome.model.counts();
        eprintln!(
            "  {} sent, {} received, {} deleted in {:.2}s",
            format!("{}", counts.sending).green(),
            format!("{}", counts.receiving).green(),
            format!("{}", counts.deleting).red(),
            outcome.duration.as_secs_f64(),
        );

        match (&outcome.end, outcome.exit_code()) {
            (RunEnd::EndOfStream, Some(0)) => {}
            (RunEnd::EndOfStream, Some(code)) => {
                eprintln!("  {} rsync exited with code {}", "!".yellow(), code)
            }
            (RunEnd::EndOfStream, None) => {
                eprintln!("  {} rsync was terminated by a signal", "!".yellow())
            }
            (RunEnd::ReadFailed(reason), _) => {
                eprintln!("  {} output stopped early: {}", "!".yellow(), reason)
            }
            (RunEnd::Cancelled, _) => eprintln!("  {} cancelled", "!".yellow()),
        }
    }
}
