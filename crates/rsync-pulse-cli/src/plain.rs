use rsync_pulse_core::model::COMPLETED_STATUS;
use rsync_pulse_core::{RunObserver, RunOutcome};
use std::io::{self, Write};

/// Fallback view: rsync's output verbatim, the way a text log shows it.
pub struct PlainObserver;

impl RunObserver for PlainObserver {
    fn on_line(&self, raw_line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(raw_line.as_bytes());
        if !raw_line.ends_with('\n') {
            let _ = stdout.write_all(b"\n");
        }
    }

    fn on_read_error(&self, error: &io::Error) {
        eprintln!("Error reading rsync output: {}", error);
    }

    fn on_complete(&self, outcome: &RunOutcome) {
        let _ = io::stdout().flush();
        match outcome.exit_code() {
            Some(0) => println!("{}", COMPLETED_STATUS),
            Some(code) => println!("{} (rsync exit code {})", COMPLETED_STATUS, code),
            None => println!("{} ({:?})", COMPLETED_STATUS, outcome.end),
        }
    }
}
