use crate::command::SyncCommand;
use crate::error::Error;
use crate::launcher::{self, ChildProcessHandle, OutputStream};
use crate::model::PresentationModel;
use crate::observer::RunObserver;
use crate::pulse::{PulseTimer, DEFAULT_PULSE_INTERVAL};
use crate::pump::{EventPump, PumpInput, PumpStep, RunEnd};
use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Result of one finished run.
#[derive(Debug)]
pub struct RunOutcome {
    pub end: RunEnd,
    pub exit_status: Option<ExitStatus>,
    pub lines_read: usize,
    pub model: PresentationModel,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status.and_then(|status| status.code())
    }

    pub fn succeeded(&self) -> bool {
        self.end == RunEnd::EndOfStream && self.exit_status.is_some_and(|s| s.success())
    }
}

/// Drives one rsync run from launch to completion on the current task.
pub struct SyncSession {
    command: SyncCommand,
    pulse_interval: Duration,
}

impl SyncSession {
    pub fn new(command: SyncCommand) -> Self {
        Self {
            command,
            pulse_interval: DEFAULT_PULSE_INTERVAL,
        }
    }

    pub fn with_pulse_interval(mut self, interval: Duration) -> Self {
        self.pulse_interval = interval;
        self
    }

    pub fn command(&self) -> &SyncCommand {
        &self.command
    }

    pub async fn run(&self, observer: &dyn RunObserver) -> Result<RunOutcome, Error> {
        self.run_until(observer, std::future::pending()).await
    }

    /// Run rsync until it closes its output, its output fails, or `cancel`
    /// resolves. Launch failures are returned before anything else happens.
    pub async fn run_until<F>(
        &self,
        observer: &dyn RunObserver,
        cancel: F,
    ) -> Result<RunOutcome, Error>
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let handle = launcher::launch(&self.command)?;
        Ok(self.drive(handle, observer, cancel, start).await)
    }

    /// Pump a launched run to completion and tear it down. `cancel` is
    /// watched both while reading and while waiting for the process to exit.
    pub(crate) async fn drive<H, F>(
        &self,
        mut handle: H,
        observer: &dyn RunObserver,
        cancel: F,
        start: Instant,
    ) -> RunOutcome
    where
        H: RunHandle,
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        info!("Running {} (pid {:?})", self.command, handle.pid());
        observer.on_start(&self.command, handle.pid());

        let mut model = PresentationModel::new();
        let mut pulse = PulseTimer::start(self.pulse_interval);

        let (end, lines_read) = pump_output(
            handle.output_mut(),
            &mut model,
            &mut pulse,
            observer,
            cancel.as_mut(),
        )
        .await;

        // Handle goes first, then the timer, then the model.
        let (end, exit_status) = handle.release_until(end, cancel.as_mut()).await;
        pulse.cancel();
        model.complete();

        let outcome = RunOutcome {
            end,
            exit_status,
            lines_read,
            model,
            duration: start.elapsed(),
        };

        if outcome.succeeded() {
            info!(
                "rsync finished: {} lines, {} file events in {:.2}s",
                outcome.lines_read,
                outcome.model.total_events(),
                outcome.duration.as_secs_f64()
            );
        } else {
            warn!(
                "rsync ended with {:?} (exit code {:?}) after {} lines",
                outcome.end,
                outcome.exit_code(),
                outcome.lines_read
            );
        }

        observer.on_complete(&outcome);
        outcome
    }
}

/// A launched run as seen by [`SyncSession::drive`]: an output reader and a
/// teardown that consumes it.
pub(crate) trait RunHandle {
    type Output: AsyncBufRead + Unpin;

    fn pid(&self) -> Option<u32>;

    fn output_mut(&mut self) -> &mut Self::Output;

    async fn release_until<F>(
        self,
        end: RunEnd,
        cancel: Pin<&mut F>,
    ) -> (RunEnd, Option<ExitStatus>)
    where
        F: Future<Output = ()>;
}

impl RunHandle for ChildProcessHandle {
    type Output = BufReader<OutputStream>;

    fn pid(&self) -> Option<u32> {
        ChildProcessHandle::pid(self)
    }

    fn output_mut(&mut self) -> &mut Self::Output {
        ChildProcessHandle::output_mut(self)
    }

    async fn release_until<F>(
        self,
        end: RunEnd,
        cancel: Pin<&mut F>,
    ) -> (RunEnd, Option<ExitStatus>)
    where
        F: Future<Output = ()>,
    {
        ChildProcessHandle::release_until(self, end, cancel).await
    }
}

/// Read lines from `reader` and feed them through the event pump until it
/// finishes. Returns why it finished and how many lines were read.
///
/// The line buffer survives across `select!` iterations: a read that loses
/// the race to a pulse tick keeps its partial bytes for the next attempt.
pub(crate) async fn pump_output<R, F>(
    reader: &mut R,
    model: &mut PresentationModel,
    pulse: &mut PulseTimer,
    observer: &dyn RunObserver,
    mut cancel: Pin<&mut F>,
) -> (RunEnd, usize)
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let mut pump = EventPump::new();
    let mut buf = Vec::new();

    loop {
        let input = tokio::select! {
            biased;
            _ = cancel.as_mut() => PumpInput::Cancelled,
            _ = pulse.tick() => {
                observer.on_pulse();
                continue;
            }
            read = reader.read_until(b'\n', &mut buf) => match read {
                Ok(0) if buf.is_empty() => PumpInput::EndOfStream,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    buf.clear();
                    observer.on_line(&line);
                    PumpInput::Line(line)
                }
                Err(err) => {
                    observer.on_read_error(&err);
                    PumpInput::ReadFailed(err)
                }
            },
        };

        match pump.on_ready(input, model) {
            PumpStep::Continue(Some(event)) => observer.on_event(&event, model),
            PumpStep::Continue(None) => {}
            PumpStep::Finish(end) => return (end, pump.lines_read()),
            PumpStep::Ignored => {
                let end = pump.end().cloned().unwrap_or(RunEnd::EndOfStream);
                return (end, pump.lines_read());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FileAction, FileEvent};
    use crate::command::SyncCommand;
    use crate::model::COMPLETED_STATUS;
    use crate::options::SyncOptions;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::pin::pin;
    use std::rc::Rc;
    use tokio_test::io::{Builder, Mock};

    #[derive(Default)]
    struct Recorder {
        lines: RefCell<Vec<String>>,
        events: RefCell<Vec<FileEvent>>,
        read_errors: Cell<usize>,
        completions: Cell<usize>,
    }

    impl RunObserver for Recorder {
        fn on_line(&self, raw_line: &str) {
            self.lines.borrow_mut().push(raw_line.to_string());
        }

        fn on_event(&self, event: &FileEvent, model: &PresentationModel) {
            assert_eq!(model.newest(), Some(event));
            self.events.borrow_mut().push(event.clone());
        }

        fn on_read_error(&self, _error: &io::Error) {
            self.read_errors.set(self.read_errors.get() + 1);
        }

        fn on_complete(&self, _outcome: &RunOutcome) {
            self.completions.set(self.completions.get() + 1);
        }
    }

    struct MockHandle {
        output: BufReader<Mock>,
        releases: Rc<Cell<usize>>,
    }

    impl RunHandle for MockHandle {
        type Output = BufReader<Mock>;

        fn pid(&self) -> Option<u32> {
            Some(4242)
        }

        fn output_mut(&mut self) -> &mut Self::Output {
            &mut self.output
        }

        async fn release_until<F>(
            self,
            end: RunEnd,
            _cancel: Pin<&mut F>,
        ) -> (RunEnd, Option<ExitStatus>)
        where
            F: Future<Output = ()>,
        {
            self.releases.set(self.releases.get() + 1);
            (end, None)
        }
    }

    async fn pump_mock(
        mock: tokio_test::io::Mock,
        recorder: &Recorder,
    ) -> (RunEnd, usize, PresentationModel) {
        let mut reader = BufReader::new(mock);
        let mut model = PresentationModel::new();
        let mut pulse = PulseTimer::start(Duration::from_secs(3600));
        let (end, lines) = pump_output(
            &mut reader,
            &mut model,
            &mut pulse,
            recorder,
            pin!(std::future::pending::<()>()),
        )
        .await;
        (end, lines, model)
    }

    #[tokio::test]
    async fn test_lines_reach_model_until_end_of_stream() {
        let mock = Builder::new()
            .read(b"sending incremental file list\n")
            .read(b"docs/a.txt\ndeleting old.txt\n")
            .read(b"sent 10 bytes  received 20 bytes  30.00 bytes/sec\n")
            .build();
        let recorder = Recorder::default();

        let (end, lines, model) = pump_mock(mock, &recorder).await;

        assert_eq!(end, RunEnd::EndOfStream);
        assert_eq!(lines, 4);
        assert_eq!(recorder.lines.borrow()[1], "docs/a.txt\n");
        assert_eq!(
            *recorder.events.borrow(),
            vec![
                FileEvent::new(FileAction::Sending, "docs/a.txt"),
                FileEvent::new(FileAction::Deleting, "old.txt"),
            ]
        );
        assert_eq!(model.len(), 2);
        assert_eq!(model.status_text(), "deleting: old.txt");
    }

    #[tokio::test]
    async fn test_lines_split_across_reads() {
        let mock = Builder::new()
            .read(b"recei")
            .read(b"ving data.bin\nlast")
            .read(b".txt")
            .build();
        let recorder = Recorder::default();

        let (end, lines, model) = pump_mock(mock, &recorder).await;

        assert_eq!(end, RunEnd::EndOfStream);
        assert_eq!(lines, 2);
        let paths: Vec<&str> = model.events().map(|e| e.path()).collect();
        assert_eq!(paths, vec!["last.txt", "data.bin"]);
    }

    #[tokio::test]
    async fn test_read_error_mid_stream_finishes_run() {
        let mock = Builder::new()
            .read(b"sending a.txt\n")
            .read_error(io::Error::other("pipe broke"))
            .build();
        let recorder = Recorder::default();

        let (end, lines, model) = pump_mock(mock, &recorder).await;

        assert_eq!(end, RunEnd::ReadFailed("pipe broke".to_string()));
        assert_eq!(lines, 1);
        assert_eq!(recorder.read_errors.get(), 1);
        assert_eq!(model.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let mock = Builder::new().read(b"caf\xe9.txt\n").build();
        let recorder = Recorder::default();

        let (_, _, model) = pump_mock(mock, &recorder).await;

        assert_eq!(model.newest().unwrap().path(), "caf\u{FFFD}.txt");
    }

    #[tokio::test]
    async fn test_cancel_wins_over_pending_output() {
        let mut reader = BufReader::new(Builder::new().build());
        let mut model = PresentationModel::new();
        let mut pulse = PulseTimer::start(Duration::from_secs(3600));
        let recorder = Recorder::default();

        let (end, lines) = pump_output(
            &mut reader,
            &mut model,
            &mut pulse,
            &recorder,
            pin!(std::future::ready(())),
        )
        .await;

        assert_eq!(end, RunEnd::Cancelled);
        assert_eq!(lines, 0);
        assert!(model.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_mid_stream_completes_model_once() {
        let releases = Rc::new(Cell::new(0));
        let handle = MockHandle {
            output: BufReader::new(
                Builder::new()
                    .read(b"sending a.txt\n")
                    .read_error(io::Error::other("pipe broke"))
                    .build(),
            ),
            releases: Rc::clone(&releases),
        };
        let options = SyncOptions::new("/src", "/dst", false, false).unwrap();
        let session = SyncSession::new(SyncCommand::new(&options))
            .with_pulse_interval(Duration::from_secs(3600));
        let recorder = Recorder::default();

        let outcome = session
            .drive(handle, &recorder, std::future::pending(), Instant::now())
            .await;

        assert_eq!(outcome.end, RunEnd::ReadFailed("pipe broke".to_string()));
        assert_eq!(outcome.lines_read, 1);
        assert!(outcome.model.is_completed());
        assert_eq!(outcome.model.status_text(), COMPLETED_STATUS);
        assert_eq!(outcome.model.len(), 1);
        assert_eq!(recorder.read_errors.get(), 1);
        assert_eq!(recorder.completions.get(), 1);
        assert_eq!(releases.get(), 1);
        assert!(!outcome.succeeded());
    }
}
