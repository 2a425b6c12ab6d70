use crate::classify::FileEvent;
use crate::command::SyncCommand;
use crate::model::PresentationModel;
use crate::session::RunOutcome;

/// Callbacks a view receives while a run is in progress.
///
/// CLI implements these with indicatif, tests record them. All methods have
/// default no-op implementations, and all of them are invoked from the
/// event loop task that drives the run.
pub trait RunObserver {
    fn on_start(&self, _command: &SyncCommand, _pid: Option<u32>) {}
    fn on_line(&self, _raw_line: &str) {}
    fn on_event(&self, _event: &FileEvent, _model: &PresentationModel) {}
    fn on_pulse(&self) {}
    fn on_read_error(&self, _error: &std::io::Error) {}
    fn on_complete(&self, _outcome: &RunOutcome) {}
}

/// No-op observer for silent operation.
pub struct SilentObserver;

impl RunObserver for SilentObserver {}
