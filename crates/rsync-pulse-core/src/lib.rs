pub mod classify;
pub mod command;
pub mod error;
pub mod launcher;
pub mod model;
pub mod observer;
pub mod options;
pub mod pulse;
pub mod pump;
pub mod session;

pub use classify::{classify, FileAction, FileEvent};
pub use command::{build, SyncCommand};
pub use error::Error;
pub use launcher::{launch, ChildProcessHandle};
pub use model::{ActionCounts, ModelPhase, PresentationModel};
pub use observer::{RunObserver, SilentObserver};
pub use options::SyncOptions;
pub use pump::{EventPump, PumpInput, PumpState, PumpStep, RunEnd};
pub use session::{RunOutcome, SyncSession};
