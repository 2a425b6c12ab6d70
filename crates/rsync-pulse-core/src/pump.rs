use crate::classify::{classify, FileEvent};
use crate::model::PresentationModel;
use std::io;
use tracing::{debug, error, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    Reading,
    Done,
}

/// What the event loop observed on one readiness notification.
#[derive(Debug)]
pub enum PumpInput {
    Line(String),
    EndOfStream,
    ReadFailed(io::Error),
    Cancelled,
}

/// Why a run stopped reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    EndOfStream,
    ReadFailed(String),
    Cancelled,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PumpStep {
    /// Keep reading. Carries the event the line produced, if any.
    Continue(Option<FileEvent>),
    /// Stop reading and tear the run down.
    Finish(RunEnd),
    /// The pump was already done; nothing changed.
    Ignored,
}

/// `Idle -> Reading -> Done` state machine fed by the event loop.
#[derive(Debug)]
pub struct EventPump {
    state: PumpState,
    lines_read: usize,
    end: Option<RunEnd>,
}

impl Default for EventPump {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPump {
    pub fn new() -> Self {
        Self {
            state: PumpState::Idle,
            lines_read: 0,
            end: None,
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Why the pump finished, once it is [`PumpState::Done`].
    pub fn end(&self) -> Option<&RunEnd> {
        self.end.as_ref()
    }

    pub fn on_ready(&mut self, input: PumpInput, model: &mut PresentationModel) -> PumpStep {
        if self.state == PumpState::Done {
            warn!("Event pump invoked after completion: {:?}", input);
            return PumpStep::Ignored;
        }

        match input {
            PumpInput::Line(line) => {
                self.state = PumpState::Reading;
                self.lines_read += 1;
                trace!("rsync: {}", line.trim_end());

                let event = classify(&line);
                if let Some(event) = &event {
                    debug!("{}", event);
                    model.push(event.clone());
                }
                PumpStep::Continue(event)
            }
            PumpInput::EndOfStream => self.finish(RunEnd::EndOfStream),
            PumpInput::ReadFailed(err) => {
                error!("Error reading rsync output: {}", err);
                self.finish(RunEnd::ReadFailed(err.to_string()))
            }
            PumpInput::Cancelled => self.finish(RunEnd::Cancelled),
        }
    }

    fn finish(&mut self, end: RunEnd) -> PumpStep {
        debug!(
            "Event pump done after {} lines: {:?}",
            self.lines_read, end
        );
        self.state = PumpState::Done;
        self.end = Some(end.clone());
        PumpStep::Finish(end)
    }
}
