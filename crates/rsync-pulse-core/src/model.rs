use crate::classify::{FileAction, FileEvent};
use std::collections::VecDeque;
use tracing::warn;

/// Maximum number of events kept for display. Older entries are evicted.
pub const MAX_RETAINED_EVENTS: usize = 1000;

pub const PREPARING_STATUS: &str = "Preparing to sync...";
pub const COMPLETED_STATUS: &str = "Sync completed!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPhase {
    Preparing,
    Active,
    Completed,
}

/// Per-action totals over the whole run, evicted entries included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounts {
    pub sending: usize,
    pub receiving: usize,
    pub deleting: usize,
}

impl ActionCounts {
    fn record(&mut self, action: FileAction) {
        match action {
            FileAction::Sending => self.sending += 1,
            FileAction::Receiving => self.receiving += 1,
            FileAction::Deleting => self.deleting += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.sending + self.receiving + self.deleting
    }
}

/// What the view renders: a bounded, newest-first list of file events plus
/// the current status line.
#[derive(Debug, Clone)]
pub struct PresentationModel {
    events: VecDeque<FileEvent>,
    status_text: String,
    phase: ModelPhase,
    counts: ActionCounts,
    evicted: usize,
}

impl Default for PresentationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationModel {
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(64),
            status_text: PREPARING_STATUS.to_string(),
            phase: ModelPhase::Preparing,
            counts: ActionCounts::default(),
            evicted: 0,
        }
    }

    /// Record a classified event. Returns `false` and leaves the model
    /// untouched once it is completed.
    pub fn push(&mut self, event: FileEvent) -> bool {
        if self.is_completed() {
            warn!("Dropping event after completion: {}", event);
            return false;
        }

        self.status_text = event.to_string();
        self.counts.record(event.action());
        self.events.push_front(event);
        if self.events.len() > MAX_RETAINED_EVENTS {
            self.events.pop_back();
            self.evicted += 1;
        }
        self.phase = ModelPhase::Active;
        true
    }

    /// Move to the terminal phase. Only the first call has any effect.
    pub fn complete(&mut self) -> bool {
        if self.is_completed() {
            return false;
        }
        self.status_text = COMPLETED_STATUS.to_string();
        self.phase = ModelPhase::Completed;
        true
    }

    /// Retained events, newest first.
    pub fn events(&self) -> impl Iterator<Item = &FileEvent> {
        self.events.iter()
    }

    pub fn newest(&self) -> Option<&FileEvent> {
        self.events.front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn phase(&self) -> ModelPhase {
        self.phase
    }

    pub fn is_completed(&self) -> bool {
        self.phase == ModelPhase::Completed
    }

    /// `None` while the indicator pulses, `Some(1.0)` once the run is done.
    pub fn progress_fraction(&self) -> Option<f64> {
        self.is_completed().then_some(1.0)
    }

    pub fn counts(&self) -> ActionCounts {
        self.counts
    }

    pub fn total_events(&self) -> usize {
        self.counts.total()
    }

    pub fn evicted(&self) -> usize {
        self.evicted
    }
}
