use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};

pub const DEFAULT_PULSE_INTERVAL: Duration = Duration::from_millis(100);

/// Periodic tick that animates the progress indicator while a run is active.
///
/// Must be started from within a tokio runtime.
#[derive(Debug)]
pub struct PulseTimer {
    interval: Option<Interval>,
}

impl PulseTimer {
    pub fn start(period: Duration) -> Self {
        // interval() panics on a zero period
        let mut interval = time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval: Some(interval),
        }
    }

    /// Wait for the next tick. Never resolves once the timer is cancelled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Stop ticking. Returns `false` when the timer was already cancelled.
    pub fn cancel(&mut self) -> bool {
        self.interval.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }
}
