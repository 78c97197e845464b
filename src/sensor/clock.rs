// src/sensor/clock.rs

use tokio::time::Instant;

use crate::types::Timestamp;

/// Monotonic millisecond clock. Only `TimedRearm` edges and diagnostics use it.
pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

/// Milliseconds since construction, measured on Tokio's clock so that tests
/// running with paused time see exactly the durations they slept.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        let elapsed = Instant::now().duration_since(self.origin).as_millis();
        Timestamp::try_from(elapsed).unwrap_or(Timestamp::MAX)
    }
}
