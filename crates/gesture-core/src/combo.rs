use std::time::{Duration, Instant};

use tracing::debug;

use crate::types::{COMBO_DELIMITER, DEFAULT_COMBO_TIMEOUT};

/// Accumulates stable gestures into a combo key while they keep arriving
/// within `timeout` of each other.
#[derive(Debug, Clone)]
pub struct ComboSequencer {
    timeout: Duration,
    sequence: Vec<String>,
    last_gesture_at: Option<Instant>,
}

impl ComboSequencer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sequence: Vec::with_capacity(8),
            last_gesture_at: None,
        }
    }

    /// Appends `gesture` and returns the current combo key.
    pub fn push(&mut self, gesture: &str, now: Instant) -> String {
        if let Some(last) = self.last_gesture_at {
            if now.saturating_duration_since(last) > self.timeout && !self.sequence.is_empty() {
                debug!(expired = %self.key(), "combo window elapsed, starting over");
                self.sequence.clear();
            }
        }

        self.sequence.push(gesture.to_owned());
        self.last_gesture_at = Some(now);
        self.key()
    }

    pub fn key(&self) -> String {
        self.sequence.join(COMBO_DELIMITER)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn reset(&mut self) {
        self.sequence.clear();
        self.last_gesture_at = None;
    }
}

impl Default for ComboSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_COMBO_TIMEOUT)
    }
}
