use serde::Serialize;

use crate::types::DEFAULT_CONFIRMATION_THRESHOLD;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StableUpdate {
    pub stable: Option<String>,
    pub changed: bool,
}

/// Per-slot debounce: a raw symbol must repeat `threshold` frames in a row
/// before it replaces the stable symbol. `None` goes through the same gate.
#[derive(Debug, Clone)]
pub struct GestureStabilizer {
    threshold: u32,
    candidate: Option<String>,
    confirmation_count: u32,
    stable: Option<String>,
}

impl GestureStabilizer {
    /// `threshold` below 1 is raised to 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            candidate: None,
            confirmation_count: 0,
            stable: None,
        }
    }

    pub fn update(&mut self, raw: Option<&str>) -> StableUpdate {
        if raw == self.candidate.as_deref() {
            self.confirmation_count = self.confirmation_count.saturating_add(1);
        } else {
            self.candidate = raw.map(str::to_owned);
            self.confirmation_count = 1;
        }

        let changed =
            self.confirmation_count >= self.threshold && self.candidate != self.stable;
        if changed {
            self.stable = self.candidate.clone();
        }

        StableUpdate {
            stable: self.stable.clone(),
            changed,
        }
    }

    pub fn stable(&self) -> Option<&str> {
        self.stable.as_deref()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for GestureStabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRMATION_THRESHOLD)
    }
}
