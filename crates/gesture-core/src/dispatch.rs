//! Combo and single-gesture dispatch policy.
//!
//! Runs once per stable-gesture change of the primary hand. A multi-gesture
//! combo that resolves to a binding always fires and restarts sequencing.
//! Otherwise the newest gesture alone may fire, rate-limited by the cooldown
//! for repeats of the same trigger.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::bindings::ActionResolver;
use crate::combo::ComboSequencer;
use crate::types::{DEFAULT_ACTION_COOLDOWN, DEFAULT_COMBO_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Combo,
    Single,
}

/// An action the pipeline decided to run. Handed off to an executor; nothing
/// waits for the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredAction {
    pub trigger: String,
    pub command: String,
    pub kind: TriggerKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchState {
    last_fired: Option<String>,
    last_fired_at: Option<Instant>,
}

impl DispatchState {
    pub fn last_fired(&self) -> Option<&str> {
        self.last_fired.as_deref()
    }

    fn record(&mut self, trigger: &str, now: Instant) {
        self.last_fired = Some(trigger.to_owned());
        self.last_fired_at = Some(now);
    }

    fn cooling_down(&self, trigger: &str, now: Instant, cooldown: Duration) -> bool {
        match (&self.last_fired, self.last_fired_at) {
            (Some(last), Some(at)) => last == trigger && now.saturating_duration_since(at) <= cooldown,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    combo: ComboSequencer,
    state: DispatchState,
    cooldown: Duration,
    last_stable_seen: Option<String>,
}

impl DispatchPolicy {
    pub fn new(combo_timeout: Duration, cooldown: Duration) -> Self {
        Self {
            combo: ComboSequencer::new(combo_timeout),
            state: DispatchState::default(),
            cooldown,
            last_stable_seen: None,
        }
    }

    pub fn combo(&self) -> &ComboSequencer {
        &self.combo
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Handles one stable-gesture change. `stable == None` means the hand
    /// settled on no gesture.
    pub fn on_stable_change<R>(
        &mut self,
        stable: Option<&str>,
        now: Instant,
        resolver: &R,
    ) -> Option<FiredAction>
    where
        R: ActionResolver + ?Sized,
    {
        let Some(gesture) = stable else {
            self.last_stable_seen = None;
            return None;
        };
        if self.last_stable_seen.as_deref() == Some(gesture) {
            return None;
        }
        self.last_stable_seen = Some(gesture.to_owned());

        let combo_key = self.combo.push(gesture, now);
        debug!(gesture, combo = %combo_key, "new stable gesture");

        if self.combo.len() > 1 {
            if let Some(command) = resolver.resolve(&combo_key) {
                info!(combo = %combo_key, command, "combo matched");
                let fired = FiredAction {
                    trigger: combo_key,
                    command: command.to_owned(),
                    kind: TriggerKind::Combo,
                };
                self.combo.reset();
                self.state.record(&fired.trigger, now);
                debug!("combo sequence reset");
                return Some(fired);
            }
        }

        let command = resolver.resolve(gesture)?;
        if self.state.cooling_down(gesture, now, self.cooldown) {
            debug!(gesture, "suppressed by cooldown");
            return None;
        }

        info!(gesture, command, "gesture matched");
        self.state.record(gesture, now);
        Some(FiredAction {
            trigger: gesture.to_owned(),
            command: command.to_owned(),
            kind: TriggerKind::Single,
        })
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COMBO_TIMEOUT, DEFAULT_ACTION_COOLDOWN)
    }
}
