//! Per-frame pipeline: extract, classify, stabilize per hand slot, then
//! dispatch on stable changes of slot 0.
//!
//! All mutable state lives in [`GesturePipeline`] and is touched only by
//! [`GesturePipeline::process_frame`]. Fired actions are returned, never run.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::bindings::ActionBindings;
use crate::classifier::GestureClassifier;
use crate::dispatch::{DispatchPolicy, FiredAction};
use crate::extractor::HandStateExtractor;
use crate::rules::GestureRule;
use crate::stabilizer::GestureStabilizer;
use crate::types::{HandLandmarkFrame, HandState, Handedness, PipelineConfig, Point3D, SlotAssignment};

/// Only this slot drives combos and actions.
pub const PRIMARY_SLOT: usize = 0;

/// Read-only per-hand snapshot for visualization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandTelemetry {
    pub slot: usize,
    pub handedness: Handedness,
    pub raw: Option<String>,
    pub stable: Option<String>,
    /// `None` when the landmark record was rejected.
    pub state: Option<HandState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StableChange {
    pub slot: usize,
    pub stable: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub hands: Vec<HandTelemetry>,
    pub changes: Vec<StableChange>,
    pub actions: Vec<FiredAction>,
}

pub struct GesturePipeline {
    config: PipelineConfig,
    extractor: HandStateExtractor,
    classifier: GestureClassifier,
    bindings: ActionBindings,
    stabilizers: Vec<GestureStabilizer>,
    slot_wrists: Vec<Option<Point3D>>,
    dispatch: DispatchPolicy,
}

impl GesturePipeline {
    pub fn new(config: PipelineConfig, rules: Vec<GestureRule>, bindings: ActionBindings) -> Self {
        let slots = config.hand_slots.max(1);
        Self {
            extractor: HandStateExtractor::new(config.thumb_extension_ratio),
            classifier: GestureClassifier::new(rules),
            bindings,
            stabilizers: (0..slots)
                .map(|_| GestureStabilizer::new(config.confirmation_threshold))
                .collect(),
            slot_wrists: vec![None; slots],
            dispatch: DispatchPolicy::new(config.combo_timeout, config.action_cooldown),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn bindings(&self) -> &ActionBindings {
        &self.bindings
    }

    pub fn dispatch(&self) -> &DispatchPolicy {
        &self.dispatch
    }

    pub fn slot_count(&self) -> usize {
        self.stabilizers.len()
    }

    pub fn stable(&self, slot: usize) -> Option<&str> {
        self.stabilizers.get(slot).and_then(GestureStabilizer::stable)
    }

    /// One synchronous pass over the hands detected in a frame. Slots with no
    /// hand see `None`; an invalid landmark record counts as no hand.
    pub fn process_frame(&mut self, hands: &[HandLandmarkFrame], now: Instant) -> FrameOutcome {
        let assignment = self.assign_slots(hands);
        let mut outcome = FrameOutcome::default();

        for (slot, hand_index) in assignment.into_iter().enumerate() {
            let hand = hand_index.and_then(|i| hands.get(i));
            self.slot_wrists[slot] = hand.and_then(|h| h.wrist().copied());

            let state = hand.and_then(|h| match self.extractor.extract(h) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!(slot, error = %err, "skipping hand");
                    None
                }
            });
            let raw = state
                .as_ref()
                .and_then(|s| self.classifier.classify(s))
                .map(str::to_owned);

            let update = self.stabilizers[slot].update(raw.as_deref());

            if let Some(hand) = hand {
                if slot == PRIMARY_SLOT {
                    debug!(
                        "Hand {slot} ({}) | Raw: {} -> Stable: {}",
                        hand.handedness,
                        raw.as_deref().unwrap_or("None"),
                        update.stable.as_deref().unwrap_or("None"),
                    );
                }
                outcome.hands.push(HandTelemetry {
                    slot,
                    handedness: hand.handedness,
                    raw,
                    stable: update.stable.clone(),
                    state,
                });
            }

            if !update.changed {
                continue;
            }
            outcome.changes.push(StableChange {
                slot,
                stable: update.stable.clone(),
            });

            if slot == PRIMARY_SLOT {
                if let Some(action) =
                    self.dispatch
                        .on_stable_change(update.stable.as_deref(), now, &self.bindings)
                {
                    outcome.actions.push(action);
                }
            }
        }

        outcome
    }

    fn assign_slots(&self, hands: &[HandLandmarkFrame]) -> Vec<Option<usize>> {
        let slots = self.stabilizers.len();
        match self.config.slot_assignment {
            SlotAssignment::DetectionOrder => {
                (0..slots).map(|slot| (slot < hands.len()).then_some(slot)).collect()
            }
            SlotAssignment::NearestWrist => self.assign_nearest(hands),
        }
    }

    // Greedy in slot order: slot 0 claims its nearest hand first. Slots with no
    // previous wrist take the remaining hands in detection order.
    fn assign_nearest(&self, hands: &[HandLandmarkFrame]) -> Vec<Option<usize>> {
        let mut assigned = vec![None; self.stabilizers.len()];
        let mut taken = vec![false; hands.len()];

        for (slot, previous) in self.slot_wrists.iter().enumerate() {
            let Some(previous) = previous else { continue };
            let nearest = hands
                .iter()
                .enumerate()
                .filter(|(i, _)| !taken[*i])
                .filter_map(|(i, hand)| hand.wrist().map(|w| (i, w.planar_distance(previous))))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((i, _)) = nearest {
                taken[i] = true;
                assigned[slot] = Some(i);
            }
        }

        let mut free = (0..hands.len()).filter(|i| !taken[*i]);
        for slot in assigned.iter_mut().filter(|s| s.is_none()) {
            *slot = free.next();
        }
        assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::fixtures::upright_hand;
    use crate::types::Finger;

    fn pipeline(config: PipelineConfig) -> GesturePipeline {
        GesturePipeline::new(config, Vec::new(), ActionBindings::new())
    }

    fn shifted(frame: &HandLandmarkFrame, dx: f64) -> HandLandmarkFrame {
        let mut moved = frame.clone();
        for p in &mut moved.landmarks {
            p.x += dx;
        }
        moved
    }

    #[test]
    fn empty_frame_yields_no_telemetry() {
        let mut pipeline = pipeline(PipelineConfig::default());
        let outcome = pipeline.process_frame(&[], Instant::now());
        assert!(outcome.hands.is_empty());
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn invalid_record_counts_as_no_hand() {
        let mut pipeline = pipeline(PipelineConfig {
            confirmation_threshold: 1,
            ..PipelineConfig::default()
        });
        let bad = HandLandmarkFrame::new(Handedness::Left, vec![Point3D::default(); 3]);
        let outcome = pipeline.process_frame(&[bad], Instant::now());
        assert_eq!(outcome.hands.len(), 1);
        assert!(outcome.hands[0].state.is_none());
        assert!(outcome.hands[0].raw.is_none());
    }

    #[test]
    fn every_slot_is_stabilized() {
        let mut pipeline = pipeline(PipelineConfig {
            confirmation_threshold: 1,
            ..PipelineConfig::default()
        });
        let left = upright_hand(Handedness::Left, &[]);
        let right = upright_hand(Handedness::Right, &Finger::ALL);
        let outcome = pipeline.process_frame(&[right, left], Instant::now());

        assert_eq!(pipeline.stable(0), Some("FIVE"));
        assert_eq!(pipeline.stable(1), Some("FIST"));
        assert_eq!(outcome.changes.len(), 2);
    }

    #[test]
    fn detection_order_follows_swaps() {
        let mut pipeline = pipeline(PipelineConfig {
            confirmation_threshold: 1,
            ..PipelineConfig::default()
        });
        let fist = shifted(&upright_hand(Handedness::Left, &[]), -0.3);
        let five = shifted(&upright_hand(Handedness::Right, &Finger::ALL), 0.3);

        pipeline.process_frame(&[fist.clone(), five.clone()], Instant::now());
        pipeline.process_frame(&[five, fist], Instant::now());
        assert_eq!(pipeline.stable(0), Some("FIVE"));
    }

    #[test]
    fn nearest_wrist_keeps_hands_in_their_slots() {
        let mut pipeline = pipeline(PipelineConfig {
            confirmation_threshold: 1,
            slot_assignment: SlotAssignment::NearestWrist,
            ..PipelineConfig::default()
        });
        let fist = shifted(&upright_hand(Handedness::Left, &[]), -0.3);
        let five = shifted(&upright_hand(Handedness::Right, &Finger::ALL), 0.3);

        pipeline.process_frame(&[fist.clone(), five.clone()], Instant::now());
        let outcome = pipeline.process_frame(&[five, fist], Instant::now());
        assert_eq!(pipeline.stable(0), Some("FIST"));
        assert_eq!(pipeline.stable(1), Some("FIVE"));
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn secondary_slot_never_dispatches() {
        let bindings = ActionBindings::new().with("FIVE", "echo five");
        let mut pipeline = GesturePipeline::new(
            PipelineConfig {
                confirmation_threshold: 1,
                ..PipelineConfig::default()
            },
            Vec::new(),
            bindings,
        );
        let fist = upright_hand(Handedness::Left, &[]);
        let five = upright_hand(Handedness::Right, &Finger::ALL);
        let outcome = pipeline.process_frame(&[fist, five], Instant::now());
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn slot_count_is_at_least_one() {
        let pipeline = pipeline(PipelineConfig {
            hand_slots: 0,
            ..PipelineConfig::default()
        });
        assert_eq!(pipeline.slot_count(), 1);
    }
}
