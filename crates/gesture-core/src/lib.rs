//! # gesture-core
//!
//! Turns per-frame hand landmarks into debounced gesture events and maps
//! sequences of those events to bound actions.
//!
//! Stages, run once per frame and in this order:
//!
//! - [`extractor`] - landmarks to finger flags, palm orientation, direction
//! - [`classifier`] - ordered [`rules`] scan with a finger-count fallback
//! - [`stabilizer`] - per-slot consecutive-frame debounce
//! - [`dispatch`] - [`combo`] sequencing, combo priority, single-gesture cooldown
//!
//! [`pipeline::GesturePipeline`] owns the state of all four and is driven
//! by the caller, one frame at a time.
//!
//! ```rust
//! use std::time::Instant;
//! use gesture_core::{ActionBindings, GesturePipeline, PipelineConfig};
//! use gesture_core::extractor::fixtures::upright_hand;
//! use gesture_core::types::Handedness;
//!
//! let bindings = ActionBindings::new().with("FIST", "echo fist");
//! let config = PipelineConfig { confirmation_threshold: 1, ..PipelineConfig::default() };
//! let mut pipeline = GesturePipeline::new(config, Vec::new(), bindings);
//!
//! let outcome = pipeline.process_frame(&[upright_hand(Handedness::Right, &[])], Instant::now());
//! assert_eq!(outcome.actions[0].trigger, "FIST");
//! ```

pub mod bindings;
pub mod classifier;
pub mod combo;
pub mod dispatch;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod rules;
pub mod stabilizer;
pub mod types;

pub use bindings::{ActionBindings, ActionResolver};
pub use classifier::{classify, GestureClassifier};
pub use combo::ComboSequencer;
pub use dispatch::{DispatchPolicy, DispatchState, FiredAction, TriggerKind};
pub use error::{ConfigLoadError, GestureError};
pub use extractor::{extract, HandStateExtractor};
pub use pipeline::{FrameOutcome, GesturePipeline, HandTelemetry, StableChange, PRIMARY_SLOT};
pub use rules::{load_rules, load_rules_or_empty, parse_rules, Condition, GestureRule};
pub use stabilizer::{GestureStabilizer, StableUpdate};
pub use types::{
    Direction, Finger, FingerState, FingerStates, HandLandmarkFrame, HandState, Handedness,
    Orientation, PipelineConfig, Point3D, SlotAssignment,
};
