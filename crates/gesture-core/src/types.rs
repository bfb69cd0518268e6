//! Common Types and Constants
//!
//! Shared data structures used across the extractor, classifier, stabilizer
//! and dispatch modules.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Number of landmarks in one hand record (standard 21-point hand topology)
pub const LANDMARK_COUNT: usize = 21;

/// Thumb counts as extended when tip-to-pinky-knuckle exceeds this many palm widths
pub const THUMB_EXTENSION_THRESHOLD: f64 = 1.3;

/// Consecutive identical raw frames required before a gesture becomes stable
pub const DEFAULT_CONFIRMATION_THRESHOLD: u32 = 2;

/// Max gap between two stable gestures that still extends a combo
pub const DEFAULT_COMBO_TIMEOUT: Duration = Duration::from_millis(1500);

/// Min gap before the same single-gesture action fires again
pub const DEFAULT_ACTION_COOLDOWN: Duration = Duration::from_secs(1);

/// Joins stable gestures into a combo key
pub const COMBO_DELIMITER: &str = "-";

/// Default hand slots tracked by the pipeline
pub const DEFAULT_HAND_SLOTS: usize = 2;

/// Finger-count fallback names, indexed by number of extended fingers
pub const FALLBACK_GESTURE_NAMES: [&str; 6] = ["FIST", "ONE", "TWO", "THREE", "FOUR", "FIVE"];

/// Landmark indices used by the extractor.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

// ==================== Landmark Input ====================

/// A landmark in normalized image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance in the image plane. Depth is ignored.
    #[inline]
    pub fn planar_distance(&self, other: &Point3D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    #[serde(alias = "Left", alias = "LEFT")]
    Left,
    #[serde(alias = "Right", alias = "RIGHT")]
    Right,
}

impl Handedness {
    pub const fn as_str(self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left"),
            Handedness::Right => f.write_str("Right"),
        }
    }
}

/// One detected hand for one frame, as supplied by the landmark detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarkFrame {
    pub handedness: Handedness,
    pub landmarks: Vec<Point3D>,
}

impl HandLandmarkFrame {
    pub fn new(handedness: Handedness, landmarks: Vec<Point3D>) -> Self {
        Self {
            handedness,
            landmarks,
        }
    }

    pub fn wrist(&self) -> Option<&Point3D> {
        self.landmarks.get(landmark::WRIST)
    }
}

// ==================== Hand State ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[serde(alias = "Front")]
    Front,
    #[serde(alias = "Back")]
    Back,
}

impl Orientation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Orientation::Front => "front",
            Orientation::Back => "back",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "Up")]
    Up,
    #[serde(alias = "Down")]
    Down,
    #[serde(alias = "Left")]
    Left,
    #[serde(alias = "Right")]
    Right,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerState {
    #[serde(alias = "Extended")]
    Extended,
    #[serde(alias = "Curled")]
    Curled,
}

impl FingerState {
    pub const fn from_extended(extended: bool) -> Self {
        if extended {
            FingerState::Extended
        } else {
            FingerState::Curled
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FingerState::Extended => "extended",
            FingerState::Curled => "curled",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }

    pub fn parse(name: &str) -> Option<Finger> {
        Finger::ALL
            .into_iter()
            .find(|finger| finger.as_str().eq_ignore_ascii_case(name))
    }
}

/// Extension state of all five fingers. Always complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FingerStates([FingerState; 5]);

impl FingerStates {
    pub const fn new(states: [FingerState; 5]) -> Self {
        Self(states)
    }

    pub const fn all(state: FingerState) -> Self {
        Self([state; 5])
    }

    pub fn get(&self, finger: Finger) -> FingerState {
        self.0[finger.index()]
    }

    pub fn set(&mut self, finger: Finger, state: FingerState) {
        self.0[finger.index()] = state;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Finger, FingerState)> + '_ {
        Finger::ALL.into_iter().map(move |finger| (finger, self.get(finger)))
    }

    pub fn extended_count(&self) -> usize {
        self.0
            .iter()
            .filter(|state| **state == FingerState::Extended)
            .count()
    }
}

impl Serialize for FingerStates {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Finger::ALL.len()))?;
        for (finger, state) in self.iter() {
            map.serialize_entry(finger.as_str(), &state)?;
        }
        map.end()
    }
}

/// Semantic state of one hand in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct HandState {
    pub handedness: Handedness,
    pub orientation: Orientation,
    pub direction: Direction,
    pub fingers: FingerStates,
}

// ==================== Pipeline Config ====================

/// Tunables for one pipeline instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub thumb_extension_ratio: f64,
    pub confirmation_threshold: u32,
    #[serde(with = "duration_ms")]
    pub combo_timeout: Duration,
    #[serde(with = "duration_ms")]
    pub action_cooldown: Duration,
    pub hand_slots: usize,
    pub slot_assignment: SlotAssignment,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            thumb_extension_ratio: THUMB_EXTENSION_THRESHOLD,
            confirmation_threshold: DEFAULT_CONFIRMATION_THRESHOLD,
            combo_timeout: DEFAULT_COMBO_TIMEOUT,
            action_cooldown: DEFAULT_ACTION_COOLDOWN,
            hand_slots: DEFAULT_HAND_SLOTS,
            slot_assignment: SlotAssignment::DetectionOrder,
        }
    }
}

/// How detected hands are mapped onto stabilizer slots between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotAssignment {
    /// Slot `i` takes the `i`-th detected hand. Swaps in detector order reset debounce.
    #[default]
    DetectionOrder,
    /// Each slot keeps the hand whose wrist is closest to its previous wrist.
    NearestWrist,
}

impl SlotAssignment {
    pub fn parse(value: &str) -> Option<SlotAssignment> {
        match value.trim().to_ascii_lowercase().as_str() {
            "detection" | "detection_order" | "index" => Some(SlotAssignment::DetectionOrder),
            "nearest" | "nearest_wrist" | "position" => Some(SlotAssignment::NearestWrist),
            _ => None,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
