//! Hand-state extraction
//!
//! Turns one hand's 21 landmarks into finger extension flags, palm
//! orientation and pointing direction. Distances are measured in the image
//! plane.

use crate::error::GestureError;
use crate::types::{
    landmark, Direction, Finger, FingerState, FingerStates, HandLandmarkFrame, HandState,
    Handedness, Orientation, Point3D, LANDMARK_COUNT, THUMB_EXTENSION_THRESHOLD,
};

/// (tip, first joint) per non-thumb finger
const FINGER_JOINTS: [(Finger, usize, usize); 4] = [
    (Finger::Index, landmark::INDEX_TIP, landmark::INDEX_PIP),
    (Finger::Middle, landmark::MIDDLE_TIP, landmark::MIDDLE_PIP),
    (Finger::Ring, landmark::RING_TIP, landmark::RING_PIP),
    (Finger::Pinky, landmark::PINKY_TIP, landmark::PINKY_PIP),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandStateExtractor {
    thumb_extension_ratio: f64,
}

impl HandStateExtractor {
    pub fn new(thumb_extension_ratio: f64) -> Self {
        Self {
            thumb_extension_ratio,
        }
    }

    pub fn extract(&self, frame: &HandLandmarkFrame) -> Result<HandState, GestureError> {
        let lms = frame.landmarks.as_slice();
        if lms.len() != LANDMARK_COUNT {
            return Err(GestureError::InvalidInput {
                expected: LANDMARK_COUNT,
                actual: lms.len(),
            });
        }

        let mut fingers = FingerStates::all(FingerState::Curled);
        let wrist = &lms[landmark::WRIST];
        for (finger, tip, pip) in FINGER_JOINTS {
            let extended = wrist.planar_distance(&lms[tip]) > wrist.planar_distance(&lms[pip]);
            fingers.set(finger, FingerState::from_extended(extended));
        }
        fingers.set(Finger::Thumb, self.thumb_state(lms));

        Ok(HandState {
            handedness: frame.handedness,
            orientation: palm_orientation(frame.handedness, lms),
            direction: pointing_direction(lms),
            fingers,
        })
    }

    // Scale and rotation invariant: compared against palm width, not a fixed axis.
    fn thumb_state(&self, lms: &[Point3D]) -> FingerState {
        let pinky_mcp = &lms[landmark::PINKY_MCP];
        let palm_width = lms[landmark::INDEX_MCP].planar_distance(pinky_mcp);
        let thumb_reach = lms[landmark::THUMB_TIP].planar_distance(pinky_mcp);
        FingerState::from_extended(thumb_reach > palm_width * self.thumb_extension_ratio)
    }
}

impl Default for HandStateExtractor {
    fn default() -> Self {
        Self::new(THUMB_EXTENSION_THRESHOLD)
    }
}

/// Extract with the default thumb threshold.
pub fn extract(frame: &HandLandmarkFrame) -> Result<HandState, GestureError> {
    HandStateExtractor::default().extract(frame)
}

/// Selfie framing is mirrored, so the knuckle order flips between hands.
fn palm_orientation(handedness: Handedness, lms: &[Point3D]) -> Orientation {
    let index_x = lms[landmark::INDEX_MCP].x;
    let pinky_x = lms[landmark::PINKY_MCP].x;
    let facing = match handedness {
        Handedness::Right => index_x > pinky_x,
        Handedness::Left => index_x < pinky_x,
    };
    if facing {
        Orientation::Front
    } else {
        Orientation::Back
    }
}

fn pointing_direction(lms: &[Point3D]) -> Direction {
    let wrist = &lms[landmark::WRIST];
    let middle_mcp = &lms[landmark::MIDDLE_MCP];
    // Image y grows downward.
    let angle = (-(middle_mcp.y - wrist.y))
        .atan2(middle_mcp.x - wrist.x)
        .to_degrees();

    if (-45.0..45.0).contains(&angle) {
        Direction::Right
    } else if (45.0..135.0).contains(&angle) {
        Direction::Up
    } else if (-135.0..-45.0).contains(&angle) {
        Direction::Down
    } else {
        Direction::Left
    }
}

/// Synthetic landmark sets for tests and benchmarks.
pub mod fixtures {
    use crate::types::{landmark, Finger, HandLandmarkFrame, Handedness, Point3D, LANDMARK_COUNT};

    /// An upright hand, palm toward a mirrored camera for `Right`, with the
    /// requested fingers extended and the rest curled.
    pub fn upright_hand(handedness: Handedness, extended: &[Finger]) -> HandLandmarkFrame {
        let mut lms = vec![Point3D::new(0.5, 0.8, 0.0); LANDMARK_COUNT];
        let is = |finger: Finger| extended.contains(&finger);

        // Knuckles in a row above the wrist; index on the right side of the image.
        let (index_x, pinky_x) = match handedness {
            Handedness::Right => (0.56, 0.44),
            Handedness::Left => (0.44, 0.56),
        };
        let step = (index_x - pinky_x) / 3.0;
        let knuckle_x = [index_x, index_x - step, index_x - 2.0 * step, pinky_x];
        let knuckle_y = 0.6;

        let chains = [
            (Finger::Index, landmark::INDEX_MCP),
            (Finger::Middle, landmark::MIDDLE_MCP),
            (Finger::Ring, 13),
            (Finger::Pinky, landmark::PINKY_MCP),
        ];
        for (slot, (finger, mcp)) in chains.into_iter().enumerate() {
            let x = knuckle_x[slot];
            lms[mcp] = Point3D::new(x, knuckle_y, 0.0);
            lms[mcp + 1] = Point3D::new(x, 0.5, 0.0);
            if is(finger) {
                lms[mcp + 2] = Point3D::new(x, 0.42, 0.0);
                lms[mcp + 3] = Point3D::new(x, 0.35, 0.0);
            } else {
                lms[mcp + 2] = Point3D::new(x, 0.56, 0.0);
                lms[mcp + 3] = Point3D::new(x, 0.62, 0.0);
            }
        }

        // Thumb grows out past the index side when extended.
        let outward = if index_x > pinky_x { 1.0 } else { -1.0 };
        lms[1] = Point3D::new(0.5 + outward * 0.04, 0.75, 0.0);
        lms[2] = Point3D::new(0.5 + outward * 0.07, 0.7, 0.0);
        if is(Finger::Thumb) {
            lms[3] = Point3D::new(0.5 + outward * 0.12, 0.66, 0.0);
            lms[landmark::THUMB_TIP] = Point3D::new(0.5 + outward * 0.18, 0.62, 0.0);
        } else {
            lms[3] = Point3D::new(0.5 + outward * 0.06, 0.64, 0.0);
            lms[landmark::THUMB_TIP] = Point3D::new(0.5 + outward * 0.02, 0.62, 0.0);
        }

        HandLandmarkFrame::new(handedness, lms)
    }

    /// Rotates every landmark about the wrist by `degrees` (counter-clockwise on screen).
    pub fn rotated(frame: &HandLandmarkFrame, degrees: f64) -> HandLandmarkFrame {
        let origin = frame.landmarks[landmark::WRIST];
        let (sin, cos) = degrees.to_radians().sin_cos();
        let landmarks = frame
            .landmarks
            .iter()
            .map(|p| {
                let dx = p.x - origin.x;
                // Flip y so positive angles turn the hand counter-clockwise on screen.
                let dy = origin.y - p.y;
                let rx = dx * cos - dy * sin;
                let ry = dx * sin + dy * cos;
                Point3D::new(origin.x + rx, origin.y - ry, p.z)
            })
            .collect();
        HandLandmarkFrame::new(frame.handedness, landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{rotated, upright_hand};
    use super::*;

    #[test]
    fn rejects_wrong_landmark_count() {
        let frame = HandLandmarkFrame::new(Handedness::Right, vec![Point3D::default(); 20]);
        assert_eq!(
            extract(&frame),
            Err(GestureError::InvalidInput {
                expected: 21,
                actual: 20
            })
        );
    }

    #[test]
    fn fist_has_every_finger_curled() {
        let state = extract(&upright_hand(Handedness::Right, &[])).unwrap();
        assert_eq!(state.fingers.extended_count(), 0);
        assert!(state.fingers.iter().all(|(_, s)| s == FingerState::Curled));
    }

    #[test]
    fn open_hand_has_every_finger_extended() {
        let state = extract(&upright_hand(Handedness::Right, &Finger::ALL)).unwrap();
        assert_eq!(state.fingers.extended_count(), 5);
    }

    #[test]
    fn single_index_is_detected() {
        let state = extract(&upright_hand(Handedness::Left, &[Finger::Index])).unwrap();
        assert_eq!(state.fingers.get(Finger::Index), FingerState::Extended);
        assert_eq!(state.fingers.get(Finger::Thumb), FingerState::Curled);
        assert_eq!(state.fingers.get(Finger::Middle), FingerState::Curled);
    }

    #[test]
    fn upright_hand_points_up() {
        let state = extract(&upright_hand(Handedness::Right, &[])).unwrap();
        assert_eq!(state.direction, Direction::Up);
    }

    #[test]
    fn direction_follows_rotation_sectors() {
        let base = upright_hand(Handedness::Right, &[]);
        let cases = [
            (0.0, Direction::Up),
            (30.0, Direction::Up),
            (90.0, Direction::Left),
            (180.0, Direction::Down),
            (-90.0, Direction::Right),
            (-60.0, Direction::Right),
        ];
        for (degrees, expected) in cases {
            let state = extract(&rotated(&base, degrees)).unwrap();
            assert_eq!(state.direction, expected, "rotation {degrees}");
        }
    }

    #[test]
    fn thumb_test_is_rotation_invariant() {
        let base = upright_hand(Handedness::Right, &[Finger::Thumb]);
        for degrees in [0.0, 45.0, 90.0, 135.0, 200.0] {
            let state = extract(&rotated(&base, degrees)).unwrap();
            assert_eq!(state.fingers.get(Finger::Thumb), FingerState::Extended);
        }
    }

    #[test]
    fn orientation_flips_with_handedness() {
        let right = extract(&upright_hand(Handedness::Right, &[])).unwrap();
        assert_eq!(right.orientation, Orientation::Front);

        let mut mislabelled = upright_hand(Handedness::Right, &[]);
        mislabelled.handedness = Handedness::Left;
        let left = extract(&mislabelled).unwrap();
        assert_eq!(left.orientation, Orientation::Back);
    }

    #[test]
    fn custom_thumb_ratio_changes_verdict() {
        let frame = upright_hand(Handedness::Right, &[Finger::Thumb]);
        let strict = HandStateExtractor::new(50.0).extract(&frame).unwrap();
        assert_eq!(strict.fingers.get(Finger::Thumb), FingerState::Curled);
    }
}
