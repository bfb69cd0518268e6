//! Gesture rule definitions
//!
//! A rule is a name plus a short-circuit list of condition descriptors.
//! Finger conditions are closed-world: any finger the rule does not name
//! must be curled.
//!
//! Source format (declared order is significant, first match wins):
//!
//! ```json
//! {
//!   "POINT_UP": {
//!     "conditions": {
//!       "direction": "up",
//!       "fingers": { "index": "extended" }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::ConfigLoadError;
use crate::types::{
    Direction, Finger, FingerState, FingerStates, HandState, Handedness, Orientation,
    COMBO_DELIMITER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Handedness(Handedness),
    Orientation(Orientation),
    Direction(Direction),
    /// Full required finger map, unnamed fingers already expanded to `Curled`.
    Fingers(FingerStates),
}

impl Condition {
    /// Builds a finger condition from the fingers a rule names. Every other
    /// finger is required to be curled.
    pub fn closed_world_fingers<I>(named: I) -> Condition
    where
        I: IntoIterator<Item = (Finger, FingerState)>,
    {
        let mut required = FingerStates::all(FingerState::Curled);
        for (finger, state) in named {
            required.set(finger, state);
        }
        Condition::Fingers(required)
    }

    pub fn matches(&self, state: &HandState) -> bool {
        match self {
            Condition::Handedness(h) => state.handedness == *h,
            Condition::Orientation(o) => state.orientation == *o,
            Condition::Direction(d) => state.direction == *d,
            Condition::Fingers(required) => state.fingers == *required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureRule {
    name: String,
    conditions: Vec<Condition>,
}

impl GestureRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn handedness(self, handedness: Handedness) -> Self {
        self.with_condition(Condition::Handedness(handedness))
    }

    pub fn orientation(self, orientation: Orientation) -> Self {
        self.with_condition(Condition::Orientation(orientation))
    }

    pub fn direction(self, direction: Direction) -> Self {
        self.with_condition(Condition::Direction(direction))
    }

    pub fn fingers(self, named: &[(Finger, FingerState)]) -> Self {
        self.with_condition(Condition::closed_world_fingers(named.iter().copied()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, state: &HandState) -> bool {
        self.conditions.iter().all(|c| c.matches(state))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RuleDefinition {
    #[serde(default)]
    conditions: RuleConditions,
}

#[derive(Debug, Default, Deserialize)]
struct RuleConditions {
    handedness: Option<Handedness>,
    orientation: Option<Orientation>,
    direction: Option<Direction>,
    #[serde(default)]
    fingers: BTreeMap<String, FingerState>,
}

/// A rule naming a finger that does not exist could never match, so it is
/// rejected whole rather than weakened.
fn build_rule(name: &str, definition: RuleDefinition) -> Result<GestureRule, ConfigLoadError> {
    let conds = definition.conditions;
    let mut rule = GestureRule::new(name);

    if let Some(h) = conds.handedness {
        rule = rule.handedness(h);
    }
    if let Some(o) = conds.orientation {
        rule = rule.orientation(o);
    }
    if let Some(d) = conds.direction {
        rule = rule.direction(d);
    }

    // An empty finger map places no constraint on fingers at all.
    if !conds.fingers.is_empty() {
        let mut named = Vec::with_capacity(conds.fingers.len());
        for (finger_name, state) in &conds.fingers {
            let finger = Finger::parse(finger_name).ok_or_else(|| ConfigLoadError::InvalidEntry {
                name: name.to_owned(),
                reason: format!("unknown finger '{finger_name}'"),
            })?;
            named.push((finger, *state));
        }
        rule = rule.with_condition(Condition::closed_world_fingers(named));
    }

    Ok(rule)
}

/// Parses a rule source. Entries that fail to decode are skipped with a
/// warning; a source that is not a JSON object is an error.
pub fn parse_rules(source: &str) -> Result<Vec<GestureRule>, serde_json::Error> {
    let entries: Map<String, Value> = serde_json::from_str(source)?;
    let mut rules = Vec::with_capacity(entries.len());

    for (name, value) in entries {
        if name.contains(COMBO_DELIMITER) {
            warn!(
                gesture = %name,
                delimiter = %COMBO_DELIMITER,
                "gesture name contains the combo delimiter; combos using it will be ambiguous"
            );
        }

        let built = serde_json::from_value::<RuleDefinition>(value)
            .map_err(|err| ConfigLoadError::InvalidEntry {
                name: name.clone(),
                reason: err.to_string(),
            })
            .and_then(|definition| build_rule(&name, definition));
        match built {
            Ok(rule) => rules.push(rule),
            Err(err) => warn!(error = %err, "skipping gesture rule"),
        }
    }

    Ok(rules)
}

pub fn load_rules(path: &Path) -> Result<Vec<GestureRule>, ConfigLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::from_io(path, e))?;
    parse_rules(&raw).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads rules, degrading to an empty set on any error.
pub fn load_rules_or_empty(path: &Path) -> Vec<GestureRule> {
    match load_rules(path) {
        Ok(rules) => {
            info!(path = %path.display(), count = rules.len(), "loaded gesture definitions");
            rules
        }
        Err(err) => {
            warn!(error = %err, "gesture rules unavailable, falling back to finger counting");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(fingers: &[Finger]) -> HandState {
        let mut states = FingerStates::all(FingerState::Curled);
        for finger in fingers {
            states.set(*finger, FingerState::Extended);
        }
        HandState {
            handedness: Handedness::Right,
            orientation: Orientation::Front,
            direction: Direction::Up,
            fingers: states,
        }
    }

    #[test]
    fn unnamed_fingers_must_be_curled() {
        let rule = GestureRule::new("POINT").fingers(&[(Finger::Index, FingerState::Extended)]);
        assert!(rule.matches(&state(&[Finger::Index])));
        assert!(!rule.matches(&state(&[Finger::Index, Finger::Thumb])));
    }

    #[test]
    fn rule_without_finger_map_ignores_fingers() {
        let rule = GestureRule::new("ANY_UP").direction(Direction::Up);
        assert!(rule.matches(&state(&Finger::ALL)));
        assert!(rule.matches(&state(&[])));
    }

    #[test]
    fn every_explicit_field_must_match() {
        let rule = GestureRule::new("LEFT_BACK")
            .handedness(Handedness::Left)
            .orientation(Orientation::Back);
        assert!(!rule.matches(&state(&[])));
    }

    #[test]
    fn parse_keeps_declared_order() {
        let rules = parse_rules(
            r#"{
                "ZETA": {"conditions": {"direction": "up"}},
                "ALPHA": {"conditions": {"direction": "down"}},
                "MID": {"conditions": {}}
            }"#,
        )
        .unwrap();
        let names: Vec<_> = rules.iter().map(GestureRule::name).collect();
        assert_eq!(names, ["ZETA", "ALPHA", "MID"]);
    }

    #[test]
    fn parse_reads_all_condition_kinds() {
        let rules = parse_rules(
            r#"{"THUMBS_UP": {"conditions": {
                "handedness": "right",
                "orientation": "back",
                "direction": "left",
                "fingers": {"thumb": "extended"}
            }}}"#,
        )
        .unwrap();
        assert_eq!(
            rules[0].conditions(),
            &[
                Condition::Handedness(Handedness::Right),
                Condition::Orientation(Orientation::Back),
                Condition::Direction(Direction::Left),
                Condition::closed_world_fingers([(Finger::Thumb, FingerState::Extended)]),
            ]
        );
    }

    #[test]
    fn empty_finger_map_adds_no_condition() {
        let rules = parse_rules(r#"{"OPEN": {"conditions": {"fingers": {}}}}"#).unwrap();
        assert!(rules[0].conditions().is_empty());
    }

    #[test]
    fn bad_entry_is_skipped() {
        let rules = parse_rules(
            r#"{
                "BROKEN": {"conditions": {"direction": "diagonal"}},
                "OK": {"conditions": {"direction": "up"}}
            }"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name(), "OK");
    }

    #[test]
    fn unknown_finger_drops_the_rule() {
        let rules = parse_rules(
            r#"{
                "POINT": {"conditions": {"fingers": {"indx": "extended"}}},
                "PEACE": {"conditions": {"fingers": {"index": "extended", "midle": "extended"}}},
                "OK": {"conditions": {"fingers": {"index": "extended"}}}
            }"#,
        )
        .unwrap();
        let names: Vec<_> = rules.iter().map(GestureRule::name).collect();
        assert_eq!(names, ["OK"]);
    }

    #[test]
    fn misspelled_rule_does_not_capture_a_fist() {
        let rules =
            parse_rules(r#"{"POINT": {"conditions": {"fingers": {"indx": "extended"}}}}"#).unwrap();
        let fist = crate::extractor::extract(&crate::extractor::fixtures::upright_hand(
            Handedness::Right,
            &[],
        ))
        .unwrap();
        assert_eq!(crate::classifier::classify(&fist, &rules), Some("FIST"));
    }

    #[test]
    fn delimiter_in_name_is_kept() {
        let rules = parse_rules(r#"{"ROCK-ON": {"conditions": {}}}"#).unwrap();
        assert_eq!(rules[0].name(), "ROCK-ON");
    }

    #[test]
    fn non_object_source_is_error() {
        assert!(parse_rules("[1, 2, 3]").is_err());
    }
}
