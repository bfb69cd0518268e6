use crate::rules::GestureRule;
use crate::types::{HandState, FALLBACK_GESTURE_NAMES};

/// Ordered rule scan with a finger-count fallback.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    rules: Vec<GestureRule>,
}

impl GestureClassifier {
    pub fn new(rules: Vec<GestureRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[GestureRule] {
        &self.rules
    }

    pub fn classify(&self, state: &HandState) -> Option<&str> {
        classify(state, &self.rules)
    }
}

/// First matching rule wins; otherwise the number of extended fingers picks a
/// default name.
pub fn classify<'a>(state: &HandState, rules: &'a [GestureRule]) -> Option<&'a str> {
    rules
        .iter()
        .find(|rule| rule.matches(state))
        .map(GestureRule::name)
        .or_else(|| fallback_name(state))
}

fn fallback_name(state: &HandState) -> Option<&'static str> {
    FALLBACK_GESTURE_NAMES
        .get(state.fingers.extended_count())
        .copied()
}
