use crate::models::Intent;

/// Intents scoring below this are treated as no match at all.
pub const CONFIDENCE_THRESHOLD: f64 = 0.4;

pub const NOT_FOUND_REPLY: &str = "Sorry, no reply found.";

/// True when every intent scores strictly below `threshold`.
///
/// Vacuously true for an empty slice.
pub fn all_below_threshold(intents: &[Intent], threshold: f64) -> bool {
    intents.iter().all(|intent| intent.confidence < threshold)
}

/// Left-to-right reduction keeping the current best. A later intent only
/// replaces it when its confidence is strictly greater, so ties go to the
/// first one seen.
pub fn select_top_intent(intents: &[Intent]) -> Option<&Intent> {
    intents.iter().reduce(|best, candidate| {
        if candidate.confidence > best.confidence {
            candidate
        } else {
            best
        }
    })
}

pub fn select_confident_intent(intents: &[Intent], threshold: f64) -> Option<&Intent> {
    if all_below_threshold(intents, threshold) {
        return None;
    }

    select_top_intent(intents)
}
