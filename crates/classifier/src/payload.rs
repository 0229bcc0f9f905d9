use replybot_core::{ClassifierError, Intent};
use serde::Deserialize;
use serde_json::Value;

// Upstream deployments disagree on the label field; both spellings land in `name`.
#[derive(Debug, Deserialize)]
struct RawIntent {
    name: Option<String>,
    intent: Option<String>,
    confidence: f64,
}

impl RawIntent {
    fn normalize(self, index: usize) -> Result<Intent, ClassifierError> {
        let name = [self.name, self.intent]
            .into_iter()
            .flatten()
            .find(|label| !label.trim().is_empty())
            .ok_or_else(|| {
                ClassifierError::Malformed(format!("intents[{index}] has no `name` or `intent`"))
            })?;

        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ClassifierError::Malformed(format!(
                "intents[{index}] confidence {} is outside [0, 1]",
                self.confidence
            )));
        }

        Ok(Intent {
            name,
            confidence: self.confidence,
        })
    }
}

/// Validates a classifier response body and normalizes its entries.
///
/// `{"intents": null}` is an absent list; a missing `intents` key is malformed.
pub fn parse_intents_payload(payload: &Value) -> Result<Option<Vec<Intent>>, ClassifierError> {
    let Some(object) = payload.as_object() else {
        return Err(ClassifierError::Malformed(
            "expected a JSON object".to_string(),
        ));
    };

    let raw = match object.get("intents") {
        None => {
            return Err(ClassifierError::Malformed(
                "missing `intents` field".to_string(),
            ))
        }
        Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };

    let entries: Vec<RawIntent> = serde_json::from_value(raw.clone())
        .map_err(|err| ClassifierError::Malformed(format!("invalid `intents`: {err}")))?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.normalize(index))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
