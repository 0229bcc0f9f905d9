use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetReplyRequest {
    pub bot_id: String,
    pub message: String,
}

/// First schema violation found in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

const REQUIRED_FIELDS: [&str; 2] = ["botId", "message"];

/// A body that is empty or not declared as JSON is checked as `{}`, so
/// missing fields are reported by name.
pub fn parse_get_reply(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<GetReplyRequest, ValidationError> {
    let declared_json = content_type.is_some_and(is_json_content_type);
    let value = if !declared_json || body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body)
            .map_err(|_| ValidationError::new("body must be valid JSON"))?
    };

    let Some(object) = value.as_object() else {
        return Err(ValidationError::new("must be object"));
    };

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(ValidationError::new(format!(
                "must have required property '{field}'"
            )));
        }
    }

    Ok(GetReplyRequest {
        bot_id: string_field(object, "botId")?,
        message: string_field(object, "message")?,
    })
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn string_field(object: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        _ => Err(ValidationError::new(format!("/{field} must be string"))),
    }
}
