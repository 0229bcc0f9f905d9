mod http;
mod payload;

use replybot_core::{ClassifierError, Intent};

pub use http::{ClassifierConfig, HttpIntentClassifier, DEFAULT_CLASSIFIER_URL};
pub use payload::parse_intents_payload;

/// Remote scoring of a message against a bot's intents.
///
/// `Ok(None)` means the classifier explicitly had no data for the message.
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        bot_id: &str,
        message: &str,
    ) -> Result<Option<Vec<Intent>>, ClassifierError>;
}
