use std::time::Duration;

use anyhow::{Context, Result};
use replybot_core::{ClassifierError, Intent};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::payload::parse_intents_payload;
use crate::IntentClassifier;

pub const DEFAULT_CLASSIFIER_URL: &str = "https://chat.ultimate.ai/api/backend-challenge";

const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CLASSIFIER_URL.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(6),
            timeout: Duration::from_secs(20),
        }
    }
}

impl ClassifierConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn intents_url(&self) -> String {
        format!("{}/intents", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IntentsRequest<'a> {
    bot_id: &'a str,
    message: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpIntentClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl HttpIntentClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .context("failed to build classifier HTTP client")?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: ClassifierConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

impl IntentClassifier for HttpIntentClassifier {
    async fn classify(
        &self,
        bot_id: &str,
        message: &str,
    ) -> Result<Option<Vec<Intent>>, ClassifierError> {
        let mut request = self
            .client
            .post(self.config.intents_url())
            .json(&IntentsRequest { bot_id, message });
        if let Some(api_key) = self.config.api_key.as_deref() {
            request = request.header(AUTHORIZATION, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;

        if !status.is_success() {
            let mut text = String::from_utf8_lossy(&body).into_owned();
            if text.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = serde_json::from_slice(&body)
            .map_err(|err| ClassifierError::Malformed(format!("response is not JSON: {err}")))?;

        parse_intents_payload(&payload)
    }
}
