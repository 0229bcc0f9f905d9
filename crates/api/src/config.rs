use std::env;
use std::path::PathBuf;
use std::time::Duration;

use replybot_classifier::{ClassifierConfig, DEFAULT_CLASSIFIER_URL};
use replybot_core::UnmatchedIntentPolicy;

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub database_url: Option<String>,
    pub seed_file: Option<PathBuf>,
    pub classifier: ClassifierConfig,
    pub unmatched_policy: UnmatchedIntentPolicy,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database_url: None,
            seed_file: None,
            classifier: ClassifierConfig::default(),
            unmatched_policy: UnmatchedIntentPolicy::NotFound,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = ClassifierConfig::default();

        let classifier = ClassifierConfig {
            base_url: read("REPLYBOT_CLASSIFIER_URL")
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string()),
            api_key: read("REPLYBOT_CLASSIFIER_API_KEY").or_else(|| read("API_KEY")),
            connect_timeout: read("REPLYBOT_CLASSIFIER_CONNECT_TIMEOUT_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            timeout: read("REPLYBOT_CLASSIFIER_TIMEOUT_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        let seed_unmatched = read("REPLYBOT_SEED_UNMATCHED_INTENTS")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Self {
            bind: read("REPLYBOT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            database_url: read("REPLYBOT_DATABASE_URL"),
            seed_file: read("REPLYBOT_SEED_FILE").map(PathBuf::from),
            classifier,
            unmatched_policy: UnmatchedIntentPolicy::from_flag(seed_unmatched),
            max_body_bytes: read("REPLYBOT_MAX_BODY_BYTES")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
