use serde::{Deserialize, Serialize};

use crate::intent::NOT_FOUND_REPLY;

/// A scored classification label, normalized at the classifier boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    pub confidence: f64,
}

impl Intent {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub intent: String,
    pub reply: String,
}

impl ReplyRecord {
    pub fn new(intent: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            reply: reply.into(),
        }
    }

    /// Stored text, or `None` for placeholder records with no reply yet.
    pub fn reply_text(&self) -> Option<&str> {
        let text = self.reply.as_str();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub reply: String,
}

impl ResolutionResult {
    pub fn not_found() -> Self {
        Self {
            reply: NOT_FOUND_REPLY.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.reply == NOT_FOUND_REPLY
    }
}

/// What to do when a confident intent has no stored reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedIntentPolicy {
    #[default]
    NotFound,
    /// Insert an empty placeholder record for the intent, then answer not-found.
    Seed,
}

impl UnmatchedIntentPolicy {
    pub fn from_flag(seed: bool) -> Self {
        if seed {
            Self::Seed
        } else {
            Self::NotFound
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    NoIntents,
    BelowThreshold,
    Matched { intent: String },
    Unmatched { intent: String, seeded: bool },
}

impl ResolutionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoIntents => "no_intents",
            Self::BelowThreshold => "below_threshold",
            Self::Matched { .. } => "matched",
            Self::Unmatched { .. } => "unmatched",
        }
    }

    pub fn intent(&self) -> Option<&str> {
        match self {
            Self::Matched { intent } | Self::Unmatched { intent, .. } => Some(intent),
            Self::NoIntents | Self::BelowThreshold => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: ResolutionOutcome,
    pub result: ResolutionResult,
}

impl Resolution {
    pub fn not_found(outcome: ResolutionOutcome) -> Self {
        Self {
            outcome,
            result: ResolutionResult::not_found(),
        }
    }

    pub fn matched(intent: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            outcome: ResolutionOutcome::Matched {
                intent: intent.into(),
            },
            result: ResolutionResult {
                reply: reply.into(),
            },
        }
    }
}
