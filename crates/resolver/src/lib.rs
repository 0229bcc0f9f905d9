use std::sync::Arc;

use replybot_classifier::IntentClassifier;
use replybot_core::{
    select_confident_intent, ReplyRecord, Resolution, ResolutionOutcome, ResolutionResult,
    ResolveError, UnmatchedIntentPolicy, CONFIDENCE_THRESHOLD,
};
use replybot_storage::ReplyRepository;

/// Turns a bot message into a canned reply.
///
/// Stateless across calls: one classifier round-trip, then at most one store
/// lookup when an intent clears [`CONFIDENCE_THRESHOLD`]. Absence of data
/// resolves to the not-found reply; collaborator failures are returned as-is.
pub struct ReplyResolver<C, S>
where
    C: IntentClassifier,
    S: ReplyRepository,
{
    classifier: Arc<C>,
    store: Arc<S>,
    unmatched: UnmatchedIntentPolicy,
}

impl<C, S> ReplyResolver<C, S>
where
    C: IntentClassifier,
    S: ReplyRepository,
{
    pub fn new(classifier: Arc<C>, store: Arc<S>) -> Self {
        Self {
            classifier,
            store,
            unmatched: UnmatchedIntentPolicy::default(),
        }
    }

    pub fn with_unmatched_policy(mut self, policy: UnmatchedIntentPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    pub fn unmatched_policy(&self) -> UnmatchedIntentPolicy {
        self.unmatched
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn classifier(&self) -> &Arc<C> {
        &self.classifier
    }

    pub async fn resolve(
        &self,
        bot_id: &str,
        message: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        self.resolve_detailed(bot_id, message)
            .await
            .map(|resolution| resolution.result)
    }

    pub async fn resolve_detailed(
        &self,
        bot_id: &str,
        message: &str,
    ) -> Result<Resolution, ResolveError> {
        let intents = match self.classifier.classify(bot_id, message).await? {
            Some(intents) if !intents.is_empty() => intents,
            _ => return Ok(Resolution::not_found(ResolutionOutcome::NoIntents)),
        };

        let Some(selected) = select_confident_intent(&intents, CONFIDENCE_THRESHOLD) else {
            return Ok(Resolution::not_found(ResolutionOutcome::BelowThreshold));
        };

        let record = self
            .store
            .find_reply(&selected.name)
            .await
            .map_err(ResolveError::Store)?;

        if let Some(reply) = record.as_ref().and_then(ReplyRecord::reply_text) {
            return Ok(Resolution::matched(&selected.name, reply));
        }

        let seeded = match (self.unmatched, record) {
            (UnmatchedIntentPolicy::Seed, None) => {
                self.store
                    .insert_reply(ReplyRecord::new(selected.name.clone(), ""))
                    .await
                    .map_err(ResolveError::Store)?;
                true
            }
            _ => false,
        };

        Ok(Resolution::not_found(ResolutionOutcome::Unmatched {
            intent: selected.name.clone(),
            seeded,
        }))
    }
}
