use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use replybot_core::ReplyRecord;
use serde::Deserialize;
use tracing::{debug, info};

use crate::ReplyRepository;

#[derive(Debug, Deserialize)]
struct ExportedReply {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedEntry {
    Record { intent: String, reply: String },
    Export { name: String, reply: ExportedReply },
}

impl SeedEntry {
    fn into_record(self) -> ReplyRecord {
        match self {
            SeedEntry::Record { intent, reply } => ReplyRecord { intent, reply },
            SeedEntry::Export { name, reply } => ReplyRecord {
                intent: name,
                reply: reply.text,
            },
        }
    }
}

/// Accepts `[{"intent", "reply"}]` rows or the classifier export shape
/// `[{"name", "reply": {"text"}}]`, mixed freely.
pub fn parse_seed_json(raw: &str) -> Result<Vec<ReplyRecord>> {
    let entries: Vec<SeedEntry> =
        serde_json::from_str(raw).context("seed data is not a list of reply entries")?;

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let record = entry.into_record();
        if record.intent.trim().is_empty() || record.reply.trim().is_empty() {
            bail!("seed entry {} has an empty intent or reply", index);
        }
        records.push(record);
    }

    Ok(records)
}

pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<ReplyRecord>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;

    parse_seed_json(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Stores records whose intent has no reply text yet, filling empty
/// placeholders in place. Returns how many were written.
pub async fn seed_replies<R>(repository: &R, records: Vec<ReplyRecord>) -> Result<usize>
where
    R: ReplyRepository,
{
    let mut inserted = 0usize;

    for record in records {
        let existing = repository.find_reply(&record.intent).await?;
        if existing.as_ref().and_then(ReplyRecord::reply_text).is_some() {
            debug!(intent = %record.intent, "seed skipped existing intent");
            continue;
        }
        if existing.is_some() {
            debug!(intent = %record.intent, "seed filled placeholder");
        }
        repository.upsert_reply(record).await?;
        inserted += 1;
    }

    info!(inserted, "reply seed applied");
    Ok(inserted)
}
