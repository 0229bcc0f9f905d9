mod seed;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use replybot_core::ReplyRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

pub use seed::{load_seed_file, parse_seed_json, seed_replies};

/// Canned replies keyed by intent name. Keys are not unique; lookups return
/// the earliest inserted record.
pub trait ReplyRepository: Send + Sync {
    async fn find_reply(&self, intent: &str) -> Result<Option<ReplyRecord>>;
    async fn insert_reply(&self, record: ReplyRecord) -> Result<()>;
    /// Overwrites the reply of the record `find_reply` would return, or inserts one.
    async fn upsert_reply(&self, record: ReplyRecord) -> Result<()>;
    async fn list_replies(&self) -> Result<Vec<ReplyRecord>>;
    async fn count_replies(&self) -> Result<u64>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    replies: Arc<RwLock<Vec<ReplyRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(records: impl IntoIterator<Item = ReplyRecord>) -> Self {
        Self {
            replies: Arc::new(RwLock::new(records.into_iter().collect())),
        }
    }
}

impl ReplyRepository for MemoryStore {
    async fn find_reply(&self, intent: &str) -> Result<Option<ReplyRecord>> {
        Ok(self
            .replies
            .read()
            .iter()
            .find(|record| record.intent == intent)
            .cloned())
    }

    async fn insert_reply(&self, record: ReplyRecord) -> Result<()> {
        self.replies.write().push(record);
        Ok(())
    }

    async fn upsert_reply(&self, record: ReplyRecord) -> Result<()> {
        let mut replies = self.replies.write();
        match replies
            .iter_mut()
            .find(|existing| existing.intent == record.intent)
        {
            Some(existing) => existing.reply = record.reply,
            None => replies.push(record),
        }
        Ok(())
    }

    async fn list_replies(&self) -> Result<Vec<ReplyRecord>> {
        Ok(self.replies.read().clone())
    }

    async fn count_replies(&self) -> Result<u64> {
        Ok(self.replies.read().len() as u64)
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens a fresh database, so pin the pool to one.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS replies (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              intent TEXT NOT NULL,
              reply TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed creating replies table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_replies_intent ON replies (intent)")
            .execute(&self.pool)
            .await
            .context("failed creating replies index")?;

        Ok(())
    }
}

impl ReplyRepository for SqliteStore {
    async fn find_reply(&self, intent: &str) -> Result<Option<ReplyRecord>> {
        let row = sqlx::query(
            r#"
            SELECT intent, reply
            FROM replies
            WHERE intent = ?1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(intent)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed looking up reply for intent {}", intent))?;

        Ok(row.map(|row| ReplyRecord {
            intent: row.get("intent"),
            reply: row.get("reply"),
        }))
    }

    async fn insert_reply(&self, record: ReplyRecord) -> Result<()> {
        sqlx::query("INSERT INTO replies (intent, reply) VALUES (?1, ?2)")
            .bind(&record.intent)
            .bind(&record.reply)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed inserting reply for intent {}", record.intent))?;

        Ok(())
    }

    async fn upsert_reply(&self, record: ReplyRecord) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE replies
            SET reply = ?2
            WHERE id = (SELECT id FROM replies WHERE intent = ?1 ORDER BY id LIMIT 1)
            "#,
        )
        .bind(&record.intent)
        .bind(&record.reply)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed updating reply for intent {}", record.intent))?;

        if updated.rows_affected() == 0 {
            self.insert_reply(record).await?;
        }

        Ok(())
    }

    async fn list_replies(&self) -> Result<Vec<ReplyRecord>> {
        let rows = sqlx::query("SELECT intent, reply FROM replies ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed listing replies")?;

        let records = rows
            .into_iter()
            .map(|row| ReplyRecord {
                intent: row.get("intent"),
                reply: row.get("reply"),
            })
            .collect();

        Ok(records)
    }

    async fn count_replies(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM replies")
            .fetch_one(&self.pool)
            .await
            .context("failed counting replies")?;

        Ok(row.get::<i64, _>("count") as u64)
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    /// SQLite when a URL is configured, otherwise a process-local store.
    pub async fn from_database_url(database_url: Option<&str>) -> Result<Self> {
        match database_url {
            Some(url) => Self::sqlite(url).await,
            None => Ok(Self::memory()),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl ReplyRepository for Store {
    async fn find_reply(&self, intent: &str) -> Result<Option<ReplyRecord>> {
        match self {
            Store::Memory(store) => store.find_reply(intent).await,
            Store::Sqlite(store) => store.find_reply(intent).await,
        }
    }

    async fn insert_reply(&self, record: ReplyRecord) -> Result<()> {
        match self {
            Store::Memory(store) => store.insert_reply(record).await,
            Store::Sqlite(store) => store.insert_reply(record).await,
        }
    }

    async fn upsert_reply(&self, record: ReplyRecord) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_reply(record).await,
            Store::Sqlite(store) => store.upsert_reply(record).await,
        }
    }

    async fn list_replies(&self) -> Result<Vec<ReplyRecord>> {
        match self {
            Store::Memory(store) => store.list_replies().await,
            Store::Sqlite(store) => store.list_replies().await,
        }
    }

    async fn count_replies(&self) -> Result<u64> {
        match self {
            Store::Memory(store) => store.count_replies().await,
            Store::Sqlite(store) => store.count_replies().await,
        }
    }
}
