//! SQLite persistence backend.
//!
//! Tables:
//! - `faqs`: the admin-curated corpus (insertion order preserved via rowid)
//! - `cooldowns`: per-user FAQ cooldown expiries (epoch millis)
//! - `faq_usage_stats` / `faq_usage_categories` / `faq_usage_history`:
//!   usage telemetry; count increment and history append share a transaction
//! - `disabled_channels`: channels with auto-response switched off
//! - `bot_responses`: append-only response audit log
//!
//! One connection behind a mutex; WAL mode for concurrent readers.

use super::{
    CooldownStore, FaqStore, ResponseLogStore, SettingsStore, StoreError, StoreResult, UsageStore,
};
use crate::faq::FaqEntry;
use crate::stats::response_log::{BotResponseLog, ResponseType};
use crate::stats::{
    FaqUsageRow, FaqUsageStat, FeedbackTally, Sentiment, UsageEvent, UsageFilter, UsageRecord,
    UsageSummary,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, ToSql};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Default cap for summary `top_faqs` listings.
const DEFAULT_SUMMARY_LIMIT: u32 = 10;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        Self::init(conn)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS faqs (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                category TEXT NOT NULL,
                link TEXT,
                UNIQUE (category, question)
            );

            CREATE TABLE IF NOT EXISTS cooldowns (
                key TEXT PRIMARY KEY,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS faq_usage_stats (
                faq_id TEXT PRIMARY KEY,
                question TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT '',
                usage_count INTEGER NOT NULL DEFAULT 0,
                feedback_positive INTEGER NOT NULL DEFAULT 0,
                feedback_negative INTEGER NOT NULL DEFAULT 0,
                last_used INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS faq_usage_categories (
                faq_id TEXT NOT NULL,
                category TEXT NOT NULL,
                uses INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (faq_id, category)
            );

            CREATE TABLE IF NOT EXISTS faq_usage_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                faq_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_faq ON faq_usage_history(faq_id);
            CREATE INDEX IF NOT EXISTS idx_history_user ON faq_usage_history(user_id);

            CREATE TABLE IF NOT EXISTS disabled_channels (
                channel_id TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS bot_responses (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL,
                question TEXT NOT NULL,
                response TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                response_type TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_responses_time ON bot_responses(timestamp);",
        )?;
        Ok(())
    }

    // ── Admin-side corpus writes ────────────────────────────────────
    // The responder core never calls these; they exist for the admin
    // tooling boundary and for test fixtures.

    pub fn insert_faq(&self, entry: &FaqEntry) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO faqs (id, question, answer, category, link)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.question,
                entry.answer,
                entry.category,
                entry.link
            ],
        )?;
        Ok(())
    }

    /// Recent audit rows, newest first (operator read).
    pub fn recent_responses(&self, limit: u32) -> StoreResult<Vec<BotResponseLog>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, user_name, question, response, channel_id, response_type, timestamp
             FROM bot_responses ORDER BY timestamp DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, i64>(7)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, user_name, question, response, channel_id, kind, ts) = row?;
            out.push(BotResponseLog {
                id,
                user_id,
                user_name,
                question,
                response,
                channel_id,
                response_type: ResponseType::from_str_lossy(&kind),
                timestamp: from_millis(ts)?,
            });
        }
        Ok(out)
    }
}

// ── Trait implementations ───────────────────────────────────────────

#[async_trait]
impl FaqStore for SqliteStore {
    async fn list_all(&self) -> StoreResult<Vec<FaqEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, question, answer, category, link FROM faqs ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FaqEntry {
                id: row.get(0)?,
                question: row.get(1)?,
                answer: row.get(2)?,
                category: row.get(3)?,
                link: row.get(4)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl CooldownStore for SqliteStore {
    async fn get_expiry(&self, key: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.conn.lock();
        let row: Option<i64> = conn
            .query_row(
                "SELECT expires_at FROM cooldowns WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        row.map(from_millis).transpose()
    }

    async fn upsert_expiry(&self, key: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cooldowns (key, expires_at) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET expires_at = excluded.expires_at",
            params![key, expires_at.timestamp_millis()],
        )?;
        Ok(())
    }
}

#[async_trait]
impl UsageStore for SqliteStore {
    async fn record_usage(&self, event: &UsageEvent) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let ts = event.timestamp.timestamp_millis();

        tx.execute(
            "INSERT INTO faq_usage_stats (faq_id, question, category, usage_count, last_used)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(faq_id) DO UPDATE SET
                 usage_count = usage_count + 1,
                 question = excluded.question,
                 category = excluded.category,
                 last_used = excluded.last_used",
            params![event.faq_id, event.question, event.category, ts],
        )?;
        tx.execute(
            "INSERT INTO faq_usage_categories (faq_id, category, uses) VALUES (?1, ?2, 1)
             ON CONFLICT(faq_id, category) DO UPDATE SET uses = uses + 1",
            params![event.faq_id, event.category],
        )?;
        tx.execute(
            "INSERT INTO faq_usage_history (faq_id, user_id, user_name, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![event.faq_id, event.user_id, event.user_name, ts],
        )?;

        tx.commit()?;
        Ok(())
    }

    async fn record_feedback(&self, faq_id: &str, sentiment: Sentiment) -> StoreResult<()> {
        let (pos, neg): (i64, i64) = match sentiment {
            Sentiment::Positive => (1, 0),
            Sentiment::Negative => (0, 1),
        };
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO faq_usage_stats (faq_id, usage_count, feedback_positive, feedback_negative)
             VALUES (?1, 0, ?2, ?3)
             ON CONFLICT(faq_id) DO UPDATE SET
                 feedback_positive = feedback_positive + excluded.feedback_positive,
                 feedback_negative = feedback_negative + excluded.feedback_negative",
            params![faq_id, pos, neg],
        )?;
        Ok(())
    }

    async fn stat(&self, faq_id: &str) -> StoreResult<Option<FaqUsageStat>> {
        let conn = self.conn.lock();

        let head = conn
            .query_row(
                "SELECT question, category, usage_count, feedback_positive, feedback_negative, last_used
                 FROM faq_usage_stats WHERE faq_id = ?1",
                params![faq_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some((question, category, usage_count, positive, negative, last_used)) = head else {
            return Ok(None);
        };

        let mut categories = BTreeMap::new();
        let mut stmt =
            conn.prepare("SELECT category, uses FROM faq_usage_categories WHERE faq_id = ?1")?;
        let rows = stmt.query_map(params![faq_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (cat, uses) = row?;
            categories.insert(cat, uses);
        }

        let mut stmt = conn.prepare(
            "SELECT user_id, user_name, timestamp FROM faq_usage_history
             WHERE faq_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![faq_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut usage_history = Vec::new();
        for row in rows {
            let (user_id, user_name, ts) = row?;
            usage_history.push(UsageRecord {
                user_id,
                user_name,
                timestamp: from_millis(ts)?,
            });
        }

        Ok(Some(FaqUsageStat {
            faq_id: faq_id.to_string(),
            question,
            category,
            usage_count,
            categories,
            feedback: FeedbackTally { positive, negative },
            last_used: from_millis(last_used)?,
            usage_history,
        }))
    }

    async fn summary(&self, filter: &UsageFilter) -> StoreResult<UsageSummary> {
        let conn = self.conn.lock();

        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(category) = &filter.category {
            clauses.push("category = ?");
            binds.push(Box::new(category.clone()));
        }
        if let Some(since) = filter.since {
            clauses.push("last_used >= ?");
            binds.push(Box::new(since.timestamp_millis()));
        }
        if let Some(user_id) = &filter.user_id {
            clauses.push(
                "EXISTS (SELECT 1 FROM faq_usage_history h
                 WHERE h.faq_id = faq_usage_stats.faq_id AND h.user_id = ?)",
            );
            binds.push(Box::new(user_id.clone()));
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let bind_refs = || binds.iter().map(|b| b.as_ref());

        let (total_uses, faq_count, positive, negative) = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(usage_count), 0), COUNT(*),
                        COALESCE(SUM(feedback_positive), 0), COALESCE(SUM(feedback_negative), 0)
                 FROM faq_usage_stats{where_sql}"
            ),
            params_from_iter(bind_refs()),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT category, SUM(usage_count) AS uses FROM faq_usage_stats{where_sql}
             GROUP BY category ORDER BY uses DESC"
        ))?;
        let rows = stmt.query_map(params_from_iter(bind_refs()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut by_category = Vec::new();
        for row in rows {
            by_category.push(row?);
        }

        let limit = filter.limit.unwrap_or(DEFAULT_SUMMARY_LIMIT);
        let mut stmt = conn.prepare(&format!(
            "SELECT faq_id, question, category, usage_count, feedback_positive, feedback_negative, last_used
             FROM faq_usage_stats{where_sql}
             ORDER BY usage_count DESC, last_used DESC LIMIT {limit}"
        ))?;
        let rows = stmt.query_map(params_from_iter(bind_refs()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;
        let mut top_faqs = Vec::new();
        for row in rows {
            let (faq_id, question, category, usage_count, pos, neg, last_used) = row?;
            top_faqs.push(FaqUsageRow {
                faq_id,
                question,
                category,
                usage_count,
                feedback: FeedbackTally {
                    positive: pos,
                    negative: neg,
                },
                last_used: from_millis(last_used)?,
            });
        }

        Ok(UsageSummary {
            total_uses,
            faq_count,
            feedback: FeedbackTally { positive, negative },
            by_category,
            top_faqs,
        })
    }
}

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn disabled_channels(&self) -> StoreResult<HashSet<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT channel_id FROM disabled_channels")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<HashSet<_>, _>>()
            .map_err(StoreError::from)
    }

    async fn set_channel_disabled(&self, channel_id: &str, disabled: bool) -> StoreResult<()> {
        let conn = self.conn.lock();
        if disabled {
            conn.execute(
                "INSERT OR IGNORE INTO disabled_channels (channel_id) VALUES (?1)",
                params![channel_id],
            )?;
        } else {
            conn.execute(
                "DELETE FROM disabled_channels WHERE channel_id = ?1",
                params![channel_id],
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseLogStore for SqliteStore {
    async fn append(&self, entry: &BotResponseLog) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO bot_responses
                 (id, user_id, user_name, question, response, channel_id, response_type, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                entry.user_id,
                entry.user_name,
                entry.question,
                entry.response,
                entry.channel_id,
                entry.response_type.as_str(),
                entry.timestamp.timestamp_millis(),
            ],
        )?;
        Ok(())
    }
}

fn from_millis(ms: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {ms}")))
}
