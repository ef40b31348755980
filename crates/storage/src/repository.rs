use async_trait::async_trait;
use quiz_core::model::{LeaderboardEntry, Question, QuestionError, QuestionId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A leaderboard entry together with its storage-assigned row id.
///
/// The id doubles as the insertion-order tiebreak when entries share a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub id: i64,
    pub entry: LeaderboardEntry,
}

impl LeaderboardRow {
    #[must_use]
    pub fn new(id: i64, entry: LeaderboardEntry) -> Self {
        Self { id, entry }
    }
}

/// Persisted shape for a question definition, as submitted through the
/// administration feed.
///
/// This mirrors the domain `Question` plus the submission date, so
/// repositories can serialize/deserialize without leaking storage concerns
/// into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub date: String,
    pub image: String,
    pub canonical_answer: String,
    pub acceptable_answers: Vec<String>,
}

impl QuestionRecord {
    /// Convert the record into a domain `Question` with the given id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the answer set fails validation.
    pub fn into_question(self, id: QuestionId) -> Result<Question, QuestionError> {
        Question::new(id, self.image, self.canonical_answer, self.acceptable_answers)
    }
}

/// Repository contract for the leaderboard.
///
/// Append-only: the session core requires at-least-once append semantics it
/// can tolerate failing, and at most eventually-consistent reads for display.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Persist a completed session's entry, returning its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_entry(&self, entry: &LeaderboardEntry) -> Result<i64, StorageError>;

    /// Fetch the top entries ordered by score descending, ties broken by
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn top_entries(&self, limit: u32) -> Result<Vec<LeaderboardRow>, StorageError>;

    /// Fetch every entry in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_entries(&self) -> Result<Vec<LeaderboardRow>, StorageError>;
}

/// Repository contract for the question feed.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Append a question definition, returning its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_question(&self, record: &QuestionRecord) -> Result<i64, StorageError>;

    /// Fetch all questions in insertion order, with row ids applied as
    /// question ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures, including records whose
    /// answer sets no longer validate.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<Vec<LeaderboardEntry>>>,
    questions: Arc<Mutex<Vec<QuestionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn lock_err<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl LeaderboardRepository for InMemoryRepository {
    async fn append_entry(&self, entry: &LeaderboardEntry) -> Result<i64, StorageError> {
        let mut guard = self.entries.lock().map_err(lock_err)?;
        guard.push(entry.clone());
        i64::try_from(guard.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn top_entries(&self, limit: u32) -> Result<Vec<LeaderboardRow>, StorageError> {
        let guard = self.entries.lock().map_err(lock_err)?;
        let mut rows: Vec<LeaderboardRow> = guard
            .iter()
            .enumerate()
            .map(|(i, entry)| LeaderboardRow::new(i as i64 + 1, entry.clone()))
            .collect();
        // Stable sort keeps insertion order within equal scores.
        rows.sort_by(|a, b| b.entry.score().cmp(&a.entry.score()));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn list_entries(&self) -> Result<Vec<LeaderboardRow>, StorageError> {
        let guard = self.entries.lock().map_err(lock_err)?;
        Ok(guard
            .iter()
            .enumerate()
            .map(|(i, entry)| LeaderboardRow::new(i as i64 + 1, entry.clone()))
            .collect())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn append_question(&self, record: &QuestionRecord) -> Result<i64, StorageError> {
        let mut guard = self.questions.lock().map_err(lock_err)?;
        guard.push(record.clone());
        i64::try_from(guard.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(lock_err)?;
        let mut out = Vec::with_capacity(guard.len());
        for (i, record) in guard.iter().enumerate() {
            let question = record
                .clone()
                .into_question(QuestionId::new(i as u64 + 1))
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            out.push(question);
        }
        Ok(out)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub leaderboard: Arc<dyn LeaderboardRepository>,
    pub questions: Arc<dyn QuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let leaderboard: Arc<dyn LeaderboardRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Self {
            leaderboard,
            questions,
        }
    }
}
