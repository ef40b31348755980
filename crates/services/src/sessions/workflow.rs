use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::QuestionBank;
use storage::repository::{LeaderboardRepository, LeaderboardRow, QuestionRepository};

use super::service::{AdvanceOutcome, DEFAULT_QUESTION_DURATION_SECS, GameSession};
use crate::error::SessionError;

/// Default number of standings shown on the leaderboard.
pub const LEADERBOARD_PAGE_SIZE: u32 = 10;

/// Result of advancing a session, including the persistence outcome on the
/// finishing edge.
#[derive(Debug)]
pub struct SessionAdvance {
    pub outcome: AdvanceOutcome,
    pub entry_id: Option<i64>,
    /// Set when the final leaderboard write failed. The session is still
    /// finished; the write is not retried automatically.
    pub persist_error: Option<SessionError>,
}

/// Orchestrates session construction and end-of-session persistence.
#[derive(Clone)]
pub struct GameLoopService {
    clock: Clock,
    leaderboard: Arc<dyn LeaderboardRepository>,
    questions: Arc<dyn QuestionRepository>,
    question_duration_secs: u32,
}

impl GameLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        leaderboard: Arc<dyn LeaderboardRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            clock,
            leaderboard,
            questions,
            question_duration_secs: DEFAULT_QUESTION_DURATION_SECS,
        }
    }

    #[must_use]
    pub fn with_question_duration(mut self, secs: u32) -> Self {
        self.question_duration_secs = secs;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Build a new session from the stored question feed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures or
    /// `SessionError::Bank` when no questions have been defined.
    pub async fn start_session(&self) -> Result<GameSession, SessionError> {
        let questions = self.questions.list_questions().await?;
        let bank = QuestionBank::new(questions)?;
        Ok(GameSession::new(bank, self.question_duration_secs))
    }

    /// Build a new session over a fixed catalog, bypassing the feed.
    #[must_use]
    pub fn session_from_bank(&self, bank: QuestionBank) -> GameSession {
        GameSession::new(bank, self.question_duration_secs)
    }

    /// Advance the session, persisting the leaderboard entry on the
    /// finishing edge.
    ///
    /// The entry is written exactly once per completed session. A write
    /// failure is logged and surfaced in `persist_error` but does not block
    /// the finish and is not retried here; `finalize_entry` is the explicit
    /// retry path.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the session cannot
    /// advance. Persistence failures are not errors at this level.
    pub async fn advance(&self, session: &mut GameSession) -> Result<SessionAdvance, SessionError> {
        let outcome = session.advance()?;

        let mut persist_error = None;
        if outcome == AdvanceOutcome::Finished && session.entry_id().is_none() {
            if let Err(err) = self.persist_result(session).await {
                tracing::warn!(error = %err, "failed to persist leaderboard entry");
                persist_error = Some(err);
            }
        }

        Ok(SessionAdvance {
            outcome,
            entry_id: session.entry_id(),
            persist_error,
        })
    }

    async fn persist_result(&self, session: &mut GameSession) -> Result<i64, SessionError> {
        let entry = session.build_entry(self.clock.now())?;
        let id = self.leaderboard.append_entry(&entry).await?;
        session.set_entry_id(id);
        Ok(id)
    }

    /// Retry entry persistence for a finished session.
    ///
    /// Useful when the final append failed (e.g. transient storage error).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the session is not
    /// finished, or `SessionError::Storage` if persistence fails again.
    pub async fn finalize_entry(&self, session: &mut GameSession) -> Result<i64, SessionError> {
        if let Some(id) = session.entry_id() {
            return Ok(id);
        }
        self.persist_result(session).await
    }

    /// Read the current standings, best score first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn top_entries(&self, limit: u32) -> Result<Vec<LeaderboardRow>, SessionError> {
        Ok(self.leaderboard.top_entries(limit).await?)
    }
}
