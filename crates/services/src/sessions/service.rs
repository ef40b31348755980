use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::model::{LeaderboardEntry, Player, Question, QuestionBank, ScoreTier};

use super::progress::SessionProgress;
use crate::error::SessionError;

/// Countdown per question, in seconds.
pub const DEFAULT_QUESTION_DURATION_SECS: u32 = 15;

//
// ─── PHASES AND OUTCOMES ───────────────────────────────────────────────────────
//

/// Lifecycle of a single-player session.
///
/// `LoggedOut → AwaitingStart → Playing → Finished`, with `Finished →
/// AwaitingStart` permitted for replay. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    LoggedOut,
    AwaitingStart,
    Playing,
    Finished,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::LoggedOut => "logged out",
            GamePhase::AwaitingStart => "awaiting start",
            GamePhase::Playing => "playing",
            GamePhase::Finished => "finished",
        };
        write!(f, "{name}")
    }
}

/// Outcome of evaluating a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvaluation {
    pub correct: bool,
    pub correct_answer: String,
}

/// Outcome of a one-second countdown step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown decremented; the remaining seconds are attached.
    Counting(u32),
    /// The countdown expired and the current text was force-submitted.
    Expired(AnswerEvaluation),
}

/// Outcome of moving past an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    NextQuestion { index: usize },
    Finished,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One player's play-through of a question bank.
///
/// A pure, synchronous state machine: every transition is triggered by a
/// discrete external event and is atomic. Timers live in the driver layer;
/// tests can step `tick` and `advance` directly, bypassing real delays.
pub struct GameSession {
    phase: GamePhase,
    player: Option<Player>,
    bank: QuestionBank,
    question_duration_secs: u32,
    current: usize,
    score: u32,
    time_remaining: u32,
    submitted_text: String,
    answered: bool,
    entry_id: Option<i64>,
}

impl GameSession {
    /// Create a session over the given bank with a per-question countdown.
    #[must_use]
    pub fn new(bank: QuestionBank, question_duration_secs: u32) -> Self {
        Self {
            phase: GamePhase::LoggedOut,
            player: None,
            bank,
            question_duration_secs,
            current: 0,
            score: 0,
            time_remaining: question_duration_secs,
            submitted_text: String::new(),
            answered: false,
            entry_id: None,
        }
    }

    /// Create a session with the stock countdown duration.
    #[must_use]
    pub fn with_default_duration(bank: QuestionBank) -> Self {
        Self::new(bank, DEFAULT_QUESTION_DURATION_SECS)
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }

    fn require_live_question(&self, action: &'static str) -> Result<(), SessionError> {
        if self.phase != GamePhase::Playing {
            return Err(self.invalid(action));
        }
        if self.answered {
            return Err(SessionError::AlreadyAnswered);
        }
        Ok(())
    }

    /// Capture the player's identity and move to the start screen.
    ///
    /// No credential verification happens here.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Player` for a blank name, or
    /// `SessionError::InvalidTransition` if already logged in.
    pub fn login(
        &mut self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<(), SessionError> {
        if self.phase != GamePhase::LoggedOut {
            return Err(self.invalid("log in"));
        }
        self.player = Some(Player::new(name, email)?);
        self.phase = GamePhase::AwaitingStart;
        Ok(())
    }

    /// Begin play, resetting all per-game state.
    ///
    /// Valid from `AwaitingStart` or directly from `Finished` (replay).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from any other phase.
    pub fn start_game(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, GamePhase::AwaitingStart | GamePhase::Finished) {
            return Err(self.invalid("start game"));
        }
        self.current = 0;
        self.score = 0;
        self.submitted_text.clear();
        self.answered = false;
        self.time_remaining = self.question_duration_secs;
        self.entry_id = None;
        self.phase = GamePhase::Playing;
        Ok(())
    }

    /// Replace the in-progress answer text.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside play or
    /// `SessionError::AlreadyAnswered` after evaluation.
    pub fn update_answer(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.require_live_question("update answer")?;
        self.submitted_text = text.into();
        Ok(())
    }

    /// Step the countdown by one second.
    ///
    /// When the countdown would drop below zero the current text — possibly
    /// empty — is force-submitted instead: a timeout behaves exactly like an
    /// explicit submit, not like a distinct failure.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside play or
    /// `SessionError::AlreadyAnswered` once the question is settled.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        self.require_live_question("tick")?;
        if self.time_remaining > 0 {
            self.time_remaining -= 1;
            Ok(TickOutcome::Counting(self.time_remaining))
        } else {
            Ok(TickOutcome::Expired(self.force_submit()?))
        }
    }

    /// Submit the current answer text for evaluation.
    ///
    /// Manual submission requires non-blank text; only the timeout path may
    /// submit an empty answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyAnswer` for blank text,
    /// `SessionError::AlreadyAnswered` for a second submit, or
    /// `SessionError::InvalidTransition` outside play.
    pub fn submit_answer(&mut self) -> Result<AnswerEvaluation, SessionError> {
        self.require_live_question("submit answer")?;
        if self.submitted_text.trim().is_empty() {
            return Err(SessionError::EmptyAnswer);
        }
        self.force_submit()
    }

    /// Evaluate the current text against the current question, empty or not.
    ///
    /// Marks the question answered and freezes the countdown; on a match the
    /// score is incremented once.
    pub(crate) fn force_submit(&mut self) -> Result<AnswerEvaluation, SessionError> {
        self.require_live_question("submit answer")?;
        let Some(question) = self.bank.get(self.current) else {
            return Err(self.invalid("submit answer"));
        };

        let correct = question.matches(&self.submitted_text);
        let correct_answer = question.canonical_answer().to_owned();
        self.answered = true;
        if correct {
            self.score += 1;
        }

        Ok(AnswerEvaluation {
            correct,
            correct_answer,
        })
    }

    /// Move past an answered question.
    ///
    /// Resets per-question state for the next question, or transitions to
    /// `Finished` after the last one. The display delay between evaluation
    /// and advancement is owned by the driver; tests call this directly.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless playing with an
    /// answered question — a second defensive call cannot double-finish.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        if self.phase != GamePhase::Playing || !self.answered {
            return Err(self.invalid("advance"));
        }

        if self.current < self.bank.last_index() {
            self.current += 1;
            self.submitted_text.clear();
            self.answered = false;
            self.time_remaining = self.question_duration_secs;
            Ok(AdvanceOutcome::NextQuestion {
                index: self.current,
            })
        } else {
            self.phase = GamePhase::Finished;
            Ok(AdvanceOutcome::Finished)
        }
    }

    /// Return to the start screen without beginning play.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless finished.
    pub fn reset_to_start(&mut self) -> Result<(), SessionError> {
        if self.phase != GamePhase::Finished {
            return Err(self.invalid("reset"));
        }
        self.current = 0;
        self.score = 0;
        self.submitted_text.clear();
        self.answered = false;
        self.time_remaining = self.question_duration_secs;
        self.entry_id = None;
        self.phase = GamePhase::AwaitingStart;
        Ok(())
    }

    /// Build the leaderboard entry for a finished session.
    ///
    /// `now` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless finished with a
    /// logged-in player.
    pub fn build_entry(&self, now: DateTime<Utc>) -> Result<LeaderboardEntry, SessionError> {
        if self.phase != GamePhase::Finished {
            return Err(self.invalid("persist result"));
        }
        let Some(player) = &self.player else {
            return Err(self.invalid("persist result"));
        };
        Ok(LeaderboardEntry::new(
            player,
            self.score,
            self.total_questions_u32(),
            now,
        )?)
    }

    pub(crate) fn set_entry_id(&mut self, id: i64) {
        self.entry_id = Some(id);
    }

    #[must_use]
    pub fn entry_id(&self) -> Option<i64> {
        self.entry_id
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn submitted_text(&self) -> &str {
        &self.submitted_text
    }

    #[must_use]
    pub fn answered(&self) -> bool {
        self.answered
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.bank.len()
    }

    fn total_questions_u32(&self) -> u32 {
        u32::try_from(self.bank.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == GamePhase::Playing {
            self.bank.get(self.current)
        } else {
            None
        }
    }

    /// Result tier for the current score.
    #[must_use]
    pub fn score_tier(&self) -> ScoreTier {
        ScoreTier::for_score(self.score, self.total_questions_u32())
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_questions(),
            current: self.current,
            score: self.score,
            time_remaining: self.time_remaining,
            answered: self.answered,
            is_complete: self.phase == GamePhase::Finished,
        }
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("phase", &self.phase)
            .field("bank_len", &self.bank.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("time_remaining", &self.time_remaining)
            .field("answered", &self.answered)
            .field("entry_id", &self.entry_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
