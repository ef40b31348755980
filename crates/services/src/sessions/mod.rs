mod driver;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use driver::{ADVANCE_DELAY, SessionDriver, SessionEvent, SessionHandle};
pub use progress::SessionProgress;
pub use service::{
    AdvanceOutcome, AnswerEvaluation, DEFAULT_QUESTION_DURATION_SECS, GamePhase, GameSession,
    TickOutcome,
};
pub use workflow::{GameLoopService, LEADERBOARD_PAGE_SIZE, SessionAdvance};
