//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{BankError, EntryError, PlayerError};
use storage::repository::StorageError;

use crate::sessions::GamePhase;

/// Errors emitted by the session controller.
///
/// `InvalidTransition`, `AlreadyAnswered` and `EmptyAnswer` are local and
/// recoverable: the call is rejected and session state is left unchanged.
/// `Storage` failures never undo a completed session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: GamePhase,
    },

    #[error("current question has already been answered")]
    AlreadyAnswered,

    #[error("answer cannot be empty")]
    EmptyAnswer,

    #[error("session driver stopped")]
    DriverStopped,

    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
