use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("player name cannot be empty")]
    EmptyName,
}

/// Identity captured at login: a display name and contact email.
///
/// This is identity capture, not authentication — no credential is verified.
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    name: String,
    email: String,
}

impl Player {
    /// Create a player, trimming the display name.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::EmptyName` if the name is empty after trimming.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, PlayerError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(PlayerError::EmptyName);
        }
        Ok(Self {
            name,
            email: email.into(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_name_on_construction() {
        let player = Player::new("  Ada  ", "a@x.com").unwrap();
        assert_eq!(player.name(), "Ada");
        assert_eq!(player.email(), "a@x.com");
    }

    #[test]
    fn rejects_blank_name() {
        let err = Player::new("   ", "a@x.com").unwrap_err();
        assert_eq!(err, PlayerError::EmptyName);
    }

    #[test]
    fn email_is_stored_as_given() {
        // No verification happens at this layer.
        let player = Player::new("Ada", "not-an-email").unwrap();
        assert_eq!(player.email(), "not-an-email");
    }
}
