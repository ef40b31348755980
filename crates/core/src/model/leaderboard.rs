use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Player;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EntryError {
    #[error("score ({score}) exceeds maximum ({max_score})")]
    ScoreExceedsMax { score: u32, max_score: u32 },

    #[error("maximum score must be > 0")]
    ZeroMaxScore,
}

/// A persisted leaderboard record: written once per completed session, read
/// many times for display. Append-only; there is no update or delete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    name: String,
    email: String,
    score: u32,
    max_score: u32,
    date: String,
    recorded_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Build an entry for a completed session.
    ///
    /// The display `date` is derived from `recorded_at` as `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns `EntryError` if the score exceeds the maximum or the maximum
    /// is zero.
    pub fn new(
        player: &Player,
        score: u32,
        max_score: u32,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, EntryError> {
        let date = recorded_at.format("%Y-%m-%d").to_string();
        Self::from_persisted(
            player.name().to_owned(),
            player.email().to_owned(),
            score,
            max_score,
            date,
            recorded_at,
        )
    }

    /// Rehydrate an entry from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `EntryError` if the stored counts are inconsistent.
    pub fn from_persisted(
        name: String,
        email: String,
        score: u32,
        max_score: u32,
        date: String,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, EntryError> {
        if max_score == 0 {
            return Err(EntryError::ZeroMaxScore);
        }
        if score > max_score {
            return Err(EntryError::ScoreExceedsMax { score, max_score });
        }
        Ok(Self {
            name,
            email,
            score,
            max_score,
            date,
            recorded_at,
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

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn derives_date_from_timestamp() {
        let player = Player::new("Ada", "a@x.com").unwrap();
        let entry = LeaderboardEntry::new(&player, 3, 5, fixed_now()).unwrap();

        assert_eq!(entry.name(), "Ada");
        assert_eq!(entry.score(), 3);
        assert_eq!(entry.max_score(), 5);
        assert_eq!(entry.date(), "2023-11-14");
        assert_eq!(entry.recorded_at(), fixed_now());
    }

    #[test]
    fn rejects_score_above_max() {
        let player = Player::new("Ada", "a@x.com").unwrap();
        let err = LeaderboardEntry::new(&player, 6, 5, fixed_now()).unwrap_err();
        assert_eq!(
            err,
            EntryError::ScoreExceedsMax {
                score: 6,
                max_score: 5
            }
        );
    }

    #[test]
    fn rejects_zero_max_score() {
        let player = Player::new("Ada", "a@x.com").unwrap();
        let err = LeaderboardEntry::new(&player, 0, 0, fixed_now()).unwrap_err();
        assert_eq!(err, EntryError::ZeroMaxScore);
    }

    #[test]
    fn serializes_with_its_timestamp() {
        let player = Player::new("Ada", "a@x.com").unwrap();
        let entry = LeaderboardEntry::new(&player, 3, 5, fixed_now()).unwrap();

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"recorded_at\""));

        let back: LeaderboardEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.recorded_at(), fixed_now());
    }

    #[test]
    fn persisted_roundtrip_preserves_fields() {
        let entry = LeaderboardEntry::from_persisted(
            "Victor".into(),
            "v@x.com".into(),
            6,
            6,
            "2024-01-20".into(),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(entry.score(), 6);
        assert_eq!(entry.date(), "2024-01-20");
    }
}
