use serde::{Deserialize, Serialize};

/// Result tier for a finished session, keyed on the score percentage.
///
/// Thresholds are checked highest-first: 100% is `Master`, then 80/60/40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTier {
    Master,
    Expert,
    Enthusiast,
    Improving,
    TryAgain,
}

impl ScoreTier {
    /// Map a score out of `total` to its tier.
    ///
    /// A zero total cannot be produced by a valid question bank and maps to
    /// the lowest tier.
    #[must_use]
    pub fn for_score(score: u32, total: u32) -> Self {
        if total == 0 {
            return Self::TryAgain;
        }
        let percentage = f64::from(score) * 100.0 / f64::from(total);
        if (percentage - 100.0).abs() < f64::EPSILON {
            Self::Master
        } else if percentage >= 80.0 {
            Self::Expert
        } else if percentage >= 60.0 {
            Self::Enthusiast
        } else if percentage >= 40.0 {
            Self::Improving
        } else {
            Self::TryAgain
        }
    }

    /// End-of-game message shown with the final score.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Master => "Perfect! Brand Master! 🏆",
            Self::Expert => "Excellent! Brand Expert! 🌟",
            Self::Enthusiast => "Great job! Brand Enthusiast! 👏",
            Self::Improving => "Not bad! Keep practicing! 💪",
            Self::TryAgain => "Better luck next time! 🎯",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds_out_of_five() {
        assert_eq!(ScoreTier::for_score(5, 5), ScoreTier::Master);
        assert_eq!(ScoreTier::for_score(4, 5), ScoreTier::Expert);
        assert_eq!(ScoreTier::for_score(3, 5), ScoreTier::Enthusiast);
        assert_eq!(ScoreTier::for_score(2, 5), ScoreTier::Improving);
        assert_eq!(ScoreTier::for_score(1, 5), ScoreTier::TryAgain);
        assert_eq!(ScoreTier::for_score(0, 5), ScoreTier::TryAgain);
    }

    #[test]
    fn perfect_score_requires_full_total() {
        assert_eq!(ScoreTier::for_score(9, 10), ScoreTier::Expert);
        assert_eq!(ScoreTier::for_score(10, 10), ScoreTier::Master);
        assert_eq!(ScoreTier::for_score(1, 1), ScoreTier::Master);
    }

    #[test]
    fn boundary_percentages_take_the_higher_tier() {
        // 80% and 60% land exactly on their thresholds.
        assert_eq!(ScoreTier::for_score(8, 10), ScoreTier::Expert);
        assert_eq!(ScoreTier::for_score(6, 10), ScoreTier::Enthusiast);
        assert_eq!(ScoreTier::for_score(4, 10), ScoreTier::Improving);
    }

    #[test]
    fn zero_total_is_lowest_tier() {
        assert_eq!(ScoreTier::for_score(0, 0), ScoreTier::TryAgain);
    }

    #[test]
    fn messages_are_distinct() {
        let tiers = [
            ScoreTier::Master,
            ScoreTier::Expert,
            ScoreTier::Enthusiast,
            ScoreTier::Improving,
            ScoreTier::TryAgain,
        ];
        for (i, a) in tiers.iter().enumerate() {
            for b in &tiers[i + 1..] {
                assert_ne!(a.message(), b.message());
            }
        }
    }
}
