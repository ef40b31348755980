mod ids;
mod leaderboard;
mod player;
mod question;
mod score;

pub use ids::QuestionId;
pub use leaderboard::{EntryError, LeaderboardEntry};
pub use player::{Player, PlayerError};
pub use question::{BankError, Question, QuestionBank, QuestionError};
pub use score::ScoreTier;
