use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub current: usize,
    pub score: u32,
    pub time_remaining: u32,
    pub answered: bool,
    pub is_complete: bool,
}
