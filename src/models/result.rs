use serde::Serialize;

/// Rewards granted for a completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rewards {
    pub xp_earned: u32,
    pub ep_earned: u32,
}

/// Server-confirmed outcome of a quiz session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    pub correct_count: u32,
    pub total_questions: u32,
    pub score_percent: f64,
    pub is_perfect: bool,
    pub rewards: Option<Rewards>,
}
