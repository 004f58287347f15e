use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameId, User};

/// Site-wide numbers for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub total_users: u64,
    pub games_today: u64,
    pub won_today: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserGameReport {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub word: String,
    pub attempts: i32,
    pub won: bool,
    /// Guesses whose text equals the secret word. Counted, not flagged.
    pub correct_guesses: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserReport {
    pub user: User,
    pub games: Vec<UserGameReport>,
    pub no_games_played: bool,
}
