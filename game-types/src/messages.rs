use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameError, GameId, User};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StartGameResponse {
    pub game_id: GameId,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmitGuessRequest {
    pub guess: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardResponse {
    pub username: String,
    pub is_admin: bool,
    pub games_played_today: u64,
    pub remaining_games: u32,
    pub max_games_per_day: u32,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApiError {
    pub error: String,
    pub details: Option<GameError>,
}

impl ApiError {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self {
            error: err.to_string(),
            details: Some(err),
        }
    }
}
