use game_types::{GameError, GameId, InvalidFeedbackCode};
use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("game {game_id} was modified concurrently")]
    Conflict { game_id: GameId },
    #[error("invalid stored data: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvalidFeedbackCode> for StoreError {
    fn from(err: InvalidFeedbackCode) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

impl StoreError {
    /// The domain error, if this failure is one.
    pub fn as_game_error(&self) -> Option<&GameError> {
        match self {
            StoreError::Game(err) => Some(err),
            _ => None,
        }
    }
}
