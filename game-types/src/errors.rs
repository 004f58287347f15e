use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::GameId;

/// Expected, recoverable failures of the game core.
///
/// These are reported to the caller as typed results; none of them leave
/// persisted state half-written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[serde(tag = "kind")]
#[ts(export)]
pub enum GameError {
    #[error("no words are available to start a game")]
    EmptyRepository,
    #[error("guess '{guess}' must be exactly 5 uppercase letters")]
    InvalidGuessFormat { guess: String },
    #[error("game {game_id} is already finished")]
    GameAlreadyFinished { game_id: GameId },
    #[error("daily limit of {limit} games reached")]
    QuotaExceeded { limit: u32 },
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },
}

impl GameError {
    pub fn game_not_found(game_id: GameId) -> Self {
        GameError::NotFound {
            entity: EntityKind::Game,
            id: game_id.to_string(),
        }
    }

    pub fn user_not_found(user_id: impl ToString) -> Self {
        GameError::NotFound {
            entity: EntityKind::User,
            id: user_id.to_string(),
        }
    }

    pub fn word_not_found(word_id: impl ToString) -> Self {
        GameError::NotFound {
            entity: EntityKind::Word,
            id: word_id.to_string(),
        }
    }
}

/// A stored feedback code contained a character outside `G`, `O` and `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid feedback code '{0}'")]
pub struct InvalidFeedbackCode(pub char);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum EntityKind {
    Game,
    Word,
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Game => "game",
            EntityKind::Word => "word",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GameError::QuotaExceeded { limit: 3 };
        assert_eq!(err.to_string(), "daily limit of 3 games reached");

        let err = GameError::word_not_found(7);
        assert_eq!(err.to_string(), "word 7 not found");
    }

    #[test]
    fn test_error_serializes_with_kind_tag() {
        let err = GameError::InvalidGuessFormat {
            guess: "abc".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "InvalidGuessFormat");
        assert_eq!(json["guess"], "abc");
    }
}
