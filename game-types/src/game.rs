use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameId, GuessId, InvalidFeedbackCode, MAX_ATTEMPTS, UserId, WordId};

/// A candidate secret word. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Word {
    pub id: WordId,
    pub value: String,
}

/// One play-through of a single user against a single secret word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameSession {
    pub id: GameId,
    pub user_id: UserId,
    pub word_id: WordId,
    pub started_at: DateTime<Utc>,
    pub attempts: i32,
    pub finished: bool,
    pub won: bool,
}

impl GameSession {
    pub fn status(&self) -> GameStatus {
        match (self.finished, self.won) {
            (true, true) => GameStatus::Won,
            (true, false) => GameStatus::Lost,
            _ => GameStatus::Active,
        }
    }

    pub fn remaining_attempts(&self) -> i32 {
        if self.finished {
            0
        } else {
            (MAX_ATTEMPTS - self.attempts).max(0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameStatus {
    Active, // Accepting guesses
    Won,    // Secret word guessed
    Lost,   // Attempts exhausted
}

/// A submitted attempt, owned by its game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guess {
    pub id: GuessId,
    pub game_id: GameId,
    pub text: String,
    pub feedback: String, // e.g. "GOXXG"
    pub created_at: DateTime<Utc>,
}

impl Guess {
    /// Expand the stored feedback code into per-letter results.
    pub fn to_result(&self) -> Result<GuessResult, InvalidFeedbackCode> {
        let letters = self
            .text
            .chars()
            .zip(self.feedback.chars())
            .enumerate()
            .map(|(position, (letter, code))| {
                Ok(LetterResult {
                    letter: letter.to_string(),
                    status: LetterStatus::from_code(code).ok_or(InvalidFeedbackCode(code))?,
                    position: position as i32,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(GuessResult {
            word: self.text.clone(),
            feedback: self.feedback.clone(),
            letters,
            timestamp: self.created_at.to_rfc3339(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResult {
    pub word: String,
    pub feedback: String,
    pub letters: Vec<LetterResult>,
    pub timestamp: String, // ISO 8601 string
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LetterResult {
    pub letter: String,
    pub status: LetterStatus,
    pub position: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LetterStatus {
    Correct, // Green - correct letter in correct position
    Present, // Orange - letter elsewhere in the word
    Absent,  // Grey - letter not in word
}

impl LetterStatus {
    pub fn code(self) -> char {
        match self {
            LetterStatus::Correct => 'G',
            LetterStatus::Present => 'O',
            LetterStatus::Absent => 'X',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'G' => Some(LetterStatus::Correct),
            'O' => Some(LetterStatus::Present),
            'X' => Some(LetterStatus::Absent),
            _ => None,
        }
    }
}

/// What a guess submission reports back to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome")]
#[ts(export)]
pub enum GuessOutcome {
    Continue {
        feedback: GuessResult,
        remaining_attempts: i32,
    },
    Won {
        feedback: GuessResult,
        revealed_word: String,
    },
    Lost {
        revealed_word: String,
        all_guesses: Vec<GuessResult>,
    },
}

/// Read-only view of one game for its owner. The secret word is only
/// present once the game has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameView {
    pub game_id: GameId,
    pub status: GameStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub remaining_attempts: i32,
    pub guesses: Vec<GuessResult>,
    pub revealed_word: Option<String>,
    pub started_at: String,
}
