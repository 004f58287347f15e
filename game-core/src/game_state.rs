use chrono::{DateTime, Utc};
use game_types::{
    GameError, GameId, GameSession, GameStatus, GameView, Guess, InvalidFeedbackCode, MAX_ATTEMPTS,
    UserId, Word,
};
use tracing::debug;

use crate::{Feedback, ScoringEngine, validate_guess};

/// Result of a guess that was accepted by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessTransition {
    Continuing {
        feedback: Feedback,
        remaining_attempts: i32,
    },
    Won {
        feedback: Feedback,
    },
    Lost {
        feedback: Feedback,
    },
}

impl GuessTransition {
    pub fn feedback(&self) -> &Feedback {
        match self {
            GuessTransition::Continuing { feedback, .. } => feedback,
            GuessTransition::Won { feedback } => feedback,
            GuessTransition::Lost { feedback } => feedback,
        }
    }

    pub fn status(&self) -> GameStatus {
        match self {
            GuessTransition::Continuing { .. } => GameStatus::Active,
            GuessTransition::Won { .. } => GameStatus::Won,
            GuessTransition::Lost { .. } => GameStatus::Lost,
        }
    }
}

/// A game session together with its secret word.
///
/// Guesses are the only way to mutate the session: `attempts` only grows,
/// `finished` flips once, and `won` is only ever set together with `finished`.
#[derive(Debug, Clone)]
pub struct Game {
    pub session: GameSession,
    target_word: String, // Hidden from clients until finished
}

impl Game {
    pub fn new(id: GameId, user_id: UserId, word: &Word, started_at: DateTime<Utc>) -> Self {
        let session = GameSession {
            id,
            user_id,
            word_id: word.id,
            started_at,
            attempts: 0,
            finished: false,
            won: false,
        };

        Self {
            session,
            target_word: word.value.clone(),
        }
    }

    /// Rebuild a game from its persisted parts.
    pub fn from_parts(session: GameSession, target_word: String) -> Self {
        Self {
            session,
            target_word,
        }
    }

    pub fn id(&self) -> GameId {
        self.session.id
    }

    pub fn status(&self) -> GameStatus {
        self.session.status()
    }

    pub fn is_finished(&self) -> bool {
        self.session.finished
    }

    pub fn remaining_attempts(&self) -> i32 {
        self.session.remaining_attempts()
    }

    /// The secret word, once there is nothing left to guess.
    pub fn revealed_word(&self) -> Option<&str> {
        self.session.finished.then_some(self.target_word.as_str())
    }

    /// Submit one guess.
    ///
    /// Format is checked before the finished flag, and a rejected guess
    /// leaves the session untouched. A correct guess wins even when it is
    /// the last allowed attempt.
    pub fn submit_guess(&mut self, raw: &str) -> Result<GuessTransition, GameError> {
        validate_guess(raw)?;

        if self.session.finished {
            return Err(GameError::GameAlreadyFinished {
                game_id: self.session.id,
            });
        }

        let feedback = ScoringEngine::score(raw, &self.target_word);
        self.session.attempts += 1;

        debug!(
            game_id = %self.session.id,
            attempt = self.session.attempts,
            feedback = %feedback,
            "Scored guess"
        );

        if feedback.is_solved() {
            self.session.won = true;
            self.session.finished = true;
            Ok(GuessTransition::Won { feedback })
        } else if self.session.attempts >= MAX_ATTEMPTS {
            self.session.finished = true;
            Ok(GuessTransition::Lost { feedback })
        } else {
            Ok(GuessTransition::Continuing {
                feedback,
                remaining_attempts: MAX_ATTEMPTS - self.session.attempts,
            })
        }
    }

    /// Owner-facing snapshot of the game. Fails if a stored guess carries
    /// a feedback code that does not decode.
    pub fn view(&self, guesses: &[Guess]) -> Result<GameView, InvalidFeedbackCode> {
        Ok(GameView {
            game_id: self.session.id,
            status: self.status(),
            attempts: self.session.attempts,
            max_attempts: MAX_ATTEMPTS,
            remaining_attempts: self.remaining_attempts(),
            guesses: guesses
                .iter()
                .map(Guess::to_result)
                .collect::<Result<_, _>>()?,
            revealed_word: self.revealed_word().map(str::to_string),
            started_at: self.session.started_at.to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn create_test_game(secret: &str) -> Game {
        let word = Word {
            id: 1,
            value: secret.to_string(),
        };
        Game::new(Uuid::new_v4(), Uuid::new_v4(), &word, Utc::now())
    }

    #[test]
    fn test_new_game_is_active() {
        let game = create_test_game("CRANE");
        assert_eq!(game.status(), GameStatus::Active);
        assert_eq!(game.session.attempts, 0);
        assert!(!game.session.finished);
        assert!(!game.session.won);
        assert_eq!(game.remaining_attempts(), MAX_ATTEMPTS);
        assert_eq!(game.revealed_word(), None);
    }

    #[test]
    fn test_wrong_guess_continues() {
        let mut game = create_test_game("CRANE");

        let transition = game.submit_guess("CRATE").unwrap();
        match transition {
            GuessTransition::Continuing {
                feedback,
                remaining_attempts,
            } => {
                assert_eq!(feedback.code(), "GGGXG");
                assert_eq!(remaining_attempts, 4);
            }
            other => panic!("Expected Continuing, got {:?}", other),
        }
        assert_eq!(game.session.attempts, 1);
        assert_eq!(game.status(), GameStatus::Active);
    }

    #[test]
    fn test_invalid_format_consumes_no_attempt() {
        let mut game = create_test_game("CRANE");

        for raw in ["crane", "CRAN", "CRANES", "CR4NE"] {
            let result = game.submit_guess(raw);
            assert!(matches!(
                result,
                Err(GameError::InvalidGuessFormat { .. })
            ));
        }
        assert_eq!(game.session.attempts, 0);
        assert_eq!(game.status(), GameStatus::Active);
    }

    #[test]
    fn test_correct_guess_wins_immediately() {
        for prior_misses in 0..MAX_ATTEMPTS {
            let mut game = create_test_game("CRANE");
            for _ in 0..prior_misses {
                game.submit_guess("GHOST").unwrap();
            }

            let transition = game.submit_guess("CRANE").unwrap();
            assert!(matches!(transition, GuessTransition::Won { .. }));
            assert_eq!(transition.feedback().code(), "GGGGG");
            assert!(game.session.finished);
            assert!(game.session.won);
            assert_eq!(game.session.attempts, prior_misses + 1);
        }
    }

    #[test]
    fn test_win_on_last_attempt_is_not_a_loss() {
        let mut game = create_test_game("CRANE");
        for _ in 0..4 {
            game.submit_guess("PLANT").unwrap();
        }
        assert_eq!(game.session.attempts, 4);

        let transition = game.submit_guess("CRANE").unwrap();
        assert_eq!(transition.status(), GameStatus::Won);
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.session.attempts, MAX_ATTEMPTS);
    }

    #[test]
    fn test_five_misses_lose() {
        let mut game = create_test_game("CRANE");
        for i in 1..MAX_ATTEMPTS {
            let transition = game.submit_guess("GHOST").unwrap();
            assert_eq!(transition.status(), GameStatus::Active, "attempt {}", i);
        }

        let transition = game.submit_guess("GHOST").unwrap();
        assert!(matches!(transition, GuessTransition::Lost { .. }));
        assert!(game.session.finished);
        assert!(!game.session.won);
        assert_eq!(game.revealed_word(), Some("CRANE"));
    }

    #[test]
    fn test_finished_game_rejects_guesses() {
        let mut game = create_test_game("CRANE");
        game.submit_guess("CRANE").unwrap();

        let result = game.submit_guess("GHOST");
        assert_eq!(
            result,
            Err(GameError::GameAlreadyFinished { game_id: game.id() })
        );
        assert_eq!(game.session.attempts, 1);

        // Format errors still take precedence over the finished check
        let result = game.submit_guess("ghost");
        assert!(matches!(result, Err(GameError::InvalidGuessFormat { .. })));
    }

    #[test]
    fn test_view_hides_word_until_finished() {
        let mut game = create_test_game("CRANE");
        let view = game.view(&[]).unwrap();
        assert_eq!(view.revealed_word, None);
        assert_eq!(view.remaining_attempts, 5);

        game.submit_guess("CRANE").unwrap();
        let view = game.view(&[]).unwrap();
        assert_eq!(view.revealed_word.as_deref(), Some("CRANE"));
        assert_eq!(view.status, GameStatus::Won);
        assert_eq!(view.remaining_attempts, 0);
    }

    #[test]
    fn test_view_rejects_undecodable_feedback() {
        let game = create_test_game("CRANE");
        let guess = Guess {
            id: 1,
            game_id: game.id(),
            text: "CRATE".to_string(),
            feedback: "GGQXG".to_string(),
            created_at: Utc::now(),
        };

        assert_eq!(game.view(&[guess]), Err(InvalidFeedbackCode('Q')));
    }
}
