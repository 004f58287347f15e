#![allow(dead_code)]

use chrono::Utc;
use game_core::{Game, GuessTransition};
use game_types::{GameStatus, Word};
use uuid::Uuid;

/// Creates a word with a fixed id
pub fn create_test_word(value: &str) -> Word {
    Word {
        id: 1,
        value: value.to_string(),
    }
}

/// Creates a fresh game for a random user with a specific secret word
pub fn create_game_with_word(secret: &str) -> Game {
    Game::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        &create_test_word(secret),
        Utc::now(),
    )
}

/// Creates a standard test game
pub fn create_standard_game() -> Game {
    create_game_with_word("CRANE")
}

/// Submits a list of guesses, returning every transition
pub fn submit_guesses(game: &mut Game, guesses: &[&str]) -> Vec<GuessTransition> {
    guesses
        .iter()
        .map(|guess| {
            game.submit_guess(guess)
                .unwrap_or_else(|e| panic!("Guess {} rejected: {}", guess, e))
        })
        .collect()
}

/// Asserts that a game is in a specific state
pub fn assert_game_state(game: &Game, expected_status: GameStatus, expected_attempts: i32) {
    assert_eq!(
        game.status(),
        expected_status,
        "Expected status {:?}, got {:?}",
        expected_status,
        game.status()
    );
    assert_eq!(
        game.session.attempts, expected_attempts,
        "Expected {} attempts, got {}",
        expected_attempts, game.session.attempts
    );
}
