use std::collections::HashSet;

use game_types::{GameError, WORD_LENGTH};
use rand::Rng;

/// Words seeded into a fresh database.
pub const DEFAULT_WORDS: &[&str] = &[
    "APPLE", "BRAVE", "CRANE", "DRIVE", "EPOCH", "EAGLE", "FABLE", "GHOST", "HUMAN", "INNER",
    "JOKER", "CABLE", "KNIFE", "LIGHT", "MIGHT", "NERVE", "OCEAN", "PLANT", "QUERY", "RIVER",
    "SHADE", "TRUST",
];

/// True for exactly five ASCII uppercase letters.
pub fn is_valid_word(word: &str) -> bool {
    word.len() == WORD_LENGTH && word.chars().all(|c| c.is_ascii_uppercase())
}

/// Check the format of a raw guess before it reaches the scoring engine.
pub fn validate_guess(raw: &str) -> Result<(), GameError> {
    if is_valid_word(raw) {
        Ok(())
    } else {
        Err(GameError::InvalidGuessFormat {
            guess: raw.to_string(),
        })
    }
}

/// Pick a uniformly random index into a collection of `count` words.
pub fn random_index<R: Rng + ?Sized>(count: u64, rng: &mut R) -> Result<u64, GameError> {
    if count == 0 {
        return Err(GameError::EmptyRepository);
    }
    Ok(rng.random_range(0..count))
}

/// Parses word lists for seeding the word repository.
pub struct WordListParser;

impl WordListParser {
    /// Parse a newline separated word list.
    ///
    /// Blank lines and `#` comments are skipped, entries are trimmed and
    /// uppercased, anything that is not five letters is dropped and the
    /// first occurrence of a duplicate wins.
    pub fn parse(word_list: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        word_list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_ascii_uppercase)
            .filter(|word| is_valid_word(word))
            .filter(|word| seen.insert(word.clone()))
            .collect()
    }

    pub fn defaults() -> Vec<String> {
        DEFAULT_WORDS.iter().map(|w| w.to_string()).collect()
    }
}
