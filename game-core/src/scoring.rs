use std::fmt;

use game_types::LetterStatus;

/// Per-position accuracy of a guess, rendered as a code such as `"GOXXG"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feedback(Vec<LetterStatus>);

impl Feedback {
    pub fn code(&self) -> String {
        self.0.iter().map(|status| status.code()).collect()
    }

    /// Every position is an exact match.
    pub fn is_solved(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|s| *s == LetterStatus::Correct)
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Score a guess against the secret word.
    ///
    /// Each position is judged on its own: an exact match is `Correct`, a
    /// letter found anywhere in the secret is `Present`, anything else is
    /// `Absent`. Repeated letters are not rationed, so a guess with two `L`s
    /// against a secret with one `L` can show both as `Present`.
    ///
    /// Inputs are assumed to be validated, equal-length uppercase words.
    pub fn score(guess: &str, secret: &str) -> Feedback {
        let secret_chars: Vec<char> = secret.chars().collect();

        let statuses = guess
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                if secret_chars.get(i) == Some(&ch) {
                    LetterStatus::Correct
                } else if secret_chars.contains(&ch) {
                    LetterStatus::Present
                } else {
                    LetterStatus::Absent
                }
            })
            .collect();

        Feedback(statuses)
    }
}
