pub mod errors;
pub mod game;
pub mod messages;
pub mod report;
pub mod user;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use messages::*;
pub use report::*;
pub use user::*;

pub type GameId = uuid::Uuid;
pub type UserId = uuid::Uuid;
pub type WordId = i32;
pub type GuessId = i32;

/// Number of letters in every secret word and every guess.
pub const WORD_LENGTH: usize = 5;

/// Guesses allowed per game before it is lost.
pub const MAX_ATTEMPTS: i32 = 5;
