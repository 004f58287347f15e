pub mod prelude;

pub mod game_sessions;
pub mod guesses;
pub mod users;
pub mod words;
