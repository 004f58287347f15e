pub use super::game_sessions::Entity as GameSessions;
pub use super::guesses::Entity as Guesses;
pub use super::users::Entity as Users;
pub use super::words::Entity as Words;
