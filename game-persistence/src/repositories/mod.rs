pub mod game_repository;
pub mod report_repository;
pub mod user_repository;
pub mod word_repository;

pub use game_repository::{GameRepository, GuessRecorded};
pub use report_repository::ReportRepository;
pub use user_repository::{StoredCredentials, UserRepository};
pub use word_repository::WordRepository;
