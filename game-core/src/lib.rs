pub mod game_state;
pub mod quota;
pub mod scoring;
pub mod word_validation;

// Re-export main components
pub use game_state::*;
pub use quota::*;
pub use scoring::*;
pub use word_validation::*;
