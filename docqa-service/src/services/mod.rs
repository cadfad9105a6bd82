pub mod gateway;
pub mod metrics;
pub mod prompts;
pub mod providers;
pub mod response_sanitizer;
pub mod session_store;

pub use response_sanitizer::{parse_quiz, sanitize_model_json, QuizGenerationError};
pub use session_store::{InMemorySessionStore, SessionStore};
