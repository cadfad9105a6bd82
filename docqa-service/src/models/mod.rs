//! Domain models for the document Q&A service.

pub mod quiz;
pub mod session;

pub use quiz::{OptionLabel, QuizItem, QuizOptions};
pub use session::{Session, StoredDocument};
