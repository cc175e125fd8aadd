//! stack-quiz/crates/sq-core/src/lib.rs
//!
//! Domain models, upstream parsing and the interface definitions for the quiz.

pub mod error;
pub mod models;
pub mod parser;
pub mod settings;
pub mod shuffle;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use settings::ApiSettings;
pub use shuffle::{shuffle_answers, shuffle_answers_with};
pub use traits::*;
