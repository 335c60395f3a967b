//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the option/state model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("output not found in {module}: {name}")]
    OutputNotFound { name: String, module: String },

    #[error("malformed state document: {0}")]
    MalformedState(String),
}
