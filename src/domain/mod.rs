//! Domain layer: option encoding and the state document model
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod options;
pub mod state;

pub use error::DomainError;
pub use options::{OptionSet, OptionValue};
pub use state::{Module, ModulePath, Resource, StateDocument};
