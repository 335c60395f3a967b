//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the I/O boundary traits (CommandRunner) but are
//! themselves concrete structs, not traits.

mod executor;
mod state;
mod terraform;

pub use executor::{ExecutionResult, ExecutorService, Invocation};
pub use state::{read_state, resolve_state_path, BACKEND_STATE_DIR, DEFAULT_STATE_FILE};
pub use terraform::Terraform;
