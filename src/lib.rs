//! tfwrap: programmatic wrapper for the terraform CLI
//!
//! Converts dynamically shaped option sets (flags, booleans, lists, maps)
//! into argument vectors, runs the binary without a shell, and parses the
//! resulting state file into a normalized module tree.
//!
//! The layers mirror their dependencies: `domain` (pure encoding and state
//! model), `application` (invocation and state services), `infrastructure`
//! (process boundary), `cli` (binary surface).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::services::{
    read_state, ExecutionResult, ExecutorService, Invocation, Terraform,
};
pub use application::{ApplicationError, ApplicationResult};
pub use config::{ChdirStyle, Settings};
pub use domain::{OptionSet, OptionValue, StateDocument};
