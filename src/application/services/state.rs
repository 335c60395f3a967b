//! State document reading
//!
//! Resolution order: explicit override path, then the backend-resolved
//! `.terraform/terraform.tfstate` cache, then `terraform.tfstate` in the
//! working directory. A missing file reads as the empty document: nothing
//! provisioned yet is a normal condition, not an error.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::StateDocument;

/// Default state file name within a working directory.
pub const DEFAULT_STATE_FILE: &str = "terraform.tfstate";

/// Directory holding the backend-resolved local state cache.
pub const BACKEND_STATE_DIR: &str = ".terraform";

/// Resolve the state file path for a working directory.
///
/// A relative override resolves against the working directory.
pub fn resolve_state_path(working_dir: &Path, override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return if path.is_absolute() {
            path.to_path_buf()
        } else {
            working_dir.join(path)
        };
    }

    let backend = working_dir.join(BACKEND_STATE_DIR).join(DEFAULT_STATE_FILE);
    if backend.is_file() {
        backend
    } else {
        working_dir.join(DEFAULT_STATE_FILE)
    }
}

/// Read and normalize the state document for a working directory.
///
/// Malformed content is a `StateParse` error naming the offending path; a
/// partially populated document is never returned.
pub fn read_state(
    working_dir: &Path,
    override_path: Option<&Path>,
) -> ApplicationResult<StateDocument> {
    let path = resolve_state_path(working_dir, override_path);

    if !path.is_file() {
        debug!("read_state: {} does not exist, empty document", path.display());
        return Ok(StateDocument::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| ApplicationError::StateParse {
        path: path.clone(),
        source: Box::new(e),
    })?;

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ApplicationError::StateParse {
            path: path.clone(),
            source: Box::new(e),
        })?;

    let document = StateDocument::from_value(&value).map_err(|e| ApplicationError::StateParse {
        path: path.clone(),
        source: Box::new(e),
    })?;

    debug!(
        "read_state: {} -> version {}, {} modules",
        path.display(),
        document.version,
        document.modules.len()
    );
    Ok(document)
}
