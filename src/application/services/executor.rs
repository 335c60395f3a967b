//! Command invocation: argument assembly and process execution
//!
//! Builds the full argument vector (global options, subcommand tokens,
//! positional arguments, encoded per-command options), then runs the binary
//! through the `CommandRunner` boundary. Oversized `-var` maps are
//! externalized to `.tfvars.json` temp files that live exactly until the
//! invocation returns.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{OptionSet, OptionValue};
use crate::infrastructure::{CommandRunner, ProcessSpec};

/// Rendered `-var` tokens larger than this move into a temp var file.
const VAR_FILE_THRESHOLD: usize = 4096;

/// Suffix for externalized variable files.
const VAR_FILE_SUFFIX: &str = ".tfvars.json";

/// One fully specified execution of the wrapped binary.
///
/// Constructed per call, immutable once handed to the executor, discarded
/// after use.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Subcommand, split on whitespace (`"workspace select"` is two tokens)
    pub command: String,
    /// Positional arguments, placed before the encoded options
    pub args: Vec<String>,
    /// Options encoded ahead of the subcommand tokens (`-chdir` lives here)
    pub global_options: OptionSet,
    /// Per-command options
    pub options: OptionSet,
    /// Current directory for the child; parent's cwd when `None`
    pub working_dir: Option<PathBuf>,
    /// Environment overrides
    pub env: BTreeMap<String, String>,
    /// Pass the parent environment through to the child
    pub inherit_env: bool,
    /// Capture stdout/stderr; when false the child streams to the parent's
    pub capture: bool,
    /// Strict mode: promote a non-zero exit code to an error
    pub check: bool,
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            global_options: OptionSet::new(),
            options: OptionSet::new(),
            working_dir: None,
            env: BTreeMap::new(),
            inherit_env: true,
            capture: true,
            check: false,
        }
    }
}

/// Exit code plus captured text of one invocation.
///
/// A non-zero code is a reportable result, not a fault. Text fields are
/// `None` when output was streamed.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs the wrapped binary. Stateless apart from the binary path; safe to
/// share across threads, each `invoke` owns its own process.
pub struct ExecutorService {
    bin_path: String,
    runner: Arc<dyn CommandRunner>,
}

impl ExecutorService {
    pub fn new(bin_path: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            bin_path: bin_path.into(),
            runner,
        }
    }

    pub fn bin_path(&self) -> &str {
        &self.bin_path
    }

    /// Run one invocation to completion.
    ///
    /// The working directory is validated before any spawn attempt. A spawn
    /// failure is a `Launch` error; a started process that exits non-zero
    /// comes back as a plain result unless `check` is set. Nothing is
    /// retried.
    pub fn invoke(&self, invocation: &Invocation) -> ApplicationResult<ExecutionResult> {
        if let Some(dir) = &invocation.working_dir {
            if !dir.is_dir() {
                return Err(ApplicationError::InvalidWorkingDirectory(dir.clone()));
            }
        }

        // Externalized var files must outlive the child; dropping them at
        // the end of this scope removes them on every exit path.
        let mut var_files: Vec<NamedTempFile> = Vec::new();
        let args = self.build_argv(invocation, &mut var_files)?;

        debug!("invoke: {} {}", self.bin_path, args.join(" "));

        let spec = ProcessSpec {
            program: self.bin_path.clone(),
            args,
            cwd: invocation.working_dir.clone(),
            env: invocation.env.clone(),
            inherit_env: invocation.inherit_env,
            capture: invocation.capture,
        };

        let output = self
            .runner
            .run(&spec)
            .map_err(|e| ApplicationError::Launch {
                program: self.bin_path.clone(),
                source: e,
            })?;

        let result = ExecutionResult {
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if !result.success() {
            warn!("invoke: {} exited with status {}", invocation.command, result.code);
            if invocation.check {
                return Err(ApplicationError::CommandFailed {
                    code: result.code,
                    stderr: result.stderr,
                });
            }
        }

        Ok(result)
    }

    /// Full vector: global options, subcommand tokens, positionals, options.
    fn build_argv(
        &self,
        invocation: &Invocation,
        var_files: &mut Vec<NamedTempFile>,
    ) -> ApplicationResult<Vec<String>> {
        let mut argv = invocation.global_options.encode();
        argv.extend(invocation.command.split_whitespace().map(str::to_string));
        argv.extend(invocation.args.iter().cloned());
        argv.extend(encode_with_var_files(&invocation.options, var_files)?);
        Ok(argv)
    }
}

/// Encode options, rewriting oversized `var` maps into `-var-file`
/// references backed by temp files.
fn encode_with_var_files(
    options: &OptionSet,
    var_files: &mut Vec<NamedTempFile>,
) -> ApplicationResult<Vec<String>> {
    let oversized = match options.get("var") {
        Some(OptionValue::Map(map)) if !map.is_empty() && var_tokens_len(map) > VAR_FILE_THRESHOLD => {
            Some(map.clone())
        }
        _ => None,
    };

    let Some(map) = oversized else {
        return Ok(options.encode());
    };

    let file = write_var_file(&map)?;
    let path = file.path().display().to_string();

    let mut rewritten = options.clone();
    rewritten.set("var", OptionValue::Unset);
    match rewritten.get("var_file").cloned() {
        Some(OptionValue::Str(existing)) => {
            rewritten.set("var_file", OptionValue::List(vec![existing, path]));
        }
        Some(OptionValue::List(mut existing)) => {
            existing.push(path);
            rewritten.set("var_file", OptionValue::List(existing));
        }
        _ => rewritten.set("var_file", OptionValue::Str(path)),
    }
    var_files.push(file);

    Ok(rewritten.encode())
}

/// Total bytes the map would occupy as `-var='k=v'` tokens.
fn var_tokens_len(map: &BTreeMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len() + 9).sum()
}

fn write_var_file(map: &BTreeMap<String, String>) -> ApplicationResult<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(VAR_FILE_SUFFIX)
        .tempfile()
        .map_err(|e| ApplicationError::OperationFailed {
            context: "create var file".to_string(),
            source: Box::new(e),
        })?;

    let payload = serde_json::to_vec(map).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize var file".to_string(),
        source: Box::new(e),
    })?;
    file.as_file_mut()
        .write_all(&payload)
        .with_path_context("write var file", file.path())?;

    debug!(
        "write_var_file: {} variables -> {}",
        map.len(),
        file.path().display()
    );
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_small_var_map_when_encoding_then_inline_tokens() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "b".to_string());
        let options = OptionSet::new().with("var", map);

        let mut var_files = Vec::new();
        let tokens = encode_with_var_files(&options, &mut var_files).unwrap();

        assert_eq!(tokens, vec!["-var='a=b'"]);
        assert!(var_files.is_empty());
    }

    #[test]
    fn given_oversized_var_map_when_encoding_then_var_file_reference() {
        let mut map = BTreeMap::new();
        map.insert("blob".to_string(), "x".repeat(VAR_FILE_THRESHOLD));
        let options = OptionSet::new().with("var", map.clone());

        let mut var_files = Vec::new();
        let tokens = encode_with_var_files(&options, &mut var_files).unwrap();

        assert_eq!(var_files.len(), 1);
        let path = var_files[0].path().to_path_buf();
        assert!(path.to_string_lossy().ends_with(VAR_FILE_SUFFIX));
        assert_eq!(tokens, vec![format!("-var-file={}", path.display())]);

        let written: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, map);

        drop(var_files);
        assert!(!path.exists(), "var file should be removed on drop");
    }

    #[test]
    fn given_existing_var_file_option_when_externalizing_then_appended() {
        let mut map = BTreeMap::new();
        map.insert("blob".to_string(), "x".repeat(VAR_FILE_THRESHOLD));
        let options = OptionSet::new()
            .with("var_file", "base.tfvars")
            .with("var", map);

        let mut var_files = Vec::new();
        let tokens = encode_with_var_files(&options, &mut var_files).unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], "-var-file=base.tfvars");
        assert!(tokens[1].starts_with("-var-file="));
        assert!(tokens[1].ends_with(VAR_FILE_SUFFIX));
    }
}
