//! High-level terraform façade
//!
//! Carries per-instance defaults (working directory, state path, targets,
//! variables, parallelism) and exposes the common lifecycle operations.
//! Every operation funnels through [`Terraform::cmd`], which merges the
//! instance defaults underneath caller options before encoding. Defaults
//! are explicit configuration, not hidden state.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::application::services::{read_state, ExecutionResult, ExecutorService, Invocation};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::{ChdirStyle, Settings};
use crate::domain::{OptionSet, OptionValue, StateDocument};
use crate::infrastructure::{CommandRunner, SystemCommandRunner};

/// Wrapper around one terraform working directory.
///
/// Each invocation is independently blocking and owns its own process;
/// concurrent instances against different working directories are safe.
/// Concurrent use of one directory is arbitrated by terraform's own state
/// lock, not by this type.
pub struct Terraform {
    executor: ExecutorService,
    /// Working directory for the binary; parent's cwd when `None`
    pub working_dir: Option<PathBuf>,
    /// State file override, relative to the working directory
    pub state_file: Option<PathBuf>,
    /// Default `-target` list for lifecycle commands
    pub targets: Vec<String>,
    /// Default `-var` map for lifecycle commands
    pub variables: BTreeMap<String, String>,
    /// Default `-parallelism`
    pub parallelism: Option<u32>,
    /// Default `-var-file`
    pub var_file: Option<String>,
    /// Pass the parent environment to the binary
    pub inherit_env: bool,
    /// Capture output (false streams to the parent's stdio)
    pub capture: bool,
    /// Strict mode: non-zero exits become errors
    pub check: bool,
    /// How per-call target directories reach the binary
    pub chdir_style: ChdirStyle,
    /// Environment overrides for every invocation
    pub env: BTreeMap<String, String>,
    state_doc: StateDocument,
}

impl Terraform {
    pub fn new(settings: &Settings) -> Self {
        Self::with_runner(settings, Arc::new(SystemCommandRunner))
    }

    /// Construct with an explicit runner (tests substitute a recording mock).
    pub fn with_runner(settings: &Settings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            executor: ExecutorService::new(settings.bin_path.clone(), runner),
            working_dir: None,
            state_file: None,
            targets: Vec::new(),
            variables: BTreeMap::new(),
            parallelism: settings.parallelism,
            var_file: None,
            inherit_env: settings.inherit_env,
            capture: true,
            check: false,
            chdir_style: settings.chdir_style,
            env: BTreeMap::new(),
            state_doc: StateDocument::default(),
        }
    }

    /// Latest parsed state snapshot (empty until a successful invocation or
    /// an explicit [`read_state`](Self::read_state)).
    pub fn state(&self) -> &StateDocument {
        &self.state_doc
    }

    /// Run an arbitrary subcommand with the instance defaults merged in.
    ///
    /// On exit code zero the state snapshot is refreshed as a best-effort
    /// follow-up: a parse failure there is logged, not raised, since the
    /// invocation itself already succeeded.
    pub fn cmd(
        &mut self,
        command: &str,
        args: &[String],
        options: OptionSet,
    ) -> ApplicationResult<ExecutionResult> {
        self.run_with_dir(None, command, args, options)
    }

    /// Refer to the `apply` command; `-auto-approve` is defaulted on.
    pub fn apply(
        &mut self,
        dir: Option<&str>,
        mut options: OptionSet,
    ) -> ApplicationResult<ExecutionResult> {
        options.merge_defaults(&OptionSet::new().with("auto_approve", true));
        self.run_with_dir(dir, "apply", &[], options)
    }

    /// Refer to the `destroy` command; `-auto-approve` is defaulted on.
    pub fn destroy(
        &mut self,
        dir: Option<&str>,
        mut options: OptionSet,
    ) -> ApplicationResult<ExecutionResult> {
        options.merge_defaults(&OptionSet::new().with("auto_approve", true));
        self.run_with_dir(dir, "destroy", &[], options)
    }

    /// Refer to the `plan` command; `-detailed-exitcode` is defaulted on,
    /// so exit code 2 means "changes pending", not failure.
    pub fn plan(
        &mut self,
        dir: Option<&str>,
        mut options: OptionSet,
    ) -> ApplicationResult<ExecutionResult> {
        options.merge_defaults(&OptionSet::new().with("detailed_exitcode", OptionValue::Flag));
        self.run_with_dir(dir, "plan", &[], options)
    }

    /// Refer to the `refresh` command.
    pub fn refresh(
        &mut self,
        dir: Option<&str>,
        options: OptionSet,
    ) -> ApplicationResult<ExecutionResult> {
        self.run_with_dir(dir, "refresh", &[], options)
    }

    /// Refer to the `init` command; `-reconfigure` and `-backend=true` are
    /// defaulted on.
    pub fn init(
        &mut self,
        dir: Option<&str>,
        mut options: OptionSet,
    ) -> ApplicationResult<ExecutionResult> {
        options.merge_defaults(
            &OptionSet::new()
                .with("reconfigure", OptionValue::Flag)
                .with("backend", true),
        );
        self.run_with_dir(dir, "init", &[], options)
    }

    /// All output values as one JSON object (`output -json`).
    ///
    /// `None` when the command itself failed (e.g. no state yet).
    pub fn outputs(&mut self) -> ApplicationResult<Option<Value>> {
        self.output_json(None)
    }

    /// A single output value by name.
    ///
    /// Newer binaries emit the full `{value, type, sensitive}` object for a
    /// named output; the bare value is extracted in that case.
    pub fn output(&mut self, name: &str) -> ApplicationResult<Option<Value>> {
        let value = self.output_json(Some(name))?;
        Ok(value.map(|v| match v.as_object().and_then(|obj| obj.get("value")) {
            Some(inner) => inner.clone(),
            None => v,
        }))
    }

    fn output_json(&mut self, name: Option<&str>) -> ApplicationResult<Option<Value>> {
        let options = OptionSet::new().with("json", OptionValue::Flag);
        let args: Vec<String> = name.map(str::to_string).into_iter().collect();

        let result = self.cmd("output", &args, options)?;
        if !result.success() {
            return Ok(None);
        }

        let out = result.stdout.unwrap_or_default();
        let value = serde_json::from_str(out.trim_start()).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "parse output json".to_string(),
                source: Box::new(e),
            }
        })?;
        Ok(Some(value))
    }

    pub fn workspace_select(&mut self, name: &str) -> ApplicationResult<ExecutionResult> {
        self.cmd("workspace select", &[name.to_string()], OptionSet::new())
    }

    pub fn workspace_new(&mut self, name: &str) -> ApplicationResult<ExecutionResult> {
        self.cmd("workspace new", &[name.to_string()], OptionSet::new())
    }

    pub fn workspace_delete(&mut self, name: &str) -> ApplicationResult<ExecutionResult> {
        self.cmd("workspace delete", &[name.to_string()], OptionSet::new())
    }

    pub fn workspace_show(&mut self) -> ApplicationResult<ExecutionResult> {
        self.cmd("workspace show", &[], OptionSet::new())
    }

    /// Workspace names, with the `*` current marker and blanks stripped.
    pub fn workspace_list(&mut self) -> ApplicationResult<Vec<String>> {
        let result = self.cmd("workspace list", &[], OptionSet::new())?;
        Ok(parse_workspace_list(
            result.stdout.as_deref().unwrap_or_default(),
        ))
    }

    /// Re-read the state file and replace the snapshot.
    pub fn read_state(&mut self) -> ApplicationResult<&StateDocument> {
        self.state_doc = read_state(&self.effective_working_dir(), self.state_file.as_deref())?;
        Ok(&self.state_doc)
    }

    fn effective_working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn run_with_dir(
        &mut self,
        dir: Option<&str>,
        command: &str,
        args: &[String],
        mut options: OptionSet,
    ) -> ApplicationResult<ExecutionResult> {
        options.merge_defaults(&self.default_options());

        let mut invocation = Invocation::new(command);
        invocation.args = args.to_vec();
        match (dir, self.chdir_style) {
            (Some(d), ChdirStyle::Chdir) => {
                invocation.global_options.set("chdir", d);
            }
            (Some(d), ChdirStyle::Positional) => {
                invocation.args.push(d.to_string());
            }
            (None, _) => {}
        }
        invocation.options = options;
        invocation.working_dir = self.working_dir.clone();
        invocation.env = self.env.clone();
        invocation.inherit_env = self.inherit_env;
        invocation.capture = self.capture;
        invocation.check = self.check;

        let result = self.executor.invoke(&invocation)?;

        if result.success() {
            match read_state(&self.effective_working_dir(), self.state_file.as_deref()) {
                Ok(document) => self.state_doc = document,
                Err(e) => warn!("cmd: state refresh failed: {e}"),
            }
        }

        debug!("cmd: {} -> {}", command, result.code);
        Ok(result)
    }

    /// Instance defaults merged underneath every command's options.
    fn default_options(&self) -> OptionSet {
        let mut defaults = OptionSet::new();
        if let Some(state) = &self.state_file {
            defaults.set("state", state.display().to_string());
        }
        if !self.targets.is_empty() {
            defaults.set("target", self.targets.clone());
        }
        if !self.variables.is_empty() {
            defaults.set("var", self.variables.clone());
        }
        if let Some(var_file) = &self.var_file {
            defaults.set("var_file", var_file.clone());
        }
        if let Some(parallelism) = self.parallelism {
            defaults.set("parallelism", parallelism.to_string());
        }
        defaults.set("no_color", OptionValue::Flag);
        defaults.set("input", false);
        defaults
    }
}

fn parse_workspace_list(out: &str) -> Vec<String> {
    out.lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
