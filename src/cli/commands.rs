//! Command dispatch: wires parsed arguments to the application services

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{read_state, ExecutionResult, Terraform};
use crate::application::ApplicationResult;
use crate::cli::args::{
    Cli, Commands, ConfigCommands, RunArgs, StateCommands, WorkspaceCommands,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::state::render_module_path;
use crate::domain::{OptionSet, OptionValue};
use crate::exitcode;

pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    let Some(command) = &cli.command else {
        return Ok(exitcode::OK);
    };

    match command {
        Commands::Plan(run) => invoke(cli, run, |tf, opts| tf.plan(None, opts)),
        Commands::Apply(run) => invoke(cli, run, |tf, opts| tf.apply(None, opts)),
        Commands::Destroy(run) => invoke(cli, run, |tf, opts| tf.destroy(None, opts)),
        Commands::Init(run) => invoke(cli, run, |tf, opts| tf.init(None, opts)),
        Commands::Refresh(run) => invoke(cli, run, |tf, opts| tf.refresh(None, opts)),
        Commands::Output { name } => show_output(cli, name.as_deref()),
        Commands::Workspace { command } => workspace(cli, command),
        Commands::State { command } => state(cli, command),
        Commands::Run { command, args, run } => {
            invoke(cli, run, |tf, opts| tf.cmd(command, args, opts))
        }
        Commands::Config { command } => config_cmd(command),
        Commands::Completion { shell } => completion(*shell),
    }
}

/// Run one terraform invocation and pass its exit code through.
fn invoke(
    cli: &Cli,
    run: &RunArgs,
    f: impl FnOnce(&mut Terraform, OptionSet) -> ApplicationResult<ExecutionResult>,
) -> CliResult<i32> {
    let mut tf = make_terraform(cli)?;
    tf.capture = !run.no_capture;
    let options = run_options(run)?;

    let result = f(&mut tf, options).map_err(CliError::from)?;
    report(&result);
    Ok(result.code)
}

#[instrument(skip(cli))]
fn show_output(cli: &Cli, name: Option<&str>) -> CliResult<i32> {
    let mut tf = make_terraform(cli)?;

    let value = match name {
        Some(name) => tf.output(name),
        None => tf.outputs(),
    }
    .map_err(CliError::from)?;

    match value {
        Some(value) => {
            let rendered = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| value.to_string());
            output::info(&rendered);
            Ok(exitcode::OK)
        }
        None => {
            output::warning("terraform output reported no values");
            Ok(exitcode::DATAERR)
        }
    }
}

fn workspace(cli: &Cli, command: &WorkspaceCommands) -> CliResult<i32> {
    let mut tf = make_terraform(cli)?;

    let result = match command {
        WorkspaceCommands::List => {
            for name in tf.workspace_list().map_err(CliError::from)? {
                output::info(&name);
            }
            return Ok(exitcode::OK);
        }
        WorkspaceCommands::Show => tf.workspace_show(),
        WorkspaceCommands::Select { name } => tf.workspace_select(name),
        WorkspaceCommands::New { name } => tf.workspace_new(name),
        WorkspaceCommands::Delete { name } => tf.workspace_delete(name),
    }
    .map_err(CliError::from)?;

    report(&result);
    Ok(result.code)
}

#[instrument(skip(cli))]
fn state(cli: &Cli, command: &StateCommands) -> CliResult<i32> {
    let working_dir = cli.chdir.clone().unwrap_or_else(|| PathBuf::from("."));
    let document = read_state(&working_dir, cli.state.as_deref()).map_err(CliError::from)?;
    debug!("state: {} modules", document.modules.len());

    match command {
        StateCommands::Outputs => {
            for (path, module) in &document.modules {
                if module.outputs.is_empty() {
                    continue;
                }
                output::header(&render_module_path(path));
                for (name, value) in &module.outputs {
                    output::detail(&format!("{name} = {value}"));
                }
            }
        }
        StateCommands::Resources => {
            for address in document.resource_addresses() {
                output::info(&address);
            }
        }
        StateCommands::Modules => {
            for path in document.module_paths() {
                output::info(&render_module_path(&path));
            }
        }
    }

    Ok(exitcode::OK)
}

fn config_cmd(command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load().map_err(CliError::from)?;
            output::info(&settings.to_toml().map_err(CliError::from)?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(exitcode::OK)
}

fn completion(shell: clap_complete::Shell) -> CliResult<i32> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(exitcode::OK)
}

fn make_terraform(cli: &Cli) -> CliResult<Terraform> {
    let settings = Settings::load().map_err(CliError::from)?;
    let mut tf = Terraform::new(&settings);
    tf.working_dir = cli.chdir.clone();
    tf.state_file = cli.state.clone();
    Ok(tf)
}

/// Translate pass-through arguments into an option set.
fn run_options(run: &RunArgs) -> CliResult<OptionSet> {
    let mut options = OptionSet::new();

    if !run.vars.is_empty() {
        let mut vars = BTreeMap::new();
        for pair in &run.vars {
            let (key, value) = split_pair(pair)?;
            vars.insert(key.to_string(), value.to_string());
        }
        options.set("var", vars);
    }

    if !run.targets.is_empty() {
        options.set("target", run.targets.clone());
    }

    for flag in &run.flags {
        options.set(flag.replace('-', "_"), OptionValue::Flag);
    }

    for pair in &run.opts {
        let (name, value) = split_pair(pair)?;
        options.set(name.replace('-', "_"), value);
    }

    Ok(options)
}

fn split_pair(pair: &str) -> CliResult<(&str, &str)> {
    pair.split_once('=')
        .ok_or_else(|| CliError::InvalidArgs(format!("expected NAME=VALUE, got: {pair}")))
}

/// Print captured output; streamed runs have nothing to echo.
fn report(result: &ExecutionResult) {
    if let Some(stdout) = &result.stdout {
        if !stdout.is_empty() {
            output::info(stdout.trim_end());
        }
    }
    if let Some(stderr) = &result.stderr {
        if !stderr.is_empty() {
            eprintln!("{}", stderr.trim_end());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::RunArgs;

    #[test]
    fn given_var_pairs_when_building_options_then_map_option() {
        let run = RunArgs {
            vars: vec!["a=b".to_string(), "c=d".to_string()],
            ..RunArgs::default()
        };
        let options = run_options(&run).unwrap();
        assert_eq!(options.encode(), vec!["-var='a=b'", "-var='c=d'"]);
    }

    #[test]
    fn given_dashed_flag_when_building_options_then_flag_token() {
        let run = RunArgs {
            flags: vec!["no-color".to_string()],
            ..RunArgs::default()
        };
        let options = run_options(&run).unwrap();
        assert_eq!(options.encode(), vec!["-no-color"]);
    }

    #[test]
    fn given_malformed_pair_when_building_options_then_usage_error() {
        let run = RunArgs {
            vars: vec!["novalue".to_string()],
            ..RunArgs::default()
        };
        assert!(run_options(&run).is_err());
    }
}
