//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Programmatic wrapper for the terraform CLI: option encoding, shell-free
/// invocation, state parsing
#[derive(Parser, Debug)]
#[command(name = "tfwrap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level (-d, -dd, -ddd)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Working directory for the terraform binary (default: cwd)
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// State file path, relative to the working directory
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show an execution plan
    Plan(RunArgs),

    /// Apply changes without interactive approval
    Apply(RunArgs),

    /// Destroy managed infrastructure without interactive approval
    Destroy(RunArgs),

    /// Initialize the working directory
    Init(RunArgs),

    /// Refresh state against real resources
    Refresh(RunArgs),

    /// Read output values from the state
    Output {
        /// Output name (all outputs when omitted)
        name: Option<String>,
    },

    /// Manage workspaces
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },

    /// Inspect the parsed state file
    State {
        #[command(subcommand)]
        command: StateCommands,
    },

    /// Run an arbitrary terraform subcommand
    Run {
        /// Subcommand, quoted when multi-word ("workspace select")
        command: String,

        /// Positional arguments for the subcommand
        args: Vec<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Pass-through options shared by the invocation commands.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Set a variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Limit operation to a resource address (repeatable)
    #[arg(long = "target", value_name = "ADDR")]
    pub targets: Vec<String>,

    /// Bare flag to pass through, without the dash (repeatable)
    #[arg(long = "flag", value_name = "NAME")]
    pub flags: Vec<String>,

    /// Arbitrary option to pass through (repeatable)
    #[arg(long = "opt", value_name = "NAME=VALUE")]
    pub opts: Vec<String>,

    /// Stream output to the terminal instead of capturing it
    #[arg(long)]
    pub no_capture: bool,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommands {
    /// List workspaces
    List,
    /// Show the current workspace
    Show,
    /// Select a workspace
    Select { name: String },
    /// Create a workspace
    New { name: String },
    /// Delete a workspace
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// List output values per module
    Outputs,
    /// List resource addresses
    Resources,
    /// List module paths
    Modules,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print a config file template
    Template,
}
