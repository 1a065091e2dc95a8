//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Personal decision assistant: grows and walks a weighted tree of choices
#[derive(Parser, Debug)]
#[command(name = "whatnext")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Tree file (overrides config)
    #[arg(short = 'f', long, global = true, env = "WHATNEXT_TREE_FILE", value_hint = ValueHint::FilePath)]
    pub tree_file: Option<PathBuf>,

    /// Additional config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Random seed for reproducible suggestions
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk the tree and decide (default)
    Visit {
        /// Do not write the tree back
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the whole tree
    Show,

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

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented template
    Template,
    /// Show config file locations
    Path,
}
