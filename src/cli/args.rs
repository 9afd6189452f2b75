//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Semantic annotation engine for web maps: Schema.org Microdata synthesis
#[derive(Parser, Debug)]
#[command(name = "mapnotate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-d, -d -d, -d -d -d)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Alternative config file (default: XDG location)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Annotate a scene file, print the resulting markup
    Annotate {
        /// Scene description (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        scene: PathBuf,

        /// Write markup to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Show the annotated render structure as a tree
    Tree {
        /// Scene description (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        scene: PathBuf,
    },

    /// List supported Schema.org types
    Types {
        /// Also list the recognized place-holder properties per type
        #[arg(short, long)]
        properties: bool,
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

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init,

    /// Show config paths
    Path,
}
