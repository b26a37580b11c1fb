//! CLI argument definitions for modsync.
//!
//! The interface is defined with clap and kept apart from the entrypoint so
//! parsing can be tested without running any command.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Default profile filename, relative to the current directory.
pub const DEFAULT_PROFILE: &str = "modules_profile.txt";

/// Save and restore manifest-driven modules.
#[derive(Parser, Debug)]
#[command(name = "modsync")]
#[command(version, about)]
#[command(long_about = concat!(
    "Save and restore manifest-driven modules.\n\n",
    "`modsync save` scans a directory for module.json files and writes a profile ",
    "listing every module with its remote manifest URL. `modsync load` reads a ",
    "profile and installs each module into its own directory, skipping modules ",
    "that are already present.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Record the modules installed under the current directory:\n",
    "    $ modsync save\n\n",
    "  Restore them on another machine:\n",
    "    $ modsync load ~/foundrydata/Data/modules\n\n",
    "  Use a different profile file:\n",
    "    $ modsync load --profile backup.txt ./modules",
))]
pub struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read settings from this TOML file instead of the default location.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,
}

/// Available operations.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan for installed modules and write a profile.
    Save(SaveArgs),

    /// Install every module listed in a profile.
    Load(LoadArgs),
}

/// Arguments for `save`.
#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    /// Directory to scan for module manifests.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub root: Utf8PathBuf,

    /// Profile file to write.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_PROFILE)]
    pub output: Utf8PathBuf,
}

/// Arguments for `load`.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Directory that receives one subdirectory per module.
    #[arg(value_name = "INSTALL_ROOT", default_value = ".")]
    pub install_root: Utf8PathBuf,

    /// Profile file to read.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_PROFILE)]
    pub profile: Utf8PathBuf,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
