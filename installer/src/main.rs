//! modsync CLI entrypoint.
//!
//! `modsync save` records the modules found under a directory in a profile
//! file; `modsync load` reinstalls every module listed in a profile.

use clap::Parser;
use clap::error::ErrorKind;
use log::LevelFilter;
use modsync_installer::cli::{Cli, Command};
use modsync_installer::config::InstallerConfig;
use modsync_installer::error::Result;
use modsync_installer::load::run_load;
use modsync_installer::output::write_stderr_line;
use modsync_installer::save::run_save;
use std::io::Write;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let printed = err.print().is_ok();
            std::process::exit(exit_code_for_parse_error(err.kind(), printed));
        }
    };

    init_logging(cli.verbosity);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Help and version requests succeed only if their text reached the terminal.
fn exit_code_for_parse_error(kind: ErrorKind, printed: bool) -> i32 {
    let informational = matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
    if informational && printed { 0 } else { 1 }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = InstallerConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Save(args) => {
            run_save(args, &config, cli.quiet, stderr)?;
        }
        Command::Load(args) => {
            run_load(args, &config, cli.quiet, stderr)?;
        }
    }
    Ok(())
}

/// `RUST_LOG`, when set, overrides the level chosen by `-v`.
fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(level_for_verbosity(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(
                stderr,
                format!(
                    "error: {}",
                    modsync_installer::error::display_chain(&err)
                ),
            );
            1
        }
    }
}
