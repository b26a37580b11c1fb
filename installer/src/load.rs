//! The `load` command: install every module listed in a profile.

use log::info;
use std::io::Write;

use crate::artefact::download::{HttpFetcher, ModuleFetcher};
use crate::artefact::extraction::{ArchiveExtractor, ZipExtractor};
use crate::cli::LoadArgs;
use crate::config::InstallerConfig;
use crate::error::{InstallerError, Result};
use crate::output::write_stderr_line;
use crate::pipeline::{InstallContext, InstallReport, install_profile};
use crate::preflight::check_install_root;
use crate::profile::read_profile;

/// Install the profile with the production HTTP fetcher and zip extractor.
///
/// # Errors
///
/// Returns an error if the profile cannot be read or the install root is
/// unusable. Per-record failures are reported in the [`InstallReport`].
pub fn run_load(
    args: &LoadArgs,
    config: &InstallerConfig,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<InstallReport> {
    let fetcher = HttpFetcher::from_config(config);
    run_load_with(args, config, quiet, &fetcher, &ZipExtractor, stderr)
}

/// Install the profile with injected collaborators.
///
/// # Errors
///
/// See [`run_load`].
pub fn run_load_with(
    args: &LoadArgs,
    config: &InstallerConfig,
    quiet: bool,
    fetcher: &dyn ModuleFetcher,
    extractor: &dyn ArchiveExtractor,
    stderr: &mut dyn Write,
) -> Result<InstallReport> {
    let profile = read_profile(&args.profile).map_err(|source| InstallerError::ProfileRead {
        path: args.profile.clone(),
        source,
    })?;
    check_install_root(&args.install_root)?;

    if !quiet {
        for skipped in &profile.skipped {
            write_stderr_line(
                stderr,
                format!(
                    "Ignoring line {} of {}: {}",
                    skipped.line_number, args.profile, skipped.content
                ),
            );
        }
        write_stderr_line(
            stderr,
            format!(
                "Installing {} modules into {}",
                profile.records.len(),
                args.install_root
            ),
        );
    }

    let context = InstallContext {
        install_root: &args.install_root,
        manifest_filename: &config.manifest_filename,
        fetcher,
        extractor,
        quiet,
    };
    let report = install_profile(&profile.records, &context, stderr);
    info!("{}", report.summary_line());

    if !quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, report.summary_line());
    }

    Ok(report)
}
