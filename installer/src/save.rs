//! The `save` command: scan for modules and write a profile.

use log::info;
use std::io::Write;

use crate::cli::SaveArgs;
use crate::config::InstallerConfig;
use crate::discovery::{DiscoveryReport, discover_modules};
use crate::error::{InstallerError, Result};
use crate::output::{save_summary, write_stderr_line};
use crate::profile::write_profile;

/// Scan `args.root` and write the profile to `args.output`.
///
/// Skipped manifests are listed on stderr unless `quiet` is set.
///
/// # Errors
///
/// Returns an error if the scan root is missing or the profile cannot be
/// written.
pub fn run_save(
    args: &SaveArgs,
    config: &InstallerConfig,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<DiscoveryReport> {
    if !quiet {
        write_stderr_line(stderr, format!("Scanning {} for modules...", args.root));
    }

    let report = discover_modules(&args.root, &config.manifest_filename)?;
    write_profile(&args.output, &report.records).map_err(|source| {
        InstallerError::ProfileWrite {
            path: args.output.clone(),
            source,
        }
    })?;
    info!("wrote {} records to {}", report.records.len(), args.output);

    if !quiet {
        for skip in &report.skipped {
            write_stderr_line(stderr, format!("  skipped {}: {}", skip.path, skip.reason));
        }
        write_stderr_line(
            stderr,
            save_summary(report.records.len(), report.skipped.len(), &args.output),
        );
    }

    Ok(report)
}
