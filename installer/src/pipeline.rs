//! Per-record install pipeline orchestration.
//!
//! Each profile record runs through Resolution, the idempotency check,
//! Transfer, Extraction, and Normalisation in that order. Records are
//! processed sequentially in profile order. A failure is reported against
//! its record and never stops the records that follow.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fs;
use std::io::Write;

use crate::artefact::download::ModuleFetcher;
use crate::artefact::extraction::ArchiveExtractor;
use crate::artefact::normalise::{NormaliseOutcome, normalise_layout};
use crate::error::{RecordError, display_chain};
use crate::identifier::ModuleIdentifier;
use crate::output::{progress_line, write_stderr_line};
use crate::profile::ProfileRecord;
use crate::resolution::resolve_record;
use crate::transfer::{TransferOutcome, transfer};

/// Collaborators and settings shared by every record in a run.
pub struct InstallContext<'a> {
    /// Directory that receives one subdirectory per module.
    pub install_root: &'a Utf8Path,
    /// Filename marking the root of an installed module.
    pub manifest_filename: &'a str,
    /// Source of manifests and artefacts.
    pub fetcher: &'a dyn ModuleFetcher,
    /// Unpacks downloaded artefacts.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Suppress per-record progress output.
    pub quiet: bool,
}

/// What happened to a record that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The module was fetched, unpacked, and normalised.
    Installed {
        /// The module's sanitised identifier.
        identifier: ModuleIdentifier,
        /// The module's install directory.
        path: Utf8PathBuf,
        /// True when an artefact from an earlier run was used.
        reused_artefact: bool,
        /// Name of the wrapper directory lifted during normalisation.
        unwrapped: Option<String>,
    },
    /// The module was already present and left alone.
    AlreadyInstalled {
        /// The module's sanitised identifier.
        identifier: ModuleIdentifier,
        /// The module's install directory.
        path: Utf8PathBuf,
    },
}

/// The result of processing one profile record.
#[derive(Debug)]
pub struct RecordReport {
    /// The record as read from the profile.
    pub record: ProfileRecord,
    /// Its outcome.
    pub result: Result<RecordOutcome, RecordError>,
}

/// Results for every record of a run, in profile order.
#[derive(Debug, Default)]
pub struct InstallReport {
    /// One report per processed record.
    pub records: Vec<RecordReport>,
}

impl InstallReport {
    /// Number of modules installed during this run.
    #[must_use]
    pub fn installed(&self) -> usize {
        self.count(|result| matches!(result, Ok(RecordOutcome::Installed { .. })))
    }

    /// Number of modules found already installed.
    #[must_use]
    pub fn already_installed(&self) -> usize {
        self.count(|result| matches!(result, Ok(RecordOutcome::AlreadyInstalled { .. })))
    }

    /// Number of records that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Result::is_err)
    }

    /// Iterate over the records that failed with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&ProfileRecord, &RecordError)> {
        self.records.iter().filter_map(|report| match &report.result {
            Ok(_) => None,
            Err(err) => Some((&report.record, err)),
        })
    }

    /// Returns a human-readable summary line.
    ///
    /// # Examples
    ///
    /// ```
    /// use modsync_installer::pipeline::InstallReport;
    ///
    /// let report = InstallReport::default();
    /// assert_eq!(
    ///     report.summary_line(),
    ///     "Processed 0 modules: 0 installed, 0 already installed, 0 failed"
    /// );
    /// ```
    #[must_use]
    pub fn summary_line(&self) -> String {
        let total = self.records.len();
        let noun = if total == 1 { "module" } else { "modules" };
        format!(
            "Processed {total} {noun}: {} installed, {} already installed, {} failed",
            self.installed(),
            self.already_installed(),
            self.failed(),
        )
    }

    fn count(&self, predicate: impl Fn(&Result<RecordOutcome, RecordError>) -> bool) -> usize {
        self.records
            .iter()
            .filter(|report| predicate(&report.result))
            .count()
    }
}

/// Install every record in order, isolating per-record failures.
pub fn install_profile(
    records: &[ProfileRecord],
    context: &InstallContext<'_>,
    stderr: &mut dyn Write,
) -> InstallReport {
    let total = records.len();
    let mut report = InstallReport::default();

    for (index, record) in records.iter().enumerate() {
        if !context.quiet {
            write_stderr_line(stderr, progress_line(index + 1, total, record.display_name()));
        }

        let result = install_record(record, context);
        match &result {
            Ok(outcome) => report_success(outcome, context.quiet, stderr),
            Err(err) => report_failure(record, err, stderr),
        }
        report.records.push(RecordReport {
            record: record.clone(),
            result,
        });
    }

    report
}

/// Run a single record through every stage.
///
/// # Errors
///
/// Returns the [`RecordError`] of the first stage that failed.
pub fn install_record(
    record: &ProfileRecord,
    context: &InstallContext<'_>,
) -> Result<RecordOutcome, RecordError> {
    let module = resolve_record(record, context.fetcher)?;

    let (target, artefact, reused) = match transfer(
        &module,
        context.install_root,
        context.manifest_filename,
        context.fetcher,
    )? {
        TransferOutcome::AlreadyInstalled { target } => {
            return Ok(RecordOutcome::AlreadyInstalled {
                identifier: module.identifier,
                path: target,
            });
        }
        TransferOutcome::Ready {
            target,
            artefact,
            reused,
        } => (target, artefact, reused),
    };

    unpack(context.extractor, &artefact, &target)?;

    let unwrapped = match normalise_layout(&target, context.manifest_filename)? {
        NormaliseOutcome::AlreadyAtRoot => None,
        NormaliseOutcome::Unwrapped { wrapper } => Some(wrapper),
    };

    info!("installed {} into {target}", module.identifier);
    Ok(RecordOutcome::Installed {
        identifier: module.identifier,
        path: target,
        reused_artefact: reused,
        unwrapped,
    })
}

/// Extract the artefact into the target, then delete the artefact.
///
/// A corrupt artefact stays on disk so the failure can be inspected.
fn unpack(
    extractor: &dyn ArchiveExtractor,
    artefact: &Utf8Path,
    target: &Utf8Path,
) -> Result<(), RecordError> {
    let extraction_error = |source| RecordError::Extraction {
        path: artefact.to_owned(),
        source,
    };

    let written = extractor
        .extract(artefact.as_std_path(), target.as_std_path())
        .map_err(extraction_error)?;
    debug!("extracted {written} files from {artefact}");

    fs::remove_file(artefact).map_err(|e| extraction_error(e.into()))
}

fn report_success(outcome: &RecordOutcome, quiet: bool, stderr: &mut dyn Write) {
    if quiet {
        return;
    }
    let line = match outcome {
        RecordOutcome::Installed {
            path,
            reused_artefact,
            unwrapped,
            ..
        } => {
            let mut line = format!("  installed to {path}");
            if *reused_artefact {
                line.push_str(" (reused downloaded artefact)");
            }
            if let Some(wrapper) = unwrapped {
                line.push_str(&format!(" (lifted {wrapper}/)"));
            }
            line
        }
        RecordOutcome::AlreadyInstalled { path, .. } => {
            format!("  already installed at {path}, skipping")
        }
    };
    write_stderr_line(stderr, line);
}

/// Failures are always reported, quiet or not.
fn report_failure(record: &ProfileRecord, err: &RecordError, stderr: &mut dyn Write) {
    let detail = display_chain(err);
    warn!(
        "{} failed for {} ({}): {detail}",
        err.kind(),
        record.display_name(),
        record.manifest_url()
    );
    write_stderr_line(
        stderr,
        format!(
            "  error: {} ({}): {detail}",
            record.display_name(),
            record.manifest_url()
        ),
    );
    if let Some(hint) = err.recovery_hint() {
        write_stderr_line(stderr, format!("  hint: {hint}"));
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
