//! Integration tests for the install pipeline against a stub fetcher.

use camino::Utf8PathBuf;
use modsync_installer::artefact::extraction::ZipExtractor;
use modsync_installer::error::RecordError;
use modsync_installer::pipeline::{InstallContext, InstallReport, RecordOutcome, install_profile};
use modsync_installer::profile::ProfileRecord;
use modsync_installer::test_utils::{StubFetcher, ZipFixture};
use modsync_installer::transfer::ARTEFACT_FILENAME;
use rstest::{fixture, rstest};
use std::fs;

const MANIFEST: &str = "module.json";

struct Sandbox {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Sandbox {
    fn run(&self, fetcher: &StubFetcher, records: &[ProfileRecord]) -> InstallReport {
        let context = InstallContext {
            install_root: &self.root,
            manifest_filename: MANIFEST,
            fetcher,
            extractor: &ZipExtractor,
            quiet: true,
        };
        install_profile(records, &context, &mut Vec::new())
    }
}

#[fixture]
fn sandbox() -> Sandbox {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().join("modules")).expect("UTF-8 path");
    fs::create_dir_all(&root).expect("create install root");
    Sandbox { _temp: temp, root }
}

fn record(id: &str) -> ProfileRecord {
    ProfileRecord::new(id, manifest_url(id))
}

fn manifest_url(id: &str) -> String {
    format!("https://modules.test/{id}/module.json")
}

fn download_url(id: &str) -> String {
    format!("https://modules.test/{id}.zip")
}

fn serving(fetcher: StubFetcher, id: &str, archive: ZipFixture) -> StubFetcher {
    fetcher.with_module(&manifest_url(id), id, &download_url(id), archive)
}

#[rstest]
fn second_run_makes_no_transfers_and_changes_nothing(sandbox: Sandbox) {
    let fetcher = serving(
        StubFetcher::new(),
        "dice",
        ZipFixture::new().file(MANIFEST, r#"{"id":"dice"}"#),
    );
    let records = [record("dice")];

    let first = sandbox.run(&fetcher, &records);
    assert_eq!(first.installed(), 1);
    fs::write(sandbox.root.join("dice/settings.json"), "user data").expect("write user file");

    let second = sandbox.run(&fetcher, &records);

    assert_eq!(second.already_installed(), 1);
    assert_eq!(fetcher.request_count(&download_url("dice")), 1);
    assert_eq!(
        fs::read_to_string(sandbox.root.join("dice/settings.json")).expect("read user file"),
        "user data"
    );
}

#[rstest]
#[case::traversal("../../../etc", "etc")]
#[case::separators("a/b\\c", "abc")]
#[case::spaces("my module", "mymodule")]
fn identifiers_are_sanitised_into_one_path_component(
    sandbox: Sandbox,
    #[case] raw: &str,
    #[case] expected: &str,
) {
    let fetcher = serving(StubFetcher::new(), raw, ZipFixture::new().file(MANIFEST, "{}"));

    let report = sandbox.run(&fetcher, &[record(raw)]);

    assert_eq!(report.installed(), 1);
    assert!(sandbox.root.join(expected).join(MANIFEST).is_file());
    let entries: Vec<_> = fs::read_dir(&sandbox.root).expect("read root").collect();
    assert_eq!(entries.len(), 1);
}

#[rstest]
fn empty_identifier_never_installs_into_the_root(sandbox: Sandbox) {
    let fetcher = serving(StubFetcher::new(), "..", ZipFixture::new().file(MANIFEST, "{}"));

    let report = sandbox.run(&fetcher, &[record("..")]);

    let (_, err) = report.failures().next().expect("one failure");
    assert!(matches!(err, RecordError::IdentifierInvalid { .. }));
    assert!(!sandbox.root.join(MANIFEST).exists());
    assert_eq!(fetcher.request_count(&download_url("..")), 0);
}

#[rstest]
fn wrapper_contents_are_lifted_with_hidden_files(sandbox: Sandbox) {
    let fetcher = serving(
        StubFetcher::new(),
        "dice",
        ZipFixture::new()
            .directory("dice-main/")
            .file("dice-main/module.json", "{}")
            .file("dice-main/.gitattributes", "* text=auto")
            .file("dice-main/styles/dice.css", ""),
    );

    let report = sandbox.run(&fetcher, &[record("dice")]);

    let outcome = report.records[0].result.as_ref().expect("installed");
    assert!(matches!(
        outcome,
        RecordOutcome::Installed { unwrapped: Some(wrapper), .. } if wrapper == "dice-main"
    ));
    let dir = sandbox.root.join("dice");
    assert!(dir.join(".gitattributes").is_file());
    assert!(dir.join("styles/dice.css").is_file());
    assert!(!dir.join("dice-main").exists());
    assert!(!dir.join(ARTEFACT_FILENAME).exists());
}

#[rstest]
fn ambiguous_layout_is_reported_and_left_in_place(sandbox: Sandbox) {
    let fetcher = serving(
        StubFetcher::new(),
        "split",
        ZipFixture::new()
            .file("one/module.json", "{}")
            .file("two/module.json", "{}"),
    );

    let report = sandbox.run(&fetcher, &[record("split")]);

    let (_, err) = report.failures().next().expect("one failure");
    assert!(matches!(err, RecordError::StructureAmbiguous { .. }));
    assert!(sandbox.root.join("split/one/module.json").is_file());
    assert!(sandbox.root.join("split/two/module.json").is_file());
}

#[rstest]
fn middle_failure_is_isolated(sandbox: Sandbox) {
    let archive = || ZipFixture::new().file(MANIFEST, "{}");
    let fetcher = serving(StubFetcher::new(), "first", archive());
    let fetcher = serving(fetcher, "second", archive()).failing(&download_url("second"));
    let fetcher = serving(fetcher, "third", archive());

    let report = sandbox.run(&fetcher, &[record("first"), record("second"), record("third")]);

    assert_eq!(report.installed(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.records[1].result,
        Err(RecordError::ArtefactDownload { .. })
    ));
    assert!(!sandbox.root.join("second").exists());
    let order: Vec<_> = fetcher
        .requests()
        .into_iter()
        .filter(|url| url.ends_with("module.json"))
        .collect();
    assert_eq!(
        order,
        vec![manifest_url("first"), manifest_url("second"), manifest_url("third")]
    );
}

#[rstest]
fn leftover_artefact_is_extracted_without_downloading(sandbox: Sandbox) {
    let dir = sandbox.root.join("dice");
    fs::create_dir_all(&dir).expect("create module dir");
    ZipFixture::new()
        .file(MANIFEST, "{}")
        .write_to(dir.join(ARTEFACT_FILENAME).as_std_path());
    let fetcher = StubFetcher::new().with_manifest(
        &manifest_url("dice"),
        &format!(r#"{{"id":"dice","download":"{}"}}"#, download_url("dice")),
    );

    let report = sandbox.run(&fetcher, &[record("dice")]);

    assert!(matches!(
        report.records[0].result,
        Ok(RecordOutcome::Installed {
            reused_artefact: true,
            ..
        })
    ));
    assert_eq!(fetcher.request_count(&download_url("dice")), 0);
    assert!(dir.join(MANIFEST).is_file());
    assert!(!dir.join(ARTEFACT_FILENAME).exists());
}
