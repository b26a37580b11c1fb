//! Persisted profile format.
//!
//! A profile is a plain text file with one module per line:
//!
//! ```text
//! Module Title/Name: <display name>, Manifest URL: <manifest url>
//! ```
//!
//! Parsing is tolerant: lines that do not carry a parseable manifest URL are
//! reported back as [`SkippedLine`]s rather than failing the whole file.

use camino::Utf8Path;
use log::{debug, warn};
use std::fmt;
use std::io;

const NAME_PREFIX: &str = "Module Title/Name: ";
const URL_SEPARATOR: &str = ", Manifest URL: ";

/// One module entry in a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    display_name: String,
    manifest_url: String,
}

impl ProfileRecord {
    /// Create a record from a display name and a remote manifest URL.
    #[must_use]
    pub fn new(display_name: impl Into<String>, manifest_url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            manifest_url: manifest_url.into(),
        }
    }

    /// The human-facing module name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The URL of the module's remote manifest.
    #[must_use]
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }
}

impl fmt::Display for ProfileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.display_name, self.manifest_url)
    }
}

/// A profile line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// One-based line number in the profile.
    pub line_number: usize,
    /// The raw line content.
    pub content: String,
}

/// The result of parsing a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedProfile {
    /// Records in file order.
    pub records: Vec<ProfileRecord>,
    /// Non-blank lines that did not match the record pattern.
    pub skipped: Vec<SkippedLine>,
}

/// Parse profile text into records, skipping malformed lines.
///
/// # Examples
///
/// ```
/// use modsync_installer::profile::parse_profile;
///
/// let text = concat!(
///     "Module Title/Name: Dice, Fancy, Manifest URL: https://example.test/dice.json\n",
///     "garbage\n",
/// );
/// let parsed = parse_profile(text);
/// assert_eq!(parsed.records.len(), 1);
/// assert_eq!(parsed.records[0].display_name(), "Dice, Fancy");
/// assert_eq!(parsed.skipped.len(), 1);
/// ```
#[must_use]
pub fn parse_profile(text: &str) -> ParsedProfile {
    let mut parsed = ParsedProfile::default();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(record) => {
                debug!("profile line {line_number}: {record}");
                parsed.records.push(record);
            }
            None => {
                warn!("skipping profile line {line_number}: no parseable manifest URL");
                parsed.skipped.push(SkippedLine {
                    line_number,
                    content: line.to_owned(),
                });
            }
        }
    }

    parsed
}

/// Parse a single profile line.
///
/// The URL separator is searched from the right so display names that
/// contain commas survive intact.
#[must_use]
pub fn parse_line(line: &str) -> Option<ProfileRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    let rest = line.trim_start().strip_prefix(NAME_PREFIX)?;
    let split_at = rest.rfind(URL_SEPARATOR)?;
    let (name, url_part) = rest.split_at(split_at);
    let url = url_part.strip_prefix(URL_SEPARATOR)?.trim();

    if url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }

    Some(ProfileRecord::new(name.trim(), url))
}

/// Render a record as a single profile line, without a trailing newline.
///
/// Line breaks inside either field are flattened to spaces so that one
/// record always occupies exactly one line.
#[must_use]
pub fn format_record(record: &ProfileRecord) -> String {
    format!(
        "{NAME_PREFIX}{}{URL_SEPARATOR}{}",
        single_line(record.display_name()),
        single_line(record.manifest_url()),
    )
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Read and parse a profile from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read as UTF-8 text.
pub fn read_profile(path: &Utf8Path) -> io::Result<ParsedProfile> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_profile(&text))
}

/// Write records to disk as a profile, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_profile(path: &Utf8Path, records: &[ProfileRecord]) -> io::Result<()> {
    let mut text = String::new();
    for record in records {
        text.push_str(&format_record(record));
        text.push('\n');
    }
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::simple(
        "Module Title/Name: Dice So Nice, Manifest URL: https://x.test/dsn/module.json",
        "Dice So Nice",
        "https://x.test/dsn/module.json"
    )]
    #[case::comma_in_name(
        "Module Title/Name: Maps, Tokens, and More, Manifest URL: https://x.test/m.json",
        "Maps, Tokens, and More",
        "https://x.test/m.json"
    )]
    #[case::crlf(
        "Module Title/Name: A, Manifest URL: https://x.test/a.json\r",
        "A",
        "https://x.test/a.json"
    )]
    #[case::trailing_space(
        "Module Title/Name: A, Manifest URL: https://x.test/a.json   ",
        "A",
        "https://x.test/a.json"
    )]
    #[case::empty_name("Module Title/Name: , Manifest URL: https://x.test/a.json", "", "https://x.test/a.json")]
    fn parse_line_accepts_valid_records(
        #[case] line: &str,
        #[case] name: &str,
        #[case] url: &str,
    ) {
        let record = parse_line(line).expect("line should parse");
        assert_eq!(record.display_name(), name);
        assert_eq!(record.manifest_url(), url);
    }

    #[rstest]
    #[case::no_prefix("Dice, Manifest URL: https://x.test/a.json")]
    #[case::no_url("Module Title/Name: Dice")]
    #[case::empty_url("Module Title/Name: Dice, Manifest URL: ")]
    #[case::url_with_space("Module Title/Name: Dice, Manifest URL: not a url")]
    #[case::random("hello world")]
    fn parse_line_rejects_malformed_records(#[case] line: &str) {
        assert!(parse_line(line).is_none(), "expected None for {line:?}");
    }

    #[test]
    fn parse_profile_preserves_order_and_reports_skips() {
        let text = concat!(
            "Module Title/Name: One, Manifest URL: https://x.test/1.json\n",
            "\n",
            "not a record\n",
            "Module Title/Name: Two, Manifest URL: https://x.test/2.json\n",
        );
        let parsed = parse_profile(text);

        let names: Vec<&str> = parsed
            .records
            .iter()
            .map(ProfileRecord::display_name)
            .collect();
        assert_eq!(names, vec!["One", "Two"]);
        assert_eq!(
            parsed.skipped,
            vec![SkippedLine {
                line_number: 3,
                content: "not a record".to_owned(),
            }]
        );
    }

    #[test]
    fn format_record_flattens_line_breaks() {
        let record = ProfileRecord::new("Two\nLines", "https://x.test/a.json");
        let line = format_record(&record);
        assert!(!line.contains('\n'));
        let reparsed = parse_line(&line).expect("formatted line should parse");
        assert_eq!(reparsed.display_name(), "Two Lines");
    }

    #[test]
    fn profile_file_round_trips_through_disk() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = camino::Utf8PathBuf::try_from(temp.path().join("profile.txt")).expect("UTF-8");
        let records = vec![
            ProfileRecord::new("First", "https://x.test/1.json"),
            ProfileRecord::new("Second, With Comma", "https://x.test/2.json"),
        ];

        write_profile(&path, &records).expect("write");
        let parsed = read_profile(&path).expect("read");

        assert_eq!(parsed.records, records);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn read_profile_reports_missing_file() {
        let err = read_profile(Utf8Path::new("/nonexistent/profile.txt")).expect_err("missing");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
