//! Sanitised module identifiers.
//!
//! A [`ModuleIdentifier`] is the only value derived from remote, untrusted
//! data that ever becomes a filesystem path component. It can only be built
//! through [`ModuleIdentifier::sanitise`], which strips every character
//! outside `[A-Za-z0-9_-]` and rejects an empty result.

use std::fmt;

/// A module identifier safe to use as a single directory name.
///
/// # Examples
///
/// ```
/// use modsync_installer::identifier::ModuleIdentifier;
///
/// let id = ModuleIdentifier::sanitise("../../etc/dice so nice!").expect("non-empty");
/// assert_eq!(id.as_str(), "etcdicesonice");
///
/// assert!(ModuleIdentifier::sanitise("../..").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentifier(String);

impl ModuleIdentifier {
    /// Build an identifier from a raw string, dropping disallowed characters.
    ///
    /// Returns `None` when nothing survives sanitisation.
    #[must_use]
    pub fn sanitise(raw: &str) -> Option<Self> {
        let cleaned: String = raw.chars().filter(|c| is_allowed(*c)).collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

const fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl AsRef<str> for ModuleIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("dice-so-nice", "dice-so-nice")]
    #[case::underscores("lib_wrapper", "lib_wrapper")]
    #[case::spaces_and_punctuation("Token Action HUD!", "TokenActionHUD")]
    #[case::traversal("../../../tmp/evil", "tmpevil")]
    #[case::dots("module.v2", "modulev2")]
    #[case::unicode("café-ünïcode", "caf-ncode")]
    #[case::windows_separators("..\\..\\win", "win")]
    fn sanitise_keeps_only_allowed_characters(#[case] raw: &str, #[case] expected: &str) {
        let id = ModuleIdentifier::sanitise(raw).expect("identifier should survive");
        assert_eq!(id.as_str(), expected);
        assert!(id.as_str().chars().all(is_allowed));
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_dots("..")]
    #[case::only_slashes("///")]
    #[case::whitespace("   \t")]
    #[case::non_ascii("ééé")]
    fn sanitise_rejects_values_that_become_empty(#[case] raw: &str) {
        assert!(ModuleIdentifier::sanitise(raw).is_none());
    }

    #[test]
    fn display_matches_inner_value() {
        let id = ModuleIdentifier::sanitise("pf2e").expect("valid");
        assert_eq!(id.to_string(), "pf2e");
        assert_eq!(id.into_inner(), "pf2e");
    }
}
