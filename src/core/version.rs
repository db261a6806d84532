//! VCF format versions and their ordering.
//!
//! Versions are ordered through an explicit rank table rather than declaration
//! order, so comparisons (`<`, `>=`, [`FormatVersion::is_at_least`]) are stable
//! no matter how the variants are listed.
//!
//! | Version | Version line | Grammar |
//! |---------|--------------|---------|
//! | 3.2 | `##format=VCFv3.2` | legacy |
//! | 3.3 | `##fileformat=VCFv3.3` | legacy |
//! | 4.0 - 4.3 | `##fileformat=VCFv4.x` | modern |

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::HeaderError;

/// Version line key for VCF 3.3 and later.
pub const FILE_FORMAT_KEY: &str = "fileformat";

/// Version line key used by VCF 3.2.
pub const LEGACY_FORMAT_KEY: &str = "format";

/// A recognized VCF format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    Vcf3_2,
    Vcf3_3,
    Vcf4_0,
    Vcf4_1,
    Vcf4_2,
    Vcf4_3,
}

impl FormatVersion {
    /// Every recognized version, oldest first.
    pub const ALL: [FormatVersion; 6] = [
        FormatVersion::Vcf3_2,
        FormatVersion::Vcf3_3,
        FormatVersion::Vcf4_0,
        FormatVersion::Vcf4_1,
        FormatVersion::Vcf4_2,
        FormatVersion::Vcf4_3,
    ];

    /// The version used when a header is created without one.
    pub const DEFAULT: FormatVersion = FormatVersion::Vcf4_3;

    /// Position in the total order of versions.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            FormatVersion::Vcf3_2 => 0,
            FormatVersion::Vcf3_3 => 1,
            FormatVersion::Vcf4_0 => 2,
            FormatVersion::Vcf4_1 => 3,
            FormatVersion::Vcf4_2 => 4,
            FormatVersion::Vcf4_3 => 5,
        }
    }

    /// The version string as written in the version line (e.g. `VCFv4.2`).
    #[must_use]
    pub const fn version_string(self) -> &'static str {
        match self {
            FormatVersion::Vcf3_2 => "VCFv3.2",
            FormatVersion::Vcf3_3 => "VCFv3.3",
            FormatVersion::Vcf4_0 => "VCFv4.0",
            FormatVersion::Vcf4_1 => "VCFv4.1",
            FormatVersion::Vcf4_2 => "VCFv4.2",
            FormatVersion::Vcf4_3 => "VCFv4.3",
        }
    }

    /// The key of this version's version line.
    #[must_use]
    pub const fn format_key(self) -> &'static str {
        match self {
            FormatVersion::Vcf3_2 => LEGACY_FORMAT_KEY,
            _ => FILE_FORMAT_KEY,
        }
    }

    /// The full version line, including the leading `##`.
    #[must_use]
    pub fn header_line(self) -> String {
        format!("##{}={}", self.format_key(), self.version_string())
    }

    #[must_use]
    pub fn is_at_least(self, other: FormatVersion) -> bool {
        self >= other
    }

    /// Whether tag lists use the `<TAG=value,...>` grammar (4.0 and later).
    #[must_use]
    pub fn uses_modern_grammar(self) -> bool {
        self.is_at_least(FormatVersion::Vcf4_0)
    }

    /// Whether `key=value` is a version line.
    ///
    /// `fileformat` always is. The legacy `format` key only declares 3.2;
    /// anywhere else it is an ordinary metadata line.
    #[must_use]
    pub fn is_version_line(key: &str, value: &str) -> bool {
        key == FILE_FORMAT_KEY
            || (key == LEGACY_FORMAT_KEY
                && Self::from_version_string(value)
                    .is_ok_and(|version| version.format_key() == LEGACY_FORMAT_KEY))
    }

    /// Resolve a version string such as `VCFv4.2`.
    ///
    /// The historical `VCRv3.2` spelling is accepted as an alias for 3.2.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::UnknownVersion` for unrecognized strings.
    pub fn from_version_string(value: &str) -> Result<Self, HeaderError> {
        let value = value.trim();
        if value == "VCRv3.2" {
            return Ok(FormatVersion::Vcf3_2);
        }
        FormatVersion::ALL
            .into_iter()
            .find(|v| v.version_string() == value)
            .ok_or_else(|| HeaderError::UnknownVersion(value.to_string()))
    }

    /// Resolve a full version line such as `##fileformat=VCFv4.2`.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` if the text is not a version line,
    /// or `HeaderError::UnknownVersion` if the version is not recognized.
    pub fn from_header_line(line: &str) -> Result<Self, HeaderError> {
        let body = line.trim().trim_start_matches('#');
        let (key, value) = body
            .split_once('=')
            .ok_or_else(|| HeaderError::MalformedLine(format!("not a version line: {line}")))?;
        if !Self::is_version_line(key, value) {
            return Err(HeaderError::MalformedLine(format!(
                "not a version line: {line}"
            )));
        }
        Self::from_version_string(value)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        FormatVersion::DEFAULT
    }
}

impl PartialOrd for FormatVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FormatVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version_string())
    }
}

impl FromStr for FormatVersion {
    type Err = HeaderError;

    /// Accepts `VCFv4.2` as well as the short form `4.2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with(|c: char| c.is_ascii_digit()) {
            Self::from_version_string(&format!("VCFv{s}"))
        } else {
            Self::from_version_string(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_rank() {
        for pair in FormatVersion::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
        assert!(FormatVersion::Vcf4_3.is_at_least(FormatVersion::Vcf4_2));
        assert!(FormatVersion::Vcf4_2.is_at_least(FormatVersion::Vcf4_2));
        assert!(!FormatVersion::Vcf4_1.is_at_least(FormatVersion::Vcf4_2));
    }

    #[test]
    fn test_format_keys() {
        assert_eq!(FormatVersion::Vcf3_2.format_key(), "format");
        assert_eq!(FormatVersion::Vcf3_3.format_key(), "fileformat");
        assert_eq!(FormatVersion::Vcf4_3.format_key(), "fileformat");
        assert!(FormatVersion::is_version_line("format", "VCFv3.2"));
        assert!(FormatVersion::is_version_line("fileformat", "VCFv4.2"));
        assert!(!FormatVersion::is_version_line("format", "VCFv4.2"));
        assert!(!FormatVersion::is_version_line("source", "VCFv4.2"));
    }

    #[test]
    fn test_header_line_round_trip() {
        for version in FormatVersion::ALL {
            let line = version.header_line();
            assert_eq!(FormatVersion::from_header_line(&line).unwrap(), version);
        }
    }

    #[test]
    fn test_legacy_alias() {
        assert_eq!(
            FormatVersion::from_header_line("##format=VCRv3.2").unwrap(),
            FormatVersion::Vcf3_2
        );
    }

    #[test]
    fn test_unknown_version() {
        assert!(matches!(
            FormatVersion::from_version_string("VCFv5.0"),
            Err(HeaderError::UnknownVersion(_))
        ));
        assert!(matches!(
            FormatVersion::from_header_line("##source=VCFv4.2"),
            Err(HeaderError::MalformedLine(_))
        ));
        assert!(matches!(
            FormatVersion::from_header_line("##format=VCFv4.2"),
            Err(HeaderError::MalformedLine(_))
        ));
    }

    #[test]
    fn test_from_str_short_form() {
        assert_eq!("4.1".parse::<FormatVersion>().unwrap(), FormatVersion::Vcf4_1);
        assert_eq!(
            "VCFv4.3".parse::<FormatVersion>().unwrap(),
            FormatVersion::Vcf4_3
        );
    }

    #[test]
    fn test_grammar_selection() {
        assert!(!FormatVersion::Vcf3_3.uses_modern_grammar());
        assert!(FormatVersion::Vcf4_0.uses_modern_grammar());
        assert_eq!(FormatVersion::default(), FormatVersion::Vcf4_3);
    }
}
