//! Error types for header parsing, validation, and merging.

use thiserror::Error;

use crate::core::version::FormatVersion;

/// Errors raised while building, mutating, or merging VCF headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Grammar violation in a tag list or metadata line.
    #[error("Malformed header line: {0}")]
    MalformedLine(String),

    #[error("Missing required attribute '{attribute}' in {key} header line")]
    MissingRequiredAttribute { key: String, attribute: String },

    /// A line's construct is not permitted at the target version.
    #[error("Header line '{line}' is not valid for {version}: {reason}")]
    VersionIncompatible {
        line: String,
        version: FormatVersion,
        reason: String,
    },

    #[error("Header already contains a version line; cannot add '{0}'")]
    DuplicateVersionLine(String),

    #[error("Cannot move header version backwards from {current} to {requested}")]
    VersionRegression {
        current: FormatVersion,
        requested: FormatVersion,
    },

    #[error("Incompatible headers: {0}")]
    IncompatibleHeaders(String),

    #[error("Duplicate sample name: {0}")]
    DuplicateSampleName(String),

    #[error("Header has no ##fileformat version line")]
    MissingVersionLine,

    #[error("Unknown VCF version: {0}")]
    UnknownVersion(String),

    #[error("Contig index {index} is used by both '{existing}' and '{added}'")]
    DuplicateContigIndex {
        index: usize,
        existing: String,
        added: String,
    },
}

impl HeaderError {
    pub(crate) fn missing(key: &str, attribute: &str) -> Self {
        HeaderError::MissingRequiredAttribute {
            key: key.to_string(),
            attribute: attribute.to_string(),
        }
    }
}
