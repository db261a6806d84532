use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::version::FormatVersion;
use crate::error::HeaderError;

/// Value of the `Number` attribute of an INFO or FORMAT line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCount {
    /// A fixed number of values per record
    Fixed(u32),
    /// One value per alternate allele (`A`)
    PerAltAllele,
    /// One value per allele including the reference (`R`)
    PerAllele,
    /// One value per possible genotype (`G`)
    PerGenotype,
    /// Unknown or varying number of values (`.`, or `-1` in VCF 3.x)
    Unbounded,
}

impl LineCount {
    /// Decode a `Number` value. Both unbounded tokens, `.` and the 3.x `-1`,
    /// are accepted whatever the header's version.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` for other negative counts and
    /// unrecognized tokens.
    pub fn decode(value: &str) -> Result<Self, HeaderError> {
        match value.trim() {
            "A" => Ok(LineCount::PerAltAllele),
            "R" => Ok(LineCount::PerAllele),
            "G" => Ok(LineCount::PerGenotype),
            "." | "-1" => Ok(LineCount::Unbounded),
            other => match other.parse::<i64>() {
                Ok(n) if n < 0 => Err(HeaderError::MalformedLine(format!(
                    "Number must not be negative: {other}"
                ))),
                Ok(n) => u32::try_from(n)
                    .map(LineCount::Fixed)
                    .map_err(|_| HeaderError::MalformedLine(format!("Number too large: {other}"))),
                Err(_) => Err(HeaderError::MalformedLine(format!(
                    "invalid Number value: {other}"
                ))),
            },
        }
    }

    /// Encode for a header of the given version.
    #[must_use]
    pub fn encode_for(self, version: FormatVersion) -> String {
        match self {
            LineCount::Unbounded if !version.uses_modern_grammar() => "-1".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for LineCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::PerAltAllele => write!(f, "A"),
            Self::PerAllele => write!(f, "R"),
            Self::PerGenotype => write!(f, "G"),
            Self::Unbounded => write!(f, "."),
        }
    }
}

/// Value of the `Type` attribute of an INFO or FORMAT line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    String,
    Character,
    Flag,
}

impl ValueType {
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` for unrecognized type names.
    pub fn parse(value: &str) -> Result<Self, HeaderError> {
        match value.trim() {
            "Integer" => Ok(ValueType::Integer),
            "Float" => Ok(ValueType::Float),
            "String" => Ok(ValueType::String),
            "Character" => Ok(ValueType::Character),
            "Flag" => Ok(ValueType::Flag),
            other => Err(HeaderError::MalformedLine(format!(
                "invalid Type value: {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Character => "Character",
            ValueType::Flag => "Flag",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two count/type line kinds a compound line is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundKind {
    Info,
    Format,
}

impl CompoundKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            CompoundKind::Info => "INFO",
            CompoundKind::Format => "FORMAT",
        }
    }
}

/// Fixed columns of the `#CHROM` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Chrom,
    Pos,
    Id,
    Ref,
    Alt,
    Qual,
    Filter,
    Info,
}

impl HeaderField {
    pub const ALL: [HeaderField; 8] = [
        HeaderField::Chrom,
        HeaderField::Pos,
        HeaderField::Id,
        HeaderField::Ref,
        HeaderField::Alt,
        HeaderField::Qual,
        HeaderField::Filter,
        HeaderField::Info,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HeaderField::Chrom => "CHROM",
            HeaderField::Pos => "POS",
            HeaderField::Id => "ID",
            HeaderField::Ref => "REF",
            HeaderField::Alt => "ALT",
            HeaderField::Qual => "QUAL",
            HeaderField::Filter => "FILTER",
            HeaderField::Info => "INFO",
        }
    }
}

/// How version-compatibility failures are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStringency {
    /// Any failure is an error
    #[default]
    Strict,
    /// Failures are logged as warnings and the line is kept
    Lenient,
}

/// Caller-supplied configuration for building and mutating a header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderOptions {
    /// Treatment of lines that are not valid for the header's version
    pub stringency: ValidationStringency,
}

impl HeaderOptions {
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            stringency: ValidationStringency::Lenient,
        }
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.stringency == ValidationStringency::Strict
    }
}

/// Whether a header should be moved to the newest version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionUpgradePolicy {
    /// Keep the header at its own version
    #[default]
    DoNotUpgrade,
    /// Upgrade when every line is valid at the newest version, otherwise keep
    UpgradeOrFallback,
    /// Upgrade, failing if any line is not valid at the newest version
    UpgradeOrFail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_decode() {
        assert_eq!(LineCount::decode("1").unwrap(), LineCount::Fixed(1));
        assert_eq!(LineCount::decode("A").unwrap(), LineCount::PerAltAllele);
        assert_eq!(LineCount::decode("R").unwrap(), LineCount::PerAllele);
        assert_eq!(LineCount::decode("G").unwrap(), LineCount::PerGenotype);
        assert_eq!(LineCount::decode(".").unwrap(), LineCount::Unbounded);
        assert!(LineCount::decode("-2").is_err());
        assert!(LineCount::decode("X").is_err());
    }

    #[test]
    fn test_unbounded_translation() {
        assert_eq!(LineCount::decode("-1").unwrap(), LineCount::Unbounded);
        assert_eq!(LineCount::Unbounded.encode_for(FormatVersion::Vcf3_3), "-1");
        assert_eq!(LineCount::Unbounded.encode_for(FormatVersion::Vcf4_2), ".");
        assert_eq!(LineCount::Fixed(2).encode_for(FormatVersion::Vcf3_3), "2");
    }

    #[test]
    fn test_value_type_names() {
        for t in [
            ValueType::Integer,
            ValueType::Float,
            ValueType::String,
            ValueType::Character,
            ValueType::Flag,
        ] {
            assert_eq!(ValueType::parse(t.as_str()).unwrap(), t);
        }
        assert!(ValueType::parse("integer").is_err());
    }

    #[test]
    fn test_default_options_are_strict() {
        assert!(HeaderOptions::default().is_strict());
        assert!(!HeaderOptions::lenient().is_strict());
    }
}
