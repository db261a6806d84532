//! Version compatibility rules for header lines.
//!
//! | Line | Rule |
//! |------|------|
//! | version line | must declare exactly the target version |
//! | `META`, `PEDIGREE` with ID | 4.3 and later |
//! | `PEDIGREE` without ID | before 4.3 |
//! | `ALT`, `SAMPLE` | 4.0 and later |
//! | `contig` | ID restricted to the 4.3 contig character set from 4.3 |
//! | `INFO`, `FORMAT` | Flag only in INFO with `Number=0`; ID restricted from 4.3 |
//! | `FILTER` | `Description` present |

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::core::line::{HeaderLine, ALT_KEY, META_KEY, PEDIGREE_KEY, SAMPLE_KEY};
use crate::core::types::{CompoundKind, HeaderOptions, LineCount, ValueType};
use crate::core::version::FormatVersion;
use crate::error::HeaderError;

static CONTIG_ID_REGEX: OnceLock<Regex> = OnceLock::new();
static COMPOUND_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn contig_id_regex() -> &'static Regex {
    CONTIG_ID_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9A-Za-z!#$%&+./:;?@^_|~-][0-9A-Za-z!#$%&*+./:;=?@^_|~-]*$").unwrap()
    })
}

fn compound_id_regex() -> &'static Regex {
    COMPOUND_ID_REGEX.get_or_init(|| Regex::new(r"^([A-Za-z_][0-9A-Za-z_.]*|1000G)$").unwrap())
}

/// Why a line is not valid at a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// The offending line, as written in a header
    pub line: String,
    pub version: FormatVersion,
    pub reason: String,
}

impl ValidationFailure {
    fn new(line: &HeaderLine, version: FormatVersion, reason: impl Into<String>) -> Self {
        Self {
            line: line.to_string(),
            version,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not valid for {}: {}", self.line, self.version, self.reason)
    }
}

impl From<ValidationFailure> for HeaderError {
    fn from(failure: ValidationFailure) -> Self {
        HeaderError::VersionIncompatible {
            line: failure.line,
            version: failure.version,
            reason: failure.reason,
        }
    }
}

/// Check whether `line` may appear in a header of `version`.
///
/// # Errors
///
/// Returns the [`ValidationFailure`] describing the first rule the line breaks.
pub fn validate_for_version(line: &HeaderLine, version: FormatVersion) -> Result<(), ValidationFailure> {
    let require = |minimum: FormatVersion| {
        if version.is_at_least(minimum) {
            Ok(())
        } else {
            Err(ValidationFailure::new(
                line,
                version,
                format!("{} lines require {minimum} or later", line.key()),
            ))
        }
    };

    match line {
        HeaderLine::Plain(plain) => {
            if line.is_version_line() {
                return match line.declared_version() {
                    Ok(Some(declared)) if declared == version => Ok(()),
                    Ok(_) | Err(_) => Err(ValidationFailure::new(
                        line,
                        version,
                        format!("version line declares {}", plain.value()),
                    )),
                };
            }
            if plain.key() == PEDIGREE_KEY && version.is_at_least(FormatVersion::Vcf4_3) {
                return Err(ValidationFailure::new(
                    line,
                    version,
                    "PEDIGREE lines require an ID",
                ));
            }
            Ok(())
        }
        HeaderLine::Structured(structured) => match structured.key() {
            META_KEY | PEDIGREE_KEY => require(FormatVersion::Vcf4_3),
            ALT_KEY | SAMPLE_KEY => require(FormatVersion::Vcf4_0),
            _ => Ok(()),
        },
        HeaderLine::Filter(filter) => {
            if filter.line().description().is_none() {
                return Err(ValidationFailure::new(line, version, "missing Description"));
            }
            Ok(())
        }
        HeaderLine::Contig(contig) => {
            if version.is_at_least(FormatVersion::Vcf4_3) && !contig_id_regex().is_match(contig.id())
            {
                return Err(ValidationFailure::new(
                    line,
                    version,
                    format!("contig ID '{}' contains reserved characters", contig.id()),
                ));
            }
            Ok(())
        }
        HeaderLine::Compound(compound) => {
            if compound.value_type() == ValueType::Flag {
                if compound.kind() == CompoundKind::Format {
                    return Err(ValidationFailure::new(
                        line,
                        version,
                        "FORMAT lines cannot have Type=Flag",
                    ));
                }
                if compound.count() != LineCount::Fixed(0) {
                    return Err(ValidationFailure::new(
                        line,
                        version,
                        "Flag lines must have Number=0",
                    ));
                }
            }
            if version.is_at_least(FormatVersion::Vcf4_3)
                && !compound_id_regex().is_match(compound.id())
            {
                return Err(ValidationFailure::new(
                    line,
                    version,
                    format!("ID '{}' is not a valid {} key", compound.id(), line.key()),
                ));
            }
            Ok(())
        }
    }
}

/// Validate every line, collecting all failures.
pub fn collect_failures<'a>(
    lines: impl IntoIterator<Item = &'a HeaderLine>,
    version: FormatVersion,
) -> Vec<ValidationFailure> {
    lines
        .into_iter()
        .filter_map(|line| validate_for_version(line, version).err())
        .collect()
}

/// Apply the configured stringency: the first failure is an error when
/// strict, otherwise each failure is logged.
///
/// # Errors
///
/// Returns `HeaderError::VersionIncompatible` for the first failure in strict mode.
pub fn enforce(failures: Vec<ValidationFailure>, options: HeaderOptions) -> Result<(), HeaderError> {
    if options.is_strict() {
        if let Some(first) = failures.into_iter().next() {
            return Err(first.into());
        }
        return Ok(());
    }

    for failure in failures {
        warn!(
            line = %failure.line,
            version = %failure.version,
            reason = %failure.reason,
            "Header line is not valid for this version"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::line::{CompoundLine, ContigLine, FilterLine, StructuredLine};

    const V40: FormatVersion = FormatVersion::Vcf4_0;
    const V42: FormatVersion = FormatVersion::Vcf4_2;
    const V43: FormatVersion = FormatVersion::Vcf4_3;

    #[test]
    fn test_version_line_identity() {
        let line = HeaderLine::version_line(V42);
        assert!(validate_for_version(&line, V42).is_ok());
        assert!(validate_for_version(&line, V43).is_err());
    }

    #[test]
    fn test_meta_and_pedigree_require_43() {
        let meta: HeaderLine = StructuredLine::parse("META", "<ID=Assay,Type=String>", V42)
            .unwrap()
            .into();
        assert!(validate_for_version(&meta, V42).is_err());
        assert!(validate_for_version(&meta, V43).is_ok());

        let pedigree: HeaderLine = StructuredLine::parse("PEDIGREE", "<ID=Child,Father=Dad>", V43)
            .unwrap()
            .into();
        assert!(validate_for_version(&pedigree, V42).is_err());
        assert!(validate_for_version(&pedigree, V43).is_ok());
    }

    #[test]
    fn test_plain_pedigree_only_before_43() {
        let line = HeaderLine::plain("PEDIGREE", "<Derived=D,Original=O>").unwrap();
        assert!(validate_for_version(&line, V42).is_ok());
        assert!(validate_for_version(&line, V43).is_err());
    }

    #[test]
    fn test_alt_and_sample_require_40() {
        let alt: HeaderLine = StructuredLine::with_description("ALT", "DEL", "Deletion")
            .unwrap()
            .into();
        assert!(validate_for_version(&alt, FormatVersion::Vcf3_3).is_err());
        assert!(validate_for_version(&alt, V40).is_ok());

        let sample: HeaderLine = StructuredLine::parse("SAMPLE", "<ID=S1,Genomes=Germline>", V40)
            .unwrap()
            .into();
        assert!(validate_for_version(&sample, FormatVersion::Vcf3_3).is_err());
        assert!(validate_for_version(&sample, V40).is_ok());
    }

    #[test]
    fn test_contig_id_characters() {
        let bad: HeaderLine = ContigLine::parse("<ID=*chr1,length=10>", V42, 0).unwrap().into();
        assert!(validate_for_version(&bad, V42).is_ok());
        assert!(validate_for_version(&bad, V43).is_err());

        let good: HeaderLine = ContigLine::parse("<ID=HLA-A*01:01,length=10>", V43, 0)
            .unwrap()
            .into();
        assert!(validate_for_version(&good, V43).is_ok());
    }

    #[test]
    fn test_format_flag_rejected_at_every_version() {
        let line: HeaderLine = CompoundLine::new(
            CompoundKind::Format,
            "FT",
            LineCount::Fixed(0),
            ValueType::Flag,
            "flag",
        )
        .unwrap()
        .into();
        for version in FormatVersion::ALL {
            assert!(validate_for_version(&line, version).is_err());
        }
    }

    #[test]
    fn test_compound_id_restricted_from_43() {
        let line: HeaderLine = CompoundLine::new(
            CompoundKind::Info,
            "1kg.AF",
            LineCount::PerAltAllele,
            ValueType::Float,
            "freq",
        )
        .unwrap()
        .into();
        assert!(validate_for_version(&line, V42).is_ok());
        assert!(validate_for_version(&line, V43).is_err());

        let thousand_genomes: HeaderLine = CompoundLine::new(
            CompoundKind::Info,
            "1000G",
            LineCount::Fixed(0),
            ValueType::Flag,
            "in 1000 Genomes",
        )
        .unwrap()
        .into();
        assert!(validate_for_version(&thousand_genomes, V43).is_ok());
    }

    #[test]
    fn test_filter_is_valid_everywhere() {
        let line: HeaderLine = FilterLine::new("q10", "Quality below 10").unwrap().into();
        for version in FormatVersion::ALL {
            assert!(validate_for_version(&line, version).is_ok());
        }
    }

    #[test]
    fn test_enforce_strict_and_lenient() {
        let line = HeaderLine::version_line(V42);
        let failures = collect_failures([&line], V43);
        assert_eq!(failures.len(), 1);

        assert!(matches!(
            enforce(failures.clone(), HeaderOptions::default()),
            Err(HeaderError::VersionIncompatible { .. })
        ));
        assert!(enforce(failures, HeaderOptions::lenient()).is_ok());
    }
}
