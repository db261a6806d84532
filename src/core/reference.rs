//! Rewriting a header's contigs from a reference sequence dictionary.

use std::path::Path;

use crate::core::contig::SequenceDictionary;
use crate::core::header::Header;
use crate::core::line::HeaderLine;
use crate::error::HeaderError;

/// Key of the line naming the reference the calls were made against.
pub const REFERENCE_KEY: &str = "reference";

/// Guess the assembly name from a reference file name.
///
/// | File name contains | Assembly |
/// |--------------------|----------|
/// | `b37`, `v37` | `b37` |
/// | `b36` | `b36` |
/// | `hg18` | `hg18` |
/// | `hg19` | `hg19` |
/// | `hg38` | `hg38` |
#[must_use]
pub fn guess_assembly(file_name: &str) -> Option<&'static str> {
    const PATTERNS: [(&str, &str); 6] = [
        ("b37", "b37"),
        ("v37", "b37"),
        ("b36", "b36"),
        ("hg18", "hg18"),
        ("hg19", "hg19"),
        ("hg38", "hg38"),
    ];
    PATTERNS
        .iter()
        .find(|(pattern, _)| file_name.contains(pattern))
        .map(|(_, assembly)| *assembly)
}

/// The `##reference` value for a reference file: its `file://` URL, or
/// with `name_only`, the file name without its extension.
#[must_use]
pub fn reference_value(reference: &Path, name_only: bool) -> String {
    if name_only {
        return reference
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    let absolute = if reference.is_absolute() {
        reference.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(reference))
            .unwrap_or_else(|_| reference.to_path_buf())
    };
    format!("file://{}", absolute.display())
}

/// Copy `header` with its contig lines replaced by `dictionary`.
///
/// With a `reference`, contig lines carry the assembly guessed from the
/// reference file name and the `##reference` line is replaced.
///
/// # Errors
///
/// Returns `HeaderError::VersionIncompatible` (strict only) if a contig name is
/// not valid at the header's version.
pub fn with_updated_contigs(
    header: &Header,
    dictionary: &SequenceDictionary,
    reference: Option<&Path>,
    reference_name_only: bool,
) -> Result<Header, HeaderError> {
    let mut updated = header.clone();

    let assembly = reference
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .and_then(guess_assembly);
    updated.replace_contigs(dictionary, assembly)?;

    if let Some(reference) = reference {
        let line = HeaderLine::plain(REFERENCE_KEY, reference_value(reference, reference_name_only))?;
        updated.add_other_line_unique(line)?;
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::SequenceRecord;
    use crate::core::line::ContigLine;
    use crate::core::version::FormatVersion;

    const V42: FormatVersion = FormatVersion::Vcf4_2;

    #[test]
    fn test_guess_assembly() {
        assert_eq!(guess_assembly("human_g1k_v37.fasta"), Some("b37"));
        assert_eq!(guess_assembly("Homo_sapiens_assembly19_b37.fa"), Some("b37"));
        assert_eq!(guess_assembly("ucsc.hg19.fasta"), Some("hg19"));
        assert_eq!(guess_assembly("hg38.fa"), Some("hg38"));
        assert_eq!(guess_assembly("mouse.fa"), None);
    }

    #[test]
    fn test_reference_value() {
        assert_eq!(reference_value(Path::new("/refs/hg19.fasta"), true), "hg19");
        assert_eq!(
            reference_value(Path::new("/refs/hg19.fasta"), false),
            "file:///refs/hg19.fasta"
        );
    }

    #[test]
    fn test_with_updated_contigs() {
        let lines = vec![
            HeaderLine::version_line(V42),
            ContigLine::parse("<ID=old,length=5>", V42, 0).unwrap().into(),
            HeaderLine::plain(REFERENCE_KEY, "file:///old.fa").unwrap(),
        ];
        let header = Header::new(lines, vec![]).unwrap();
        let dict = SequenceDictionary::new(vec![
            SequenceRecord::new("chr1", 100),
            SequenceRecord::new("chr2", 200),
        ]);

        let updated =
            with_updated_contigs(&header, &dict, Some(Path::new("/refs/ucsc.hg19.fasta")), true)
                .unwrap();

        let contigs = updated.contig_lines();
        assert_eq!(contigs.len(), 2);
        assert_eq!(contigs[0].line().attribute("assembly"), Some("hg19"));
        assert_eq!(
            updated.other_line_unique(REFERENCE_KEY).unwrap().unwrap().to_string(),
            "##reference=ucsc.hg19"
        );
        assert_eq!(header.contig_lines()[0].id(), "old");
    }
}
