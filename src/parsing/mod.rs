//! Readers for VCF header text and for sequence dictionaries.
//!
//! - **Tag lists**: [`tokenizer`] turns `<ID=...,Key=value>` values into ordered attributes
//! - **VCF headers**: [`vcf`] reads `.vcf`/`.vcf.gz` headers and writes header text
//! - **SAM/BAM/CRAM files and Picard .dict files**: [`sam`] extracts `@SQ` lines as a sequence dictionary
//!
//! ## Example
//!
//! ```rust,no_run
//! use vcf_header::parsing::vcf::{format_header, read_header};
//! use vcf_header::HeaderOptions;
//! use std::path::Path;
//!
//! let header = read_header(Path::new("calls.vcf.gz"), HeaderOptions::default()).unwrap();
//! println!("{} samples", header.sample_count());
//! print!("{}", format_header(&header).unwrap());
//! ```
//!
//! ## Dictionary sources
//!
//! | Extension | Source |
//! |-----------|--------|
//! | `.dict` | Picard sequence dictionary |
//! | `.sam`, `.bam`, `.cram` | `@SQ` lines of the alignment header |
//! | `.vcf`, `.vcf.gz` | `##contig` lines of the VCF header |

use std::path::Path;

use crate::core::contig::SequenceDictionary;
use crate::core::types::HeaderOptions;
use crate::parsing::sam::ParseError;

pub mod sam;
pub mod tokenizer;
pub mod vcf;

/// Read a sequence dictionary from any supported source, chosen by extension.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a VCF header has no contig lines,
/// or any error of the underlying reader.
pub fn read_sequence_dictionary(path: &Path) -> Result<SequenceDictionary, ParseError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if name.ends_with(".dict") {
        // A .dict file is a SAM header with only @HD and @SQ lines
        sam::parse_header_text(&std::fs::read_to_string(path)?)
    } else if [".vcf", ".vcf.gz", ".vcf.bgz"]
        .iter()
        .any(|ext| name.ends_with(ext))
    {
        vcf::read_header(path, HeaderOptions::lenient())?
            .sequence_dictionary()?
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "No ##contig lines found in {}",
                    path.display()
                ))
            })
    } else {
        sam::parse_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_from_vcf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.vcf");
        std::fs::write(
            &path,
            "##fileformat=VCFv4.2\n##contig=<ID=chr1,length=100>\n##contig=<ID=chr2,length=200>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
        )
        .unwrap();

        let dict = read_sequence_dictionary(&path).unwrap();
        assert_eq!(dict.names().collect::<Vec<_>>(), vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_dictionary_from_dict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.dict");
        std::fs::write(
            &path,
            "@HD\tVN:1.6\n@SQ\tSN:1\tLN:500\tUR:file:///reference/b37.fa\n@SQ\tSN:2\tLN:400\n",
        )
        .unwrap();

        let dict = read_sequence_dictionary(&path).unwrap();
        assert_eq!(dict.names().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(dict.get("1").unwrap().length, 500);
        assert_eq!(
            dict.get("1").unwrap().uri.as_deref(),
            Some("file:///reference/b37.fa")
        );
    }

    #[test]
    fn test_vcf_without_contigs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.vcf");
        std::fs::write(
            &path,
            "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
        )
        .unwrap();
        assert!(matches!(
            read_sequence_dictionary(&path),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
