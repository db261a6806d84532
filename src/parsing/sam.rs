//! Sequence dictionaries from SAM/BAM/CRAM headers.

use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::core::contig::{SequenceDictionary, SequenceRecord};
use crate::error::HeaderError;
use crate::utils::validation::{check_contig_limit, normalize_md5};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many contigs: {0} exceeds maximum allowed (100000)")]
    TooManyContigs(usize),

    #[error(transparent)]
    Header(#[from] HeaderError),
}

/// Parse a SAM/BAM/CRAM file and extract its sequence dictionary
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::UnsupportedFormat` for unknown extensions,
/// `ParseError::InvalidFormat` if no contigs are found, or
/// `ParseError::TooManyContigs` if the limit is exceeded.
pub fn parse_file(path: &Path) -> Result<SequenceDictionary, ParseError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("sam") => parse_sam_file(path),
        Some("bam") => parse_bam_file(path),
        Some("cram") => parse_cram_file(path),
        Some(ext) => Err(ParseError::UnsupportedFormat(ext.to_string())),
        None => parse_sam_file(path),
    }
}

fn parse_sam_file(path: &Path) -> Result<SequenceDictionary, ParseError> {
    use noodles::sam;

    let mut reader = std::fs::File::open(path)
        .map(BufReader::new)
        .map(sam::io::Reader::new)?;

    let header = reader
        .read_header()
        .map_err(|e| ParseError::Noodles(e.to_string()))?;

    header_to_dictionary(&header)
}

fn parse_bam_file(path: &Path) -> Result<SequenceDictionary, ParseError> {
    use noodles::bam;

    let mut reader = std::fs::File::open(path).map(bam::io::Reader::new)?;

    let header = reader
        .read_header()
        .map_err(|e| ParseError::Noodles(e.to_string()))?;

    header_to_dictionary(&header)
}

fn parse_cram_file(path: &Path) -> Result<SequenceDictionary, ParseError> {
    use noodles::cram;

    let mut reader = std::fs::File::open(path).map(cram::io::Reader::new)?;

    reader
        .read_file_definition()
        .map_err(|e| ParseError::Noodles(e.to_string()))?;

    let header = reader
        .read_file_header()
        .map_err(|e| ParseError::Noodles(e.to_string()))?;

    header_to_dictionary(&header)
}

type ReferenceSequenceMap = noodles::sam::header::record::value::Map<
    noodles::sam::header::record::value::map::ReferenceSequence,
>;

/// Value of a non-standard tag such as M5 or AS
fn other_field(map: &ReferenceSequenceMap, tag: [u8; 2]) -> Option<String> {
    use noodles::sam::header::record::value::map::tag::Other;

    let tag = Other::try_from(tag).ok()?;
    map.other_fields().get(&tag).map(ToString::to_string)
}

/// Convert the reference sequences of a noodles header
fn header_to_dictionary(header: &noodles::sam::Header) -> Result<SequenceDictionary, ParseError> {
    let mut dictionary = SequenceDictionary::default();

    for (name, map) in header.reference_sequences() {
        if check_contig_limit(dictionary.len()).is_some() {
            return Err(ParseError::TooManyContigs(dictionary.len()));
        }

        let mut record = SequenceRecord::new(name.to_string(), map.length().get() as u64);
        record.md5 = other_field(map, *b"M5").and_then(|raw| checked_md5(&record.name, &raw));
        record.assembly = other_field(map, *b"AS");
        record.uri = other_field(map, *b"UR");
        record.species = other_field(map, *b"SP");

        dictionary.push(record);
    }

    if dictionary.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No @SQ lines found in header".to_string(),
        ));
    }

    Ok(dictionary)
}

fn checked_md5(contig: &str, raw: &str) -> Option<String> {
    let normalized = normalize_md5(raw);
    if normalized.is_none() {
        warn!(contig = %contig, md5 = %raw, "Invalid MD5 checksum format, ignoring");
    }
    normalized
}

/// Parse `@SQ` lines from raw SAM header text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if no contigs are found, or
/// `ParseError::TooManyContigs` if the limit is exceeded.
pub fn parse_header_text(text: &str) -> Result<SequenceDictionary, ParseError> {
    let mut dictionary = SequenceDictionary::default();

    for line in text.lines() {
        if !line.starts_with("@SQ") {
            continue;
        }

        let mut name: Option<&str> = None;
        let mut length: Option<u64> = None;
        let mut md5_raw: Option<&str> = None;
        let mut assembly: Option<&str> = None;
        let mut uri: Option<&str> = None;
        let mut species: Option<&str> = None;

        for field in line.split('\t').skip(1) {
            if let Some((tag, value)) = field.split_once(':') {
                match tag {
                    "SN" => name = Some(value),
                    "LN" => length = value.parse().ok(),
                    "M5" => md5_raw = Some(value),
                    "AS" => assembly = Some(value),
                    "UR" => uri = Some(value),
                    "SP" => species = Some(value),
                    _ => {}
                }
            }
        }

        let (Some(name), Some(length)) = (name, length) else {
            warn!(line = %line, "Skipping @SQ line without SN and LN");
            continue;
        };

        if check_contig_limit(dictionary.len()).is_some() {
            return Err(ParseError::TooManyContigs(dictionary.len()));
        }

        let mut record = SequenceRecord::new(name, length);
        record.md5 = md5_raw.and_then(|raw| checked_md5(name, raw));
        record.assembly = assembly.map(str::to_string);
        record.uri = uri.map(str::to_string);
        record.species = species.map(str::to_string);
        dictionary.push(record);
    }

    if dictionary.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No @SQ lines found in header".to_string(),
        ));
    }

    Ok(dictionary)
}
