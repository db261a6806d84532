//! Reader and writer for VCF header text.
//!
//! A header is a run of `##` metadata lines, starting with the version line,
//! followed by the tab-delimited `#CHROM` column line:
//!
//! ```text
//! ##fileformat=VCFv4.2
//! ##contig=<ID=chr1,length=248956422>
//! ##INFO=<ID=DP,Number=1,Type=Integer,Description="Total depth">
//! #CHROM	POS	ID	REF	ALT	QUAL	FILTER	INFO	FORMAT	sample1
//! ```
//!
//! Plain `.vcf` and bgzip/gzip-compressed `.vcf.gz` files are supported; only
//! the header is read. Lines are written back in the grammar of the header's
//! version.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::warn;

use crate::core::header::Header;
use crate::core::line::{
    CompoundLine, ContigLine, FilterLine, HeaderLine, PlainLine, StructuredLine, ALT_KEY,
    CONTIG_KEY, FILTER_KEY, META_KEY, PEDIGREE_KEY, SAMPLE_KEY,
};
use crate::core::types::{CompoundKind, HeaderField, HeaderOptions};
use crate::core::version::FormatVersion;
use crate::error::HeaderError;
use crate::parsing::sam::ParseError;
use crate::utils::validation::{check_contig_limit, MAX_HEADER_LINES};

/// Read the header of a `.vcf` or `.vcf.gz` file; `-` reads from stdin.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or any error of
/// [`parse_header_text`].
pub fn read_header(path: &Path, options: HeaderOptions) -> Result<Header, ParseError> {
    let reader: Box<dyn Read> = if path.as_os_str() == "-" {
        Box::new(io::stdin())
    } else if is_gzipped(path) {
        Box::new(MultiGzDecoder::new(File::open(path)?))
    } else {
        Box::new(File::open(path)?)
    };

    let text = read_header_text(BufReader::new(reader))?;
    parse_header_text(&text, options)
}

fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
}

/// Collect header lines up to and including the `#CHROM` line.
fn read_header_text<R: BufRead>(reader: R) -> Result<String, ParseError> {
    let mut text = String::new();
    for line in reader.lines() {
        let line = line?;
        let is_column_line = line.starts_with("#CHROM");
        if !line.starts_with('#') {
            break;
        }
        text.push_str(&line);
        text.push('\n');
        if is_column_line {
            break;
        }
    }
    Ok(text)
}

/// Parse header text: the version line, metadata lines, and the `#CHROM` line.
///
/// Lines after the `#CHROM` line are ignored.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for a missing version or `#CHROM` line
/// or an invalid column line, `ParseError::TooManyContigs` past the contig
/// limit, and `ParseError::Header` for line-level and header-level errors.
pub fn parse_header_text(text: &str, options: HeaderOptions) -> Result<Header, ParseError> {
    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());

    let first = lines
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("empty VCF header".to_string()))?;
    let version = FormatVersion::from_header_line(first).map_err(|e| {
        ParseError::InvalidFormat(format!("first line must declare the VCF version: {e}"))
    })?;

    let mut header_lines = vec![HeaderLine::version_line(version)];
    let mut contig_index = 0;
    let mut samples = None;

    for line in lines {
        if let Some(meta) = line.strip_prefix("##") {
            if header_lines.len() >= MAX_HEADER_LINES {
                return Err(ParseError::InvalidFormat(format!(
                    "header has more than {MAX_HEADER_LINES} lines"
                )));
            }
            if !meta.contains('=') {
                if options.is_strict() {
                    return Err(HeaderError::MalformedLine(format!(
                        "metadata line has no '=': {line}"
                    ))
                    .into());
                }
                warn!(line = %line, "Dropping metadata line without '='");
                continue;
            }

            let parsed = parse_metadata_line(meta, version, contig_index)?;
            if parsed.as_contig().is_some() {
                if check_contig_limit(contig_index).is_some() {
                    return Err(ParseError::TooManyContigs(contig_index));
                }
                contig_index += 1;
            }
            header_lines.push(parsed);
        } else if line.starts_with("#CHROM") {
            samples = Some(parse_column_line(line)?);
            break;
        } else {
            return Err(ParseError::InvalidFormat(format!(
                "unexpected line before #CHROM: {line}"
            )));
        }
    }

    let samples =
        samples.ok_or_else(|| ParseError::InvalidFormat("missing #CHROM line".to_string()))?;
    Ok(Header::with_options(header_lines, samples, options)?)
}

/// Parse one metadata line, given without its leading `##`.
///
/// `contig_index` is the index assigned if the line is a contig line.
///
/// # Errors
///
/// Returns `HeaderError::MalformedLine` or `HeaderError::MissingRequiredAttribute`
/// when the line cannot be built.
pub fn parse_metadata_line(
    line: &str,
    version: FormatVersion,
    contig_index: usize,
) -> Result<HeaderLine, HeaderError> {
    let (key, value) = line
        .split_once('=')
        .ok_or_else(|| HeaderError::MalformedLine(format!("metadata line has no '=': {line}")))?;

    let parsed: HeaderLine = match key {
        "INFO" => CompoundLine::parse(CompoundKind::Info, value, version)?.into(),
        "FORMAT" => CompoundLine::parse(CompoundKind::Format, value, version)?.into(),
        FILTER_KEY => FilterLine::parse(value, version)?.into(),
        CONTIG_KEY => ContigLine::parse(value, version, contig_index)?.into(),
        PEDIGREE_KEY if !version.is_at_least(FormatVersion::Vcf4_3) => {
            PlainLine::new(key, value)?.into()
        }
        ALT_KEY | META_KEY | SAMPLE_KEY | PEDIGREE_KEY => {
            StructuredLine::parse(key, value, version)?.into()
        }
        _ if is_structured_value(value, version) => {
            StructuredLine::parse(key, value, version)?.into()
        }
        _ => PlainLine::new(key, value)?.into(),
    };
    Ok(parsed)
}

/// Whether an unrecognized line's value is a `<...>` tag list.
fn is_structured_value(value: &str, version: FormatVersion) -> bool {
    let value = value.trim();
    if !(value.starts_with('<') && value.ends_with('>')) {
        return false;
    }
    version.is_at_least(FormatVersion::Vcf4_3)
        || (version.uses_modern_grammar() && value.starts_with("<ID="))
}

/// Parse the `#CHROM` line, returning the sample names.
fn parse_column_line(line: &str) -> Result<Vec<String>, ParseError> {
    let fields: Vec<&str> = line[1..].split('\t').collect();

    for (position, field) in HeaderField::ALL.iter().enumerate() {
        match fields.get(position) {
            Some(found) if *found == field.as_str() => {}
            found => {
                return Err(ParseError::InvalidFormat(format!(
                    "expected column {} at position {}, found {}",
                    field.as_str(),
                    position + 1,
                    found.unwrap_or(&"end of line")
                )))
            }
        }
    }

    let rest = &fields[HeaderField::ALL.len()..];
    match rest.split_first() {
        None => Ok(Vec::new()),
        Some((&"FORMAT", samples)) => Ok(samples.iter().map(|s| (*s).to_string()).collect()),
        Some((other, _)) => Err(ParseError::InvalidFormat(format!(
            "expected FORMAT column before sample columns, found {other}"
        ))),
    }
}

/// Render the header as text: the version line, the metadata lines in sorted
/// order with contig lines in contig order, and the `#CHROM` line.
///
/// Lines are written in the grammar of the header's version, so a 3.x header
/// reads back as 3.x.
///
/// # Errors
///
/// Returns `HeaderError::VersionIncompatible` if a line cannot be written in
/// the 3.x grammar.
pub fn format_header(header: &Header) -> Result<String, HeaderError> {
    let version = header.version();
    let lines: Vec<&HeaderLine> = header
        .sorted_lines()
        .into_iter()
        .filter(|line| !line.is_version_line() && line.as_contig().is_none())
        .collect();

    let contig_prefix = format!("##{CONTIG_KEY}=");
    let split = lines.partition_point(|line| line.to_string() < contig_prefix);

    let mut text = format!("{}\n", HeaderLine::version_line(version));
    for line in &lines[..split] {
        push_line(&mut text, &line.to_encoding_for(version)?);
    }
    for contig in header.contig_lines() {
        push_line(&mut text, &contig.line().to_encoding_for(version)?);
    }
    for line in &lines[split..] {
        push_line(&mut text, &line.to_encoding_for(version)?);
    }
    text.push_str(&header.column_line());
    text.push('\n');
    Ok(text)
}

fn push_line(text: &mut String, encoding: &str) {
    text.push_str("##");
    text.push_str(encoding);
    text.push('\n');
}

/// Write the header text to `writer`.
///
/// # Errors
///
/// Returns `ParseError::Header` if the header cannot be rendered, or
/// `ParseError::Io` for errors from the underlying writer.
pub fn write_header<W: Write>(header: &Header, writer: &mut W) -> Result<(), ParseError> {
    writer.write_all(format_header(header)?.as_bytes())?;
    Ok(())
}
