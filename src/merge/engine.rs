use tracing::warn;

use crate::core::contig::SequenceDictionary;
use crate::core::header::Header;
use crate::core::line::{CompoundLine, ContigLine, HeaderLine};
use crate::core::metadata::MetadataCollection;
use crate::core::types::{HeaderOptions, LineCount, ValueType};
use crate::core::version::FormatVersion;
use crate::error::HeaderError;
use crate::merge::dictionary::common_dictionary;

/// Oldest version a header may have and still be merged
pub const MINIMUM_MERGE_VERSION: FormatVersion = FormatVersion::Vcf4_2;

/// Configuration for merging headers
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Log a warning for every conflicting line that is widened or dropped
    pub emit_warnings: bool,

    /// Validation applied to the merged header
    pub header_options: HeaderOptions,
}

impl MergeOptions {
    #[must_use]
    pub fn with_warnings(mut self, emit_warnings: bool) -> Self {
        self.emit_warnings = emit_warnings;
        self
    }

    #[must_use]
    pub fn with_header_options(mut self, header_options: HeaderOptions) -> Self {
        self.header_options = header_options;
        self
    }
}

/// Merge the metadata lines of several headers, returning them in sorted order.
///
/// # Errors
///
/// See [`merge_into_header`].
pub fn merge_headers(headers: &[Header], options: MergeOptions) -> Result<Vec<HeaderLine>, HeaderError> {
    let merged = merge_into_header(headers, options)?;
    Ok(merged.sorted_lines().into_iter().cloned().collect())
}

/// Merge several headers into a new header at the newest input version.
///
/// Contig lines come from the one dictionary every input is compatible with.
/// Lines sharing an identity are reconciled: INFO and FORMAT lines are
/// widened to cover both declarations, other ID lines keep the first seen,
/// and plain lines with different values are all kept. The merged header has
/// no samples. Inputs are never modified.
///
/// # Errors
///
/// Returns `HeaderError::IncompatibleHeaders` if there are no headers, a
/// header is older than [`MINIMUM_MERGE_VERSION`], the sequence dictionaries
/// cannot be reconciled, or two INFO/FORMAT lines have irreconcilable types.
/// Validation of the merged header can fail as for [`Header::with_options`].
pub fn merge_into_header(headers: &[Header], options: MergeOptions) -> Result<Header, HeaderError> {
    let newest = newest_version(headers)?;
    let dictionary = merged_dictionary(headers)?;

    let mut merged = MetadataCollection::new();
    for header in headers {
        for line in header.sorted_lines() {
            if line.is_version_line() || line.as_contig().is_some() {
                continue;
            }
            merge_line(&mut merged, line, options)?;
        }
    }

    let mut lines = vec![HeaderLine::version_line(newest)];
    lines.extend(merged.lines().cloned());
    if let Some(dictionary) = &dictionary {
        lines.extend(contig_lines(headers, dictionary)?);
    }

    Header::with_options(lines, Vec::new(), options.header_options)
}

/// Contig lines for `dictionary`, reusing the input line each record was
/// read from so attributes a record does not model are kept.
fn contig_lines(
    headers: &[Header],
    dictionary: &SequenceDictionary,
) -> Result<Vec<HeaderLine>, HeaderError> {
    let mut lines = Vec::with_capacity(dictionary.len());
    for (index, record) in dictionary.iter().enumerate() {
        let source = headers
            .iter()
            .flat_map(Header::contig_lines)
            .find(|contig| {
                contig.id() == record.name
                    && contig
                        .to_sequence_record()
                        .is_ok_and(|candidate| candidate == *record)
            });
        let line = match source {
            Some(contig) => contig.clone().with_index(index),
            None => ContigLine::from_sequence_record(record, index, None)?,
        };
        lines.push(line.into());
    }
    Ok(lines)
}

fn newest_version(headers: &[Header]) -> Result<FormatVersion, HeaderError> {
    let mut newest: Option<FormatVersion> = None;
    for (i, header) in headers.iter().enumerate() {
        let version = header.version();
        if version < MINIMUM_MERGE_VERSION {
            return Err(HeaderError::IncompatibleHeaders(format!(
                "cannot merge header {} with version {version}; {MINIMUM_MERGE_VERSION} or later is required",
                i + 1
            )));
        }
        newest = newest.max(Some(version));
    }
    newest.ok_or_else(|| HeaderError::IncompatibleHeaders("no headers to merge".to_string()))
}

fn merged_dictionary(headers: &[Header]) -> Result<Option<SequenceDictionary>, HeaderError> {
    let mut dictionaries = Vec::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        if let Some(dictionary) = header.sequence_dictionary()? {
            dictionaries.push((format!("header {}", i + 1), dictionary));
        }
    }
    common_dictionary(
        dictionaries
            .iter()
            .map(|(label, dictionary)| (label.clone(), dictionary)),
    )
}

fn merge_line(
    merged: &mut MetadataCollection,
    line: &HeaderLine,
    options: MergeOptions,
) -> Result<(), HeaderError> {
    if merged.find_equivalent(line).is_none() {
        merged.add(line.clone())?;
        return Ok(());
    }

    let reconciled = match (merged.find_equivalent(line), line) {
        (Some(existing), _) if existing == line => return Ok(()),
        (Some(HeaderLine::Compound(existing)), HeaderLine::Compound(incoming)) => {
            HeaderLine::Compound(reconcile_compound(existing, incoming, options)?)
        }
        (Some(existing), _) => {
            if options.emit_warnings {
                warn!(
                    kept = %existing,
                    dropped = %line,
                    "Ignoring header line with the same ID as a line already merged"
                );
            }
            return Ok(());
        }
        (None, _) => return Ok(()),
    };

    if merged.contains(&reconciled) {
        return Ok(());
    }
    merged.remove(&reconciled);
    merged.add(reconciled)?;
    Ok(())
}

/// Combine two INFO or FORMAT lines with the same ID.
///
/// | Difference | Result |
/// |------------|--------|
/// | `Number` | `Number=.` |
/// | `Integer` vs `Float` | `Type=Float` |
/// | any other `Type` | error |
/// | `Description` only | existing line, placeholder descriptions replaced |
fn reconcile_compound(
    existing: &CompoundLine,
    incoming: &CompoundLine,
    options: MergeOptions,
) -> Result<CompoundLine, HeaderError> {
    let value_type = match (existing.value_type(), incoming.value_type()) {
        (a, b) if a == b => a,
        (ValueType::Integer, ValueType::Float) | (ValueType::Float, ValueType::Integer) => {
            if options.emit_warnings {
                warn!(
                    key = existing.kind().key(),
                    id = existing.id(),
                    "Promoting Integer to Float in merged header"
                );
            }
            ValueType::Float
        }
        (a, b) => {
            return Err(HeaderError::IncompatibleHeaders(format!(
                "cannot merge {} lines with types {a} and {b}: ##{} and ##{}",
                existing.kind().key(),
                existing.line().to_encoding(),
                incoming.line().to_encoding()
            )));
        }
    };

    let count = if existing.count() == incoming.count() {
        existing.count()
    } else {
        if options.emit_warnings {
            warn!(
                key = existing.kind().key(),
                id = existing.id(),
                existing = %existing.count(),
                incoming = %incoming.count(),
                "Promoting Number to . in merged header"
            );
        }
        LineCount::Unbounded
    };

    let description = if existing.has_placeholder_description() {
        incoming.description()
    } else {
        existing.description()
    };
    if options.emit_warnings && existing.description() != incoming.description() {
        warn!(
            key = existing.kind().key(),
            id = existing.id(),
            kept = description,
            "Header lines have different descriptions"
        );
    }

    Ok(existing
        .with_description(description)
        .with_count_and_type(count, value_type))
}
