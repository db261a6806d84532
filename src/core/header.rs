//! The [`Header`] aggregate.
//!
//! A header owns its metadata lines, the version they are validated against,
//! and the sample names of the `#CHROM` line. Adding a newer version line
//! moves the whole header to that version, re-validating every line first;
//! a failed transition leaves the header as it was.
//!
//! The sequence dictionary is derived from the contig lines, and replacing
//! it swaps every contig line at once.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::core::contig::SequenceDictionary;
use crate::core::line::{CompoundLine, ContigLine, FilterLine, HeaderLine, FILTER_KEY};
use crate::core::metadata::MetadataCollection;
use crate::core::types::{CompoundKind, HeaderField, HeaderOptions, VersionUpgradePolicy};
use crate::core::validation::{collect_failures, enforce, validate_for_version, ValidationFailure};
use crate::core::version::FormatVersion;
use crate::error::HeaderError;

/// A VCF header: versioned metadata lines plus the genotype sample names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    metadata: MetadataCollection,
    version: FormatVersion,
    options: HeaderOptions,

    /// Sample names in column order
    samples: Vec<String>,

    // === Derived from samples ===
    /// Sample names sorted lexicographically
    samples_in_order: Vec<String>,

    /// Sample name to genotype column offset
    sample_offsets: HashMap<String, usize>,

    samples_were_already_sorted: bool,
}

impl Header {
    /// Build a header with strict validation.
    ///
    /// # Errors
    ///
    /// See [`Header::with_options`].
    pub fn new(
        lines: impl IntoIterator<Item = HeaderLine>,
        samples: Vec<String>,
    ) -> Result<Self, HeaderError> {
        Self::with_options(lines, samples, HeaderOptions::default())
    }

    /// Build a header from its metadata lines and sample names.
    ///
    /// Exactly one version line must be present. Every line is validated
    /// against that version; under lenient options failures are only logged.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MissingVersionLine`, `HeaderError::DuplicateVersionLine`,
    /// `HeaderError::VersionIncompatible` (strict only), or
    /// `HeaderError::DuplicateSampleName`.
    pub fn with_options(
        lines: impl IntoIterator<Item = HeaderLine>,
        samples: Vec<String>,
        options: HeaderOptions,
    ) -> Result<Self, HeaderError> {
        let mut metadata = MetadataCollection::new();
        for line in lines {
            metadata.add(line)?;
        }

        let version = metadata.version()?.ok_or(HeaderError::MissingVersionLine)?;
        enforce(metadata.validation_failures(version), options)?;

        let mut header = Self {
            metadata,
            version,
            options,
            samples: Vec::new(),
            samples_in_order: Vec::new(),
            sample_offsets: HashMap::new(),
            samples_were_already_sorted: true,
        };
        header.set_samples(samples)?;
        Ok(header)
    }

    /// A header holding only the version line for `version`.
    #[must_use]
    pub fn with_version(version: FormatVersion) -> Self {
        Self {
            metadata: MetadataCollection::with_version_line(version),
            version,
            options: HeaderOptions::default(),
            samples: Vec::new(),
            samples_in_order: Vec::new(),
            sample_offsets: HashMap::new(),
            samples_were_already_sorted: true,
        }
    }

    fn set_samples(&mut self, samples: Vec<String>) -> Result<(), HeaderError> {
        let mut offsets = HashMap::with_capacity(samples.len());
        for (offset, name) in samples.iter().enumerate() {
            if offsets.insert(name.clone(), offset).is_some() {
                return Err(HeaderError::DuplicateSampleName(name.clone()));
            }
        }

        let mut sorted = samples.clone();
        sorted.sort();

        self.samples_were_already_sorted = sorted == samples;
        self.samples_in_order = sorted;
        self.sample_offsets = offsets;
        self.samples = samples;
        Ok(())
    }

    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    #[must_use]
    pub fn options(&self) -> HeaderOptions {
        self.options
    }

    /// Add a metadata line.
    ///
    /// A version line newer than the header's version moves the header to
    /// that version after re-validating every existing line; if any line is
    /// not valid at the new version the header is left unchanged. Any other
    /// line is validated against the current version and added unless a line
    /// with the same identity exists, in which case the existing line is kept.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::VersionRegression` for an older version line,
    /// `HeaderError::VersionIncompatible` (strict only), or
    /// `HeaderError::DuplicateContigIndex`.
    pub fn add_line(&mut self, line: HeaderLine) -> Result<(), HeaderError> {
        if let Some(requested) = line.declared_version()? {
            return match requested.cmp(&self.version) {
                Ordering::Less => Err(HeaderError::VersionRegression {
                    current: self.version,
                    requested,
                }),
                Ordering::Equal => Ok(()),
                Ordering::Greater => self.move_to_version(requested, line),
            };
        }

        enforce(
            validate_for_version(&line, self.version).err().into_iter().collect(),
            self.options,
        )?;
        self.metadata.add(line)?;
        Ok(())
    }

    fn move_to_version(
        &mut self,
        requested: FormatVersion,
        version_line: HeaderLine,
    ) -> Result<(), HeaderError> {
        enforce(self.metadata.validation_failures(requested), self.options)?;

        if let Some(current) = self.metadata.version_line().cloned() {
            self.metadata.remove(&current);
        }
        self.metadata.add(version_line)?;

        debug!(from = %self.version, to = %requested, "Header version updated");
        self.version = requested;
        Ok(())
    }

    /// Remove the line with the same identity as `line`. The version line
    /// cannot be removed.
    pub fn remove_line(&mut self, line: &HeaderLine) -> Option<HeaderLine> {
        if line.is_version_line() {
            return None;
        }
        self.metadata.remove(line)
    }

    /// Add `line`, replacing any line with the same identity.
    ///
    /// # Errors
    ///
    /// See [`Header::add_line`]. On error the header is unchanged.
    pub fn replace_line(&mut self, line: HeaderLine) -> Result<Option<HeaderLine>, HeaderError> {
        if line.is_version_line() {
            self.add_line(line)?;
            return Ok(None);
        }

        enforce(
            validate_for_version(&line, self.version).err().into_iter().collect(),
            self.options,
        )?;
        let removed = self.metadata.remove(&line);
        if let Err(e) = self.metadata.add(line) {
            if let Some(previous) = removed {
                self.metadata.add(previous)?;
            }
            return Err(e);
        }
        Ok(removed)
    }

    /// Metadata lines in the order they were added.
    pub fn lines(&self) -> impl Iterator<Item = &HeaderLine> {
        self.metadata.lines()
    }

    /// Metadata lines ordered by their text.
    #[must_use]
    pub fn sorted_lines(&self) -> Vec<&HeaderLine> {
        self.metadata.sorted_lines()
    }

    #[must_use]
    pub fn metadata(&self) -> &MetadataCollection {
        &self.metadata
    }

    pub fn id_lines(&self) -> impl Iterator<Item = &HeaderLine> {
        self.metadata.id_lines()
    }

    pub fn info_lines(&self) -> impl Iterator<Item = &CompoundLine> {
        self.metadata.compound_lines(CompoundKind::Info)
    }

    pub fn format_lines(&self) -> impl Iterator<Item = &CompoundLine> {
        self.metadata.compound_lines(CompoundKind::Format)
    }

    pub fn filter_lines(&self) -> impl Iterator<Item = &FilterLine> {
        self.metadata.filter_lines()
    }

    #[must_use]
    pub fn info_line(&self, id: &str) -> Option<&CompoundLine> {
        self.metadata
            .id_line(CompoundKind::Info.key(), id)
            .and_then(HeaderLine::as_compound)
    }

    #[must_use]
    pub fn format_line(&self, id: &str) -> Option<&CompoundLine> {
        self.metadata
            .id_line(CompoundKind::Format.key(), id)
            .and_then(HeaderLine::as_compound)
    }

    #[must_use]
    pub fn filter_line(&self, id: &str) -> Option<&FilterLine> {
        self.metadata
            .id_line(FILTER_KEY, id)
            .and_then(HeaderLine::as_filter)
    }

    pub fn lines_with_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a HeaderLine> {
        self.metadata.lines_with_key(key)
    }

    /// Lines that are not version, contig, FILTER, INFO, or FORMAT lines.
    pub fn other_lines(&self) -> impl Iterator<Item = &HeaderLine> {
        self.metadata.lines().filter(|line| {
            !line.is_version_line()
                && !matches!(
                    line,
                    HeaderLine::Contig(_) | HeaderLine::Filter(_) | HeaderLine::Compound(_)
                )
        })
    }

    /// The single other line with `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` if more than one line has `key`.
    pub fn other_line_unique(&self, key: &str) -> Result<Option<&HeaderLine>, HeaderError> {
        let mut matching = self.other_lines().filter(|line| line.key() == key);
        let first = matching.next();
        if matching.next().is_some() {
            return Err(HeaderError::MalformedLine(format!(
                "expected at most one ##{key} line"
            )));
        }
        Ok(first)
    }

    /// Add an other line after removing every other line with the same key.
    ///
    /// # Errors
    ///
    /// See [`Header::add_line`]. On error the header is unchanged.
    pub fn add_other_line_unique(&mut self, line: HeaderLine) -> Result<(), HeaderError> {
        enforce(
            validate_for_version(&line, self.version).err().into_iter().collect(),
            self.options,
        )?;
        let existing: Vec<HeaderLine> = self
            .other_lines()
            .filter(|other| other.key() == line.key())
            .cloned()
            .collect();
        for other in &existing {
            self.metadata.remove(other);
        }
        self.metadata.add(line)?;
        Ok(())
    }

    /// Contig lines ordered by contig index.
    #[must_use]
    pub fn contig_lines(&self) -> Vec<&ContigLine> {
        self.metadata.contig_lines()
    }

    /// The sequence dictionary described by the contig lines, or `None`
    /// when the header has no contig lines.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` if a contig length is not an integer.
    pub fn sequence_dictionary(&self) -> Result<Option<SequenceDictionary>, HeaderError> {
        let contigs = self.contig_lines();
        if contigs.is_empty() {
            return Ok(None);
        }
        let records = contigs
            .into_iter()
            .map(ContigLine::to_sequence_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(SequenceDictionary::new(records)))
    }

    /// Replace every contig line with one line per dictionary entry, using
    /// the entry's position as its contig index.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::VersionIncompatible` (strict only) if a contig
    /// name is not valid at the header's version. On error the header is unchanged.
    pub fn set_sequence_dictionary(
        &mut self,
        dictionary: &SequenceDictionary,
    ) -> Result<(), HeaderError> {
        self.replace_contigs(dictionary, None)
    }

    pub(crate) fn replace_contigs(
        &mut self,
        dictionary: &SequenceDictionary,
        assembly: Option<&str>,
    ) -> Result<(), HeaderError> {
        let contigs = dictionary
            .iter()
            .enumerate()
            .map(|(index, record)| {
                ContigLine::from_sequence_record(record, index, assembly).map(HeaderLine::Contig)
            })
            .collect::<Result<Vec<_>, _>>()?;
        enforce(collect_failures(&contigs, self.version), self.options)?;

        let removed = self.metadata.remove_contig_lines();
        debug!(removed, added = contigs.len(), "Replacing contig lines");
        for contig in contigs {
            self.metadata.add(contig)?;
        }
        Ok(())
    }

    /// Sample names in genotype column order.
    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Sample names sorted lexicographically.
    #[must_use]
    pub fn samples_in_order(&self) -> &[String] {
        &self.samples_in_order
    }

    /// Sample name to genotype column offset.
    #[must_use]
    pub fn sample_offsets(&self) -> &HashMap<String, usize> {
        &self.sample_offsets
    }

    /// Whether the samples were supplied in sorted order.
    #[must_use]
    pub fn samples_were_already_sorted(&self) -> bool {
        self.samples_were_already_sorted
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn has_genotype_data(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Number of tab-delimited columns in a data record.
    #[must_use]
    pub fn column_count(&self) -> usize {
        let fixed = HeaderField::ALL.len();
        if self.has_genotype_data() {
            fixed + 1 + self.samples.len()
        } else {
            fixed
        }
    }

    /// The `#CHROM` column line.
    #[must_use]
    pub fn column_line(&self) -> String {
        let mut columns: Vec<&str> = HeaderField::ALL.iter().map(|f| f.as_str()).collect();
        if self.has_genotype_data() {
            columns.push("FORMAT");
            columns.extend(self.samples.iter().map(String::as_str));
        }
        format!("#{}", columns.join("\t"))
    }

    /// Lines, other than the version line, that are not valid at `version`.
    #[must_use]
    pub fn validation_failures(&self, version: FormatVersion) -> Vec<ValidationFailure> {
        self.metadata.validation_failures(version)
    }

    /// Produce a copy of this header moved to the newest version, as allowed by `policy`.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::VersionIncompatible` under
    /// `VersionUpgradePolicy::UpgradeOrFail` when a line is not valid at the newest version.
    pub fn upgrade(&self, policy: VersionUpgradePolicy) -> Result<Header, HeaderError> {
        let newest = FormatVersion::ALL[FormatVersion::ALL.len() - 1];
        if policy == VersionUpgradePolicy::DoNotUpgrade || self.version == newest {
            return Ok(self.clone());
        }

        let failures = self.validation_failures(newest);
        if let Some(first) = failures.into_iter().next() {
            return match policy {
                VersionUpgradePolicy::UpgradeOrFail => Err(first.into()),
                _ => {
                    debug!(version = %self.version, reason = %first, "Header not upgraded");
                    Ok(self.clone())
                }
            };
        }

        let mut upgraded = self.clone();
        upgraded.add_line(HeaderLine::version_line(newest))?;
        Ok(upgraded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::SequenceRecord;
    use crate::core::line::StructuredLine;
    use crate::core::types::{LineCount, ValueType};

    const V42: FormatVersion = FormatVersion::Vcf4_2;
    const V43: FormatVersion = FormatVersion::Vcf4_3;

    fn contig(id: &str, index: usize) -> HeaderLine {
        ContigLine::parse(&format!("<ID={id},length=1000>"), V42, index)
            .unwrap()
            .into()
    }

    fn info(id: &str) -> HeaderLine {
        CompoundLine::new(
            CompoundKind::Info,
            id,
            LineCount::Fixed(1),
            ValueType::Integer,
            "test",
        )
        .unwrap()
        .into()
    }

    fn samples(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_requires_version_line() {
        assert!(matches!(
            Header::new(vec![info("DP")], vec![]),
            Err(HeaderError::MissingVersionLine)
        ));
    }

    #[test]
    fn test_rejects_two_version_lines() {
        let lines = vec![HeaderLine::version_line(V42), HeaderLine::version_line(V43)];
        assert!(matches!(
            Header::new(lines, vec![]),
            Err(HeaderError::DuplicateVersionLine(_))
        ));
    }

    #[test]
    fn test_duplicate_samples() {
        let lines = vec![HeaderLine::version_line(V42)];
        assert!(matches!(
            Header::new(lines, samples(&["a", "b", "a"])),
            Err(HeaderError::DuplicateSampleName(name)) if name == "a"
        ));
    }

    #[test]
    fn test_sample_views() {
        let header = Header::new(vec![HeaderLine::version_line(V42)], samples(&["c", "a", "b"]))
            .unwrap();
        assert_eq!(header.samples(), samples(&["c", "a", "b"]).as_slice());
        assert_eq!(header.samples_in_order(), samples(&["a", "b", "c"]).as_slice());
        assert_eq!(header.sample_offsets()["c"], 0);
        assert_eq!(header.sample_offsets()["b"], 2);
        assert!(!header.samples_were_already_sorted());
        assert_eq!(header.column_count(), 12);

        let sorted = Header::new(vec![HeaderLine::version_line(V42)], samples(&["a", "b"])).unwrap();
        assert!(sorted.samples_were_already_sorted());
        assert!(sorted.column_line().ends_with("INFO\tFORMAT\ta\tb"));
    }

    #[test]
    fn test_sites_only_columns() {
        let header = Header::with_version(V42);
        assert!(!header.has_genotype_data());
        assert_eq!(header.column_count(), 8);
        assert_eq!(
            header.column_line(),
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO"
        );
    }

    #[test]
    fn test_strict_construction_rejects_incompatible_line() {
        let meta: HeaderLine = StructuredLine::parse("META", "<ID=Assay,Type=String>", V43)
            .unwrap()
            .into();
        let lines = vec![HeaderLine::version_line(V42), meta.clone()];
        assert!(matches!(
            Header::new(lines.clone(), vec![]),
            Err(HeaderError::VersionIncompatible { .. })
        ));

        let header = Header::with_options(lines, vec![], HeaderOptions::lenient()).unwrap();
        assert_eq!(header.validation_failures(V42).len(), 1);
        assert!(header.lines().any(|line| line == &meta));
    }

    #[test]
    fn test_version_moves_forward() {
        let mut header = Header::new(vec![HeaderLine::version_line(V42), info("DP")], vec![]).unwrap();
        header.add_line(HeaderLine::version_line(V43)).unwrap();
        assert_eq!(header.version(), V43);
        assert_eq!(header.lines().filter(|l| l.is_version_line()).count(), 1);
        assert!(header.info_line("DP").is_some());
    }

    #[test]
    fn test_version_regression_rejected() {
        let mut header = Header::with_version(V43);
        let before = header.clone();
        assert!(matches!(
            header.add_line(HeaderLine::version_line(V42)),
            Err(HeaderError::VersionRegression { current: V43, requested: V42 })
        ));
        assert_eq!(header, before);
    }

    #[test]
    fn test_incompatible_line_aborts_transition() {
        let bad_contig: HeaderLine = ContigLine::parse("<ID=*weird,length=10>", V42, 0)
            .unwrap()
            .into();
        let mut header =
            Header::new(vec![HeaderLine::version_line(V42), bad_contig.clone()], vec![]).unwrap();
        let before = header.clone();

        assert!(matches!(
            header.add_line(HeaderLine::version_line(V43)),
            Err(HeaderError::VersionIncompatible { .. })
        ));
        assert_eq!(header, before);
        assert_eq!(header.version(), V42);
        assert!(header.lines().any(|line| line == &bad_contig));
    }

    #[test]
    fn test_equal_version_line_is_noop() {
        let mut header = Header::with_version(V42);
        header.add_line(HeaderLine::version_line(V42)).unwrap();
        assert_eq!(header.lines().count(), 1);
    }

    #[test]
    fn test_add_line_first_wins_and_replace() {
        let mut header = Header::with_version(V42);
        header.add_line(info("DP")).unwrap();
        let other: HeaderLine = CompoundLine::new(
            CompoundKind::Info,
            "DP",
            LineCount::Unbounded,
            ValueType::Integer,
            "other",
        )
        .unwrap()
        .into();

        header.add_line(other.clone()).unwrap();
        assert_eq!(header.info_line("DP").unwrap().count(), LineCount::Fixed(1));

        let previous = header.replace_line(other).unwrap();
        assert_eq!(previous, Some(info("DP")));
        assert_eq!(header.info_line("DP").unwrap().count(), LineCount::Unbounded);
    }

    #[test]
    fn test_add_line_validates_against_current_version() {
        let mut header = Header::with_version(V42);
        let meta: HeaderLine = StructuredLine::parse("META", "<ID=Assay>", V43).unwrap().into();
        assert!(header.add_line(meta).is_err());
        assert_eq!(header.lines().count(), 1);
    }

    #[test]
    fn test_contig_lines_sorted_by_index() {
        let lines = vec![
            HeaderLine::version_line(V42),
            contig("chr3", 2),
            contig("chr1", 0),
            contig("chr2", 1),
        ];
        let header = Header::new(lines, vec![]).unwrap();
        let names: Vec<&str> = header.contig_lines().iter().map(|c| c.id()).collect();
        assert_eq!(names, vec!["chr1", "chr2", "chr3"]);

        let dict = header.sequence_dictionary().unwrap().unwrap();
        assert_eq!(dict.index_of("chr3"), Some(2));
    }

    #[test]
    fn test_set_sequence_dictionary() {
        let mut header = Header::new(
            vec![HeaderLine::version_line(V42), contig("old", 0), info("DP")],
            vec![],
        )
        .unwrap();
        let dict = SequenceDictionary::new(vec![
            SequenceRecord::new("chrB", 20),
            SequenceRecord::new("chrA", 10),
        ]);
        header.set_sequence_dictionary(&dict).unwrap();

        let contigs = header.contig_lines();
        assert_eq!(contigs.len(), 2);
        assert_eq!(contigs[0].id(), "chrB");
        assert_eq!(contigs[0].index(), 0);
        assert_eq!(contigs[1].id(), "chrA");
        assert_eq!(header.sequence_dictionary().unwrap().unwrap(), dict);
        assert!(header.info_line("DP").is_some());
    }

    #[test]
    fn test_no_contigs_means_no_dictionary() {
        assert!(Header::with_version(V42).sequence_dictionary().unwrap().is_none());
    }

    #[test]
    fn test_other_lines() {
        let mut header = Header::new(
            vec![
                HeaderLine::version_line(V42),
                HeaderLine::plain("source", "a").unwrap(),
                HeaderLine::plain("reference", "file:///ref.fa").unwrap(),
                info("DP"),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(header.other_lines().count(), 2);
        assert_eq!(
            header.other_line_unique("reference").unwrap().unwrap().to_string(),
            "##reference=file:///ref.fa"
        );

        header.add_line(HeaderLine::plain("source", "b").unwrap()).unwrap();
        assert!(header.other_line_unique("source").is_err());

        header
            .add_other_line_unique(HeaderLine::plain("source", "c").unwrap())
            .unwrap();
        assert_eq!(
            header.other_line_unique("source").unwrap().unwrap().to_string(),
            "##source=c"
        );
    }

    #[test]
    fn test_version_line_not_removable() {
        let mut header = Header::with_version(V42);
        assert!(header.remove_line(&HeaderLine::version_line(V42)).is_none());
        assert_eq!(header.lines().count(), 1);
    }

    #[test]
    fn test_upgrade_policies() {
        let header = Header::new(vec![HeaderLine::version_line(V42), info("DP")], vec![]).unwrap();
        assert_eq!(
            header.upgrade(VersionUpgradePolicy::DoNotUpgrade).unwrap().version(),
            V42
        );
        assert_eq!(
            header.upgrade(VersionUpgradePolicy::UpgradeOrFail).unwrap().version(),
            V43
        );

        let stuck = Header::new(
            vec![
                HeaderLine::version_line(V42),
                HeaderLine::plain("PEDIGREE", "<Derived=D,Original=O>").unwrap(),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(
            stuck.upgrade(VersionUpgradePolicy::UpgradeOrFallback).unwrap().version(),
            V42
        );
        assert!(stuck.upgrade(VersionUpgradePolicy::UpgradeOrFail).is_err());
    }
}
