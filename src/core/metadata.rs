//! Ordered, de-duplicating storage for the metadata lines of one header.
//!
//! ID-keyed lines are identified by `(key, ID)`, so two `INFO` lines with the
//! same ID are the same line even when their attributes differ. Plain lines
//! are identified by `(key, digest of the full line)`, which keeps distinct
//! values for the same key (several `##source` lines, say) while dropping
//! exact repeats.
//!
//! Adding a line whose identity is already present keeps the existing line.
//! Replacing a line requires an explicit [`MetadataCollection::remove`] first.

use linked_hash_map::LinkedHashMap;
use tracing::debug;

use crate::core::line::{CompoundLine, ContigLine, FilterLine, HeaderLine};
use crate::core::types::CompoundKind;
use crate::core::validation::{collect_failures, ValidationFailure};
use crate::core::version::FormatVersion;
use crate::error::HeaderError;
use crate::utils::validation::content_digest;

/// Identity of a line within one header
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LineKey {
    Id { key: String, id: String },
    Content { key: String, digest: String },
}

impl LineKey {
    fn of(line: &HeaderLine) -> Self {
        match line.id() {
            Some(id) => LineKey::Id {
                key: line.key().to_string(),
                id: id.to_string(),
            },
            None => LineKey::Content {
                key: line.key().to_string(),
                digest: content_digest(&line.to_encoding()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataCollection {
    lines: LinkedHashMap<LineKey, HeaderLine>,
}

impl MetadataCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding only the version line for `version`.
    #[must_use]
    pub fn with_version_line(version: FormatVersion) -> Self {
        let line = HeaderLine::version_line(version);
        let mut lines = LinkedHashMap::new();
        lines.insert(LineKey::of(&line), line);
        Self { lines }
    }

    /// Add a line, returning `false` if a line with the same identity was
    /// already present (the existing line is kept).
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::DuplicateVersionLine` for a second version line, or
    /// `HeaderError::DuplicateContigIndex` for a new contig whose index is taken.
    pub fn add(&mut self, line: HeaderLine) -> Result<bool, HeaderError> {
        if line.is_version_line() && self.version_line().is_some() {
            return Err(HeaderError::DuplicateVersionLine(line.to_string()));
        }

        let key = LineKey::of(&line);
        if let Some(existing) = self.lines.get(&key) {
            if existing != &line {
                debug!(
                    existing = %existing,
                    dropped = %line,
                    "Header already has a line with this identity, keeping the existing line"
                );
            }
            return Ok(false);
        }

        if let HeaderLine::Contig(contig) = &line {
            if let Some(other) = self
                .contig_lines()
                .into_iter()
                .find(|other| other.index() == contig.index())
            {
                return Err(HeaderError::DuplicateContigIndex {
                    index: contig.index(),
                    existing: other.id().to_string(),
                    added: contig.id().to_string(),
                });
            }
        }

        self.lines.insert(key, line);
        Ok(true)
    }

    /// Remove the line with the same identity as `line`, returning it.
    pub fn remove(&mut self, line: &HeaderLine) -> Option<HeaderLine> {
        self.lines.remove(&LineKey::of(line))
    }

    /// The stored line with the same identity as `line`, whose content may differ.
    #[must_use]
    pub fn find_equivalent(&self, line: &HeaderLine) -> Option<&HeaderLine> {
        self.lines.get(&LineKey::of(line))
    }

    #[must_use]
    pub fn contains(&self, line: &HeaderLine) -> bool {
        self.find_equivalent(line) == Some(line)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn version_line(&self) -> Option<&HeaderLine> {
        self.lines.values().find(|line| line.is_version_line())
    }

    /// The version declared by the version line, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::UnknownVersion` if the version line names an
    /// unrecognized version.
    pub fn version(&self) -> Result<Option<FormatVersion>, HeaderError> {
        match self.version_line() {
            Some(line) => line.declared_version(),
            None => Ok(None),
        }
    }

    /// All lines in the order they were added.
    pub fn lines(&self) -> impl Iterator<Item = &HeaderLine> {
        self.lines.values()
    }

    /// All lines ordered by their text. Contig lines are not in contig
    /// order here; use [`MetadataCollection::contig_lines`] for that.
    #[must_use]
    pub fn sorted_lines(&self) -> Vec<&HeaderLine> {
        let mut lines: Vec<(String, &HeaderLine)> = self
            .lines
            .values()
            .map(|line| (line.to_string(), line))
            .collect();
        lines.sort_by(|a, b| a.0.cmp(&b.0));
        lines.into_iter().map(|(_, line)| line).collect()
    }

    /// Contig lines ordered by contig index.
    #[must_use]
    pub fn contig_lines(&self) -> Vec<&ContigLine> {
        let mut contigs: Vec<&ContigLine> =
            self.lines.values().filter_map(HeaderLine::as_contig).collect();
        contigs.sort_by_key(|contig| contig.index());
        contigs
    }

    pub fn id_lines(&self) -> impl Iterator<Item = &HeaderLine> {
        self.lines.values().filter(|line| line.is_id_line())
    }

    pub fn filter_lines(&self) -> impl Iterator<Item = &FilterLine> {
        self.lines.values().filter_map(HeaderLine::as_filter)
    }

    pub fn compound_lines(&self, kind: CompoundKind) -> impl Iterator<Item = &CompoundLine> {
        self.lines
            .values()
            .filter_map(HeaderLine::as_compound)
            .filter(move |line| line.kind() == kind)
    }

    pub fn lines_with_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a HeaderLine> {
        self.lines.values().filter(move |line| line.key() == key)
    }

    /// Look up an ID-keyed line.
    #[must_use]
    pub fn id_line(&self, key: &str, id: &str) -> Option<&HeaderLine> {
        self.lines.get(&LineKey::Id {
            key: key.to_string(),
            id: id.to_string(),
        })
    }

    /// Remove every contig line, returning how many were removed.
    pub fn remove_contig_lines(&mut self) -> usize {
        let keys: Vec<LineKey> = self
            .lines
            .iter()
            .filter(|(_, line)| line.as_contig().is_some())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            self.lines.remove(key);
        }
        keys.len()
    }

    /// Every line, other than the version line, that is not valid at `version`.
    #[must_use]
    pub fn validation_failures(&self, version: FormatVersion) -> Vec<ValidationFailure> {
        collect_failures(
            self.lines.values().filter(|line| !line.is_version_line()),
            version,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::line::{CompoundLine, ContigLine, FilterLine};
    use crate::core::types::{LineCount, ValueType};

    const V42: FormatVersion = FormatVersion::Vcf4_2;

    fn info(id: &str, count: LineCount, description: &str) -> HeaderLine {
        CompoundLine::new(CompoundKind::Info, id, count, ValueType::Integer, description)
            .unwrap()
            .into()
    }

    fn contig(id: &str, index: usize) -> HeaderLine {
        ContigLine::parse(&format!("<ID={id},length=100>"), V42, index)
            .unwrap()
            .into()
    }

    #[test]
    fn test_first_line_wins() {
        let mut lines = MetadataCollection::new();
        assert!(lines.add(info("DP", LineCount::Fixed(1), "first")).unwrap());
        assert!(!lines.add(info("DP", LineCount::Fixed(2), "second")).unwrap());

        assert_eq!(lines.len(), 1);
        let kept = lines.compound_lines(CompoundKind::Info).next().unwrap();
        assert_eq!(kept.description(), "first");
    }

    #[test]
    fn test_same_id_different_kinds_are_distinct() {
        let mut lines = MetadataCollection::new();
        lines.add(info("DP", LineCount::Fixed(1), "depth")).unwrap();
        lines
            .add(
                CompoundLine::new(
                    CompoundKind::Format,
                    "DP",
                    LineCount::Fixed(1),
                    ValueType::Integer,
                    "depth",
                )
                .unwrap()
                .into(),
            )
            .unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_plain_lines_keep_distinct_values() {
        let mut lines = MetadataCollection::new();
        assert!(lines.add(HeaderLine::plain("source", "a").unwrap()).unwrap());
        assert!(lines.add(HeaderLine::plain("source", "b").unwrap()).unwrap());
        assert!(!lines.add(HeaderLine::plain("source", "a").unwrap()).unwrap());
        assert_eq!(lines.lines_with_key("source").count(), 2);
    }

    #[test]
    fn test_with_version_line() {
        let mut lines = MetadataCollection::with_version_line(FormatVersion::Vcf3_2);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.version().unwrap(), Some(FormatVersion::Vcf3_2));
        assert!(matches!(
            lines.add(HeaderLine::version_line(V42)),
            Err(HeaderError::DuplicateVersionLine(_))
        ));
    }

    #[test]
    fn test_second_version_line_rejected() {
        let mut lines = MetadataCollection::new();
        lines.add(HeaderLine::version_line(V42)).unwrap();
        assert!(matches!(
            lines.add(HeaderLine::version_line(V42)),
            Err(HeaderError::DuplicateVersionLine(_))
        ));
        assert!(matches!(
            lines.add(HeaderLine::version_line(FormatVersion::Vcf4_3)),
            Err(HeaderError::DuplicateVersionLine(_))
        ));
        assert_eq!(lines.version().unwrap(), Some(V42));
    }

    #[test]
    fn test_remove_then_add_replaces() {
        let mut lines = MetadataCollection::new();
        lines.add(info("DP", LineCount::Fixed(1), "first")).unwrap();
        let replacement = info("DP", LineCount::Fixed(1), "second");

        let removed = lines.remove(&replacement).unwrap();
        assert_eq!(removed, info("DP", LineCount::Fixed(1), "first"));
        assert!(lines.add(replacement.clone()).unwrap());
        assert!(lines.contains(&replacement));
    }

    #[test]
    fn test_find_equivalent() {
        let mut lines = MetadataCollection::new();
        lines.add(info("DP", LineCount::Fixed(1), "first")).unwrap();
        let other = info("DP", LineCount::PerAltAllele, "other");
        assert_eq!(
            lines.find_equivalent(&other),
            Some(&info("DP", LineCount::Fixed(1), "first"))
        );
        assert!(!lines.contains(&other));
    }

    #[test]
    fn test_contig_order_differs_from_sorted_order() {
        let mut lines = MetadataCollection::new();
        lines.add(contig("chr10", 2)).unwrap();
        lines.add(contig("chr2", 0)).unwrap();
        lines.add(contig("chr1", 1)).unwrap();

        let by_index: Vec<usize> = lines.contig_lines().iter().map(|c| c.index()).collect();
        assert_eq!(by_index, vec![0, 1, 2]);

        let sorted: Vec<&str> = lines
            .sorted_lines()
            .into_iter()
            .filter_map(HeaderLine::id)
            .collect();
        assert_eq!(sorted, vec!["chr1", "chr10", "chr2"]);
    }

    #[test]
    fn test_contig_index_collision() {
        let mut lines = MetadataCollection::new();
        lines.add(contig("chr1", 0)).unwrap();
        assert!(matches!(
            lines.add(contig("chr2", 0)),
            Err(HeaderError::DuplicateContigIndex { index: 0, .. })
        ));
        assert_eq!(lines.remove_contig_lines(), 1);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_input_order_preserved() {
        let mut lines = MetadataCollection::new();
        lines.add(FilterLine::new("z", "last").unwrap().into()).unwrap();
        lines.add(FilterLine::new("a", "first").unwrap().into()).unwrap();
        let ids: Vec<&str> = lines.filter_lines().map(FilterLine::id).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert!(lines.id_line("FILTER", "a").is_some());
    }
}
