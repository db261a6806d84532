//! Header line model.
//!
//! Every `##` metadata line is one of a closed set of kinds:
//!
//! | Kind | Example | Identity |
//! |------|---------|----------|
//! | [`PlainLine`] | `##source=caller-1.0` | key and value |
//! | [`StructuredLine`] | `##ALT=<ID=DEL,Description="Deletion">` | key and ID |
//! | [`FilterLine`] | `##FILTER=<ID=q10,Description="Quality below 10">` | key and ID |
//! | [`ContigLine`] | `##contig=<ID=chr1,length=248956422>` | key and ID |
//! | [`CompoundLine`] | `##INFO=<ID=DP,Number=1,Type=Integer,Description="Depth">` | key and ID |
//!
//! Attributes keep the order in which they were supplied; serialization
//! writes them back in that order.

use std::borrow::Cow;
use std::fmt;

use tracing::warn;

use crate::core::contig::{SequenceRecord, UNKNOWN_SEQUENCE_LENGTH};
use crate::core::types::{CompoundKind, LineCount, ValueType};
use crate::core::version::FormatVersion;
use crate::error::HeaderError;
use crate::parsing::tokenizer::{parse_tags, Attributes};

pub const ID: &str = "ID";
pub const DESCRIPTION: &str = "Description";
pub const NUMBER: &str = "Number";
pub const TYPE: &str = "Type";
pub const SOURCE: &str = "Source";
pub const VERSION: &str = "Version";

pub const CONTIG_KEY: &str = "contig";
pub const FILTER_KEY: &str = "FILTER";
pub const ALT_KEY: &str = "ALT";
pub const META_KEY: &str = "META";
pub const PEDIGREE_KEY: &str = "PEDIGREE";
pub const SAMPLE_KEY: &str = "SAMPLE";

/// Description given to INFO/FORMAT lines that were declared without one.
pub const PLACEHOLDER_DESCRIPTION: &str = "Not provided in original VCF header";

/// Attributes whose values are always written in quotes.
const ALWAYS_QUOTED: [&str; 3] = [DESCRIPTION, SOURCE, VERSION];

const COMPOUND_TAGS: [&str; 4] = [ID, NUMBER, TYPE, DESCRIPTION];
const FILTER_TAGS: [&str; 2] = [ID, DESCRIPTION];
const ID_TAGS: [&str; 1] = [ID];

fn validate_key(key: &str) -> Result<(), HeaderError> {
    if key.is_empty() {
        return Err(HeaderError::MalformedLine("empty header line key".to_string()));
    }
    if key.contains(['<', '>', '=']) {
        return Err(HeaderError::MalformedLine(format!(
            "header line key '{key}' contains '<', '>' or '='"
        )));
    }
    Ok(())
}
/// Quote a value when the grammar requires it, escaping `\` and `"`.
/// Quote a value when the grammar requires it, escaping `\\` and `"`.
fn encode_value<'a>(name: &str, value: &'a str) -> Cow<'a, str> {
    let needs_quotes = ALWAYS_QUOTED.contains(&name) || value.contains([',', ' ', '"']);
    if !needs_quotes {
        return Cow::Borrowed(value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

/// Quote a value for the 3.x grammar, which has no escapes.
fn encode_legacy_value(name: &str, value: &str) -> Option<String> {
    if value.contains('"') {
        None
    } else if name == DESCRIPTION || value.contains(',') {
        Some(format!("\"{value}\""))
    } else {
        Some(value.to_string())
    }
}

/// An unstructured `key=value` line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlainLine {
    key: String,
    value: String,
}

impl PlainLine {
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` if the key is empty or contains `<`, `>` or `=`.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, HeaderError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self {
            key,
            value: value.into(),
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn to_encoding(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

/// An ID-keyed line with ordered attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuredLine {
    key: String,
    attributes: Attributes,
}

impl StructuredLine {
    /// Build from attributes whose first entry is `ID`.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` for an invalid key, or
    /// `HeaderError::MissingRequiredAttribute` if `ID` is absent, empty, or not first.
    pub fn new(key: impl Into<String>, attributes: Attributes) -> Result<Self, HeaderError> {
        let key = key.into();
        validate_key(&key)?;
        match attributes.front() {
            Some((name, id)) if name == ID && !id.is_empty() => {}
            _ => return Err(HeaderError::missing(&key, ID)),
        }
        if key == ALT_KEY && !attributes.contains_key(DESCRIPTION) {
            return Err(HeaderError::missing(&key, DESCRIPTION));
        }
        Ok(Self { key, attributes })
    }

    /// # Errors
    ///
    /// See [`StructuredLine::new`].
    pub fn with_description(
        key: impl Into<String>,
        id: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, HeaderError> {
        let mut attributes = Attributes::new();
        attributes.insert(ID.to_string(), id.into());
        attributes.insert(DESCRIPTION.to_string(), description.into());
        Self::new(key, attributes)
    }

    /// Parse the tag list of a generic structured line.
    ///
    /// # Errors
    ///
    /// Returns tokenizer errors, or the errors of [`StructuredLine::new`].
    pub fn parse(key: &str, value: &str, version: FormatVersion) -> Result<Self, HeaderError> {
        let expected: &[&str] = if key == ALT_KEY {
            &FILTER_TAGS
        } else {
            &ID_TAGS
        };
        let attributes = parse_tags(version, value, expected)?;
        Self::new(key, attributes)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.attribute(ID).unwrap_or_default()
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.attribute(DESCRIPTION)
    }

    /// Update an attribute in place, keeping its position; new attributes go last.
    fn set_attribute(&mut self, name: &str, value: String) {
        if let Some(existing) = self.attributes.get_mut(name) {
            *existing = value;
        } else {
            self.attributes.insert(name.to_string(), value);
        }
    }

    /// The line without its leading `##`.
    #[must_use]
    pub fn to_encoding(&self) -> String {
        let body: Vec<String> = self
            .attributes
            .iter()
            .map(|(name, value)| format!("{name}={}", encode_value(name, value)))
            .collect();
        format!("{}=<{}>", self.key, body.join(","))
    }

    /// The line as written in a header of `version`.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::VersionIncompatible` if a 3.x header cannot hold the line.
    pub fn to_encoding_for(&self, version: FormatVersion) -> Result<String, HeaderError> {
        if version.uses_modern_grammar() {
            Ok(self.to_encoding())
        } else {
            self.to_legacy_encoding(legacy_tags(&self.key), version)
        }
    }

    /// Positional `key=value,...` form; `tags` are the attributes the kind
    /// holds in 3.x, in order.
    fn to_legacy_encoding(&self, tags: &[&str], version: FormatVersion) -> Result<String, HeaderError> {
        let unrepresentable = |reason: String| HeaderError::VersionIncompatible {
            line: format!("##{}", self.to_encoding()),
            version,
            reason,
        };

        if !self.attributes.keys().map(String::as_str).eq(tags.iter().copied()) {
            return Err(unrepresentable(format!(
                "{version} {} lines hold exactly {}",
                self.key,
                tags.join(",")
            )));
        }

        let mut values = Vec::with_capacity(tags.len());
        for (name, value) in &self.attributes {
            let encoded = encode_legacy_value(name, value)
                .ok_or_else(|| unrepresentable(format!("{name} contains '\"'")))?;
            values.push(encoded);
        }
        Ok(format!("{}={}", self.key, values.join(",")))
    }
}

/// Positional attributes of a structured line in the 3.x grammar.
fn legacy_tags(key: &str) -> &'static [&'static str] {
    if key == ALT_KEY || key == FILTER_KEY {
        &FILTER_TAGS
    } else {
        &ID_TAGS
    }
}

/// A `FILTER` line; `Description` is required
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterLine(StructuredLine);

impl FilterLine {
    /// # Errors
    ///
    /// Returns `HeaderError::MissingRequiredAttribute` if `id` is empty.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Result<Self, HeaderError> {
        StructuredLine::with_description(FILTER_KEY, id, description).map(Self)
    }

    /// # Errors
    ///
    /// Returns `HeaderError::MissingRequiredAttribute` without `ID` or `Description`.
    pub fn from_attributes(attributes: Attributes) -> Result<Self, HeaderError> {
        if !attributes.contains_key(DESCRIPTION) {
            return Err(HeaderError::missing(FILTER_KEY, DESCRIPTION));
        }
        StructuredLine::new(FILTER_KEY, attributes).map(Self)
    }

    /// # Errors
    ///
    /// Returns tokenizer errors or those of [`FilterLine::from_attributes`].
    pub fn parse(value: &str, version: FormatVersion) -> Result<Self, HeaderError> {
        Self::from_attributes(parse_tags(version, value, &FILTER_TAGS)?)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.0.id()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        self.0.description().unwrap_or_default()
    }

    #[must_use]
    pub fn line(&self) -> &StructuredLine {
        &self.0
    }
}

/// A `contig` line with its position in the header's sequence dictionary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContigLine {
    line: StructuredLine,
    index: usize,
}

impl ContigLine {
    /// # Errors
    ///
    /// Returns `HeaderError::MissingRequiredAttribute` without a leading `ID`.
    pub fn new(attributes: Attributes, index: usize) -> Result<Self, HeaderError> {
        let line = StructuredLine::new(CONTIG_KEY, attributes)?;
        Ok(Self { line, index })
    }

    /// # Errors
    ///
    /// Returns tokenizer errors or those of [`ContigLine::new`].
    pub fn parse(value: &str, version: FormatVersion, index: usize) -> Result<Self, HeaderError> {
        Self::new(parse_tags(version, value, &ID_TAGS)?, index)
    }

    /// Build a contig line carrying the attributes a VCF contig line defines.
    ///
    /// `assembly` overrides the record's own assembly when given.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MissingRequiredAttribute` if the record has no name.
    pub fn from_sequence_record(
        record: &SequenceRecord,
        index: usize,
        assembly: Option<&str>,
    ) -> Result<Self, HeaderError> {
        let mut attributes = Attributes::new();
        attributes.insert(ID.to_string(), record.name.clone());
        if record.has_known_length() {
            attributes.insert("length".to_string(), record.length.to_string());
        }
        if let Some(assembly) = assembly.or(record.assembly.as_deref()) {
            attributes.insert("assembly".to_string(), assembly.to_string());
        }
        if let Some(md5) = &record.md5 {
            attributes.insert("md5".to_string(), md5.clone());
        }
        if let Some(uri) = &record.uri {
            attributes.insert("URL".to_string(), uri.clone());
        }
        if let Some(species) = &record.species {
            attributes.insert("species".to_string(), species.clone());
        }
        Self::new(attributes, index)
    }

    /// Convert to a sequence record. Attributes other than `length`,
    /// `assembly`, `md5`, `URL`, and `species` are not carried over.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MalformedLine` if `length` is not an integer.
    pub fn to_sequence_record(&self) -> Result<SequenceRecord, HeaderError> {
        let length = match self.line.attribute("length") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                HeaderError::MalformedLine(format!(
                    "contig '{}' has invalid length '{raw}'",
                    self.id()
                ))
            })?,
            None => UNKNOWN_SEQUENCE_LENGTH,
        };

        let mut record = SequenceRecord::new(self.id(), length);
        record.assembly = self.line.attribute("assembly").map(str::to_string);
        record.md5 = self.line.attribute("md5").map(str::to_string);
        record.uri = self.line.attribute("URL").map(str::to_string);
        record.species = self.line.attribute("species").map(str::to_string);
        Ok(record)
    }

    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.line.id()
    }

    /// Position of this contig in the sequence dictionary
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn line(&self) -> &StructuredLine {
        &self.line
    }
}

/// An `INFO` or `FORMAT` line carrying `Number` and `Type`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundLine {
    kind: CompoundKind,
    line: StructuredLine,
    count: LineCount,
    value_type: ValueType,
}

impl CompoundLine {
    /// # Errors
    ///
    /// Returns `HeaderError::MissingRequiredAttribute` if `id` is empty.
    pub fn new(
        kind: CompoundKind,
        id: impl Into<String>,
        count: LineCount,
        value_type: ValueType,
        description: impl Into<String>,
    ) -> Result<Self, HeaderError> {
        let mut attributes = Attributes::new();
        attributes.insert(ID.to_string(), id.into());
        attributes.insert(NUMBER.to_string(), count.to_string());
        attributes.insert(TYPE.to_string(), value_type.to_string());
        attributes.insert(DESCRIPTION.to_string(), description.into());
        Self::from_attributes(kind, attributes)
    }

    /// Build from parsed attributes.
    ///
    /// `Number` is stored in its 4.x encoding whichever token was given. A Flag with a non-zero count is
    /// repaired to `Number=0`, and a missing `Description` is filled with
    /// [`PLACEHOLDER_DESCRIPTION`].
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::MissingRequiredAttribute` without `ID`, `Number`,
    /// or `Type`, and `HeaderError::MalformedLine` for invalid `Number` or `Type` values.
    pub fn from_attributes(kind: CompoundKind, attributes: Attributes) -> Result<Self, HeaderError> {
        let mut line = StructuredLine::new(kind.key(), attributes)?;

        let raw_count = line
            .attribute(NUMBER)
            .ok_or_else(|| HeaderError::missing(kind.key(), NUMBER))?;
        let mut count = LineCount::decode(raw_count)?;
        let value_type = ValueType::parse(
            line.attribute(TYPE)
                .ok_or_else(|| HeaderError::missing(kind.key(), TYPE))?,
        )?;

        if value_type == ValueType::Flag && count != LineCount::Fixed(0) {
            warn!(
                key = kind.key(),
                id = %line.id(),
                number = %count,
                "Flag header line has a non-zero Number, setting Number=0"
            );
            count = LineCount::Fixed(0);
        }
        line.set_attribute(NUMBER, count.to_string());

        if line.description().is_none() {
            line.set_attribute(DESCRIPTION, PLACEHOLDER_DESCRIPTION.to_string());
        }

        Ok(Self {
            kind,
            line,
            count,
            value_type,
        })
    }

    /// # Errors
    ///
    /// Returns tokenizer errors or those of [`CompoundLine::from_attributes`].
    pub fn parse(kind: CompoundKind, value: &str, version: FormatVersion) -> Result<Self, HeaderError> {
        Self::from_attributes(kind, parse_tags(version, value, &COMPOUND_TAGS)?)
    }

    #[must_use]
    pub fn kind(&self) -> CompoundKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.line.id()
    }

    #[must_use]
    pub fn count(&self) -> LineCount {
        self.count
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn description(&self) -> &str {
        self.line.description().unwrap_or(PLACEHOLDER_DESCRIPTION)
    }

    #[must_use]
    pub fn has_placeholder_description(&self) -> bool {
        self.description() == PLACEHOLDER_DESCRIPTION
    }

    #[must_use]
    pub fn line(&self) -> &StructuredLine {
        &self.line
    }

    /// A line with the same ID, `Number` and `Type`, and the given description.
    #[must_use]
    pub fn with_description(&self, description: &str) -> Self {
        let mut updated = self.clone();
        updated.line.set_attribute(DESCRIPTION, description.to_string());
        updated
    }

    /// A line with the same attributes, including `Source` and `Version`, but
    /// the given `Number` and `Type`.
    #[must_use]
    pub fn with_count_and_type(&self, count: LineCount, value_type: ValueType) -> Self {
        let mut updated = self.clone();
        updated.line.set_attribute(NUMBER, count.to_string());
        updated.line.set_attribute(TYPE, value_type.to_string());
        updated.count = count;
        updated.value_type = value_type;
        updated
    }

    /// The line as written in a header of `version`, with `-1` for an
    /// unbounded count in 3.x.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::VersionIncompatible` if a 3.x header cannot hold
    /// the line, for example one with a `Source` attribute.
    pub fn to_encoding_for(&self, version: FormatVersion) -> Result<String, HeaderError> {
        if version.uses_modern_grammar() {
            return Ok(self.line.to_encoding());
        }
        let mut line = self.line.clone();
        line.set_attribute(NUMBER, self.count.encode_for(version));
        line.to_legacy_encoding(&COMPOUND_TAGS, version)
    }
}

/// Any `##` metadata line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderLine {
    Plain(PlainLine),
    Structured(StructuredLine),
    Filter(FilterLine),
    Contig(ContigLine),
    Compound(CompoundLine),
}

impl HeaderLine {
    /// The version line for `version`.
    #[must_use]
    pub fn version_line(version: FormatVersion) -> Self {
        HeaderLine::Plain(PlainLine {
            key: version.format_key().to_string(),
            value: version.version_string().to_string(),
        })
    }

    /// # Errors
    ///
    /// See [`PlainLine::new`].
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Result<Self, HeaderError> {
        PlainLine::new(key, value).map(HeaderLine::Plain)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            HeaderLine::Plain(line) => line.key(),
            HeaderLine::Structured(line) => line.key(),
            HeaderLine::Filter(line) => line.line().key(),
            HeaderLine::Contig(line) => line.line().key(),
            HeaderLine::Compound(line) => line.line().key(),
        }
    }

    /// The `ID` of an ID-keyed line; `None` for plain lines.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.structured().map(StructuredLine::id)
    }

    #[must_use]
    pub fn is_id_line(&self) -> bool {
        !matches!(self, HeaderLine::Plain(_))
    }

    /// The attribute map of an ID-keyed line
    #[must_use]
    pub fn structured(&self) -> Option<&StructuredLine> {
        match self {
            HeaderLine::Plain(_) => None,
            HeaderLine::Structured(line) => Some(line),
            HeaderLine::Filter(line) => Some(line.line()),
            HeaderLine::Contig(line) => Some(line.line()),
            HeaderLine::Compound(line) => Some(line.line()),
        }
    }

    #[must_use]
    pub fn is_version_line(&self) -> bool {
        matches!(self, HeaderLine::Plain(line) if FormatVersion::is_version_line(line.key(), line.value()))
    }

    /// The version a version line declares.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::UnknownVersion` if the declared version is not
    /// recognized; `Ok(None)` for lines that are not version lines.
    pub fn declared_version(&self) -> Result<Option<FormatVersion>, HeaderError> {
        match self {
            HeaderLine::Plain(line) if FormatVersion::is_version_line(line.key(), line.value()) => {
                FormatVersion::from_version_string(line.value()).map(Some)
            }
            _ => Ok(None),
        }
    }

    #[must_use]
    pub fn as_contig(&self) -> Option<&ContigLine> {
        match self {
            HeaderLine::Contig(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_compound(&self) -> Option<&CompoundLine> {
        match self {
            HeaderLine::Compound(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_filter(&self) -> Option<&FilterLine> {
        match self {
            HeaderLine::Filter(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_plain(&self) -> Option<&PlainLine> {
        match self {
            HeaderLine::Plain(line) => Some(line),
            _ => None,
        }
    }

    /// The line without its leading `##`.
    #[must_use]
    pub fn to_encoding(&self) -> String {
        match self {
            HeaderLine::Plain(line) => line.to_encoding(),
            HeaderLine::Structured(line) => line.to_encoding(),
            HeaderLine::Filter(line) => line.line().to_encoding(),
            HeaderLine::Contig(line) => line.line().to_encoding(),
            HeaderLine::Compound(line) => line.line().to_encoding(),
        }
    }

    /// The line without its leading `##`, in the grammar of `version`.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::VersionIncompatible` if a 3.x header cannot hold the line.
    pub fn to_encoding_for(&self, version: FormatVersion) -> Result<String, HeaderError> {
        match self {
            HeaderLine::Plain(line) => Ok(line.to_encoding()),
            HeaderLine::Compound(line) => line.to_encoding_for(version),
            HeaderLine::Structured(line) => line.to_encoding_for(version),
            HeaderLine::Filter(line) => line.line().to_encoding_for(version),
            HeaderLine::Contig(line) => line.line().to_encoding_for(version),
        }
    }
}

impl fmt::Display for HeaderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "##{}", self.to_encoding())
    }
}

impl From<CompoundLine> for HeaderLine {
    fn from(line: CompoundLine) -> Self {
        HeaderLine::Compound(line)
    }
}

impl From<FilterLine> for HeaderLine {
    fn from(line: FilterLine) -> Self {
        HeaderLine::Filter(line)
    }
}

impl From<ContigLine> for HeaderLine {
    fn from(line: ContigLine) -> Self {
        HeaderLine::Contig(line)
    }
}

impl From<StructuredLine> for HeaderLine {
    fn from(line: StructuredLine) -> Self {
        HeaderLine::Structured(line)
    }
}

impl From<PlainLine> for HeaderLine {
    fn from(line: PlainLine) -> Self {
        HeaderLine::Plain(line)
    }
}
