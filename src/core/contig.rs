use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Length recorded for a sequence whose length is not known
pub const UNKNOWN_SEQUENCE_LENGTH: u64 = 0;

/// A single sequence in a sequence dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// Sequence name (SN tag in SAM, ID in a VCF contig line)
    pub name: String,

    /// Sequence length, or [`UNKNOWN_SEQUENCE_LENGTH`]
    pub length: u64,

    /// MD5 checksum of the sequence, lowercase hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    /// Assembly identifier (AS tag in SAM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,

    /// URI where the sequence can be retrieved (UR tag in SAM, URL in VCF)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Species (SP tag in SAM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
            md5: None,
            assembly: None,
            uri: None,
            species: None,
        }
    }

    #[must_use]
    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = Some(md5.into());
        self
    }

    #[must_use]
    pub fn with_assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }

    #[must_use]
    pub fn has_known_length(&self) -> bool {
        self.length != UNKNOWN_SEQUENCE_LENGTH
    }

    /// Same name, and same length unless either length is unknown.
    #[must_use]
    pub fn is_equivalent(&self, other: &SequenceRecord) -> bool {
        self.name == other.name
            && (self.length == other.length
                || !self.has_known_length()
                || !other.has_known_length())
    }
}

/// An ordered list of uniquely named sequences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceDictionary {
    records: Vec<SequenceRecord>,

    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SequenceDictionary {
    /// Build a dictionary; later records with an already-seen name are ignored.
    #[must_use]
    pub fn new(records: Vec<SequenceRecord>) -> Self {
        let mut dictionary = Self::default();
        for record in records {
            dictionary.push(record);
        }
        dictionary
    }

    /// Append a record, returning `false` if its name is already present.
    pub fn push(&mut self, record: SequenceRecord) -> bool {
        if self.index.contains_key(&record.name) {
            return false;
        }
        self.index.insert(record.name.clone(), self.records.len());
        self.records.push(record);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequenceRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SequenceRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    /// Position of the named sequence in the dictionary
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }
}

impl fmt::Display for SequenceDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", record.name, record.length)?;
        }
        write!(f, "]")
    }
}
