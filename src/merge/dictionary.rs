//! Sequence dictionary compatibility.
//!
//! Two dictionaries are compared by the contigs they share by name:
//!
//! | Result | Meaning |
//! |--------|---------|
//! | `Identical` | same contigs, same order |
//! | `Superset` | the first contains every contig of the second |
//! | `CommonSubset` | some contigs shared, neither contains the other |
//! | `DifferentIndices` | shared contigs in the same relative order but at different positions |
//! | `OutOfOrder` | shared contigs in a different relative order |
//! | `UnequalCommonContigs` | a shared name with different lengths |
//! | `NoCommonContigs` | nothing shared |
//! | `NonCanonicalHumanOrder` | a human dictionary sorted as chr1, chr10, chr2 |

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::core::contig::{SequenceDictionary, SequenceRecord};
use crate::error::HeaderError;

/// Dictionaries longer than this are cut short in error messages
const MAX_MESSAGE_DICTIONARY_CHARS: usize = 2000;

/// (name, length) of chr1, chr2 and chr10 in the hg18, hg19, b36 and b37 builds
const HUMAN_CHR1: [(&str, u64); 4] = [
    ("chr1", 247_249_719),
    ("chr1", 249_250_621),
    ("1", 247_249_719),
    ("1", 249_250_621),
];
const HUMAN_CHR2: [(&str, u64); 4] = [
    ("chr2", 242_951_149),
    ("chr2", 243_199_373),
    ("2", 242_951_149),
    ("2", 243_199_373),
];
const HUMAN_CHR10: [(&str, u64); 4] = [
    ("chr10", 135_374_737),
    ("chr10", 135_534_747),
    ("10", 135_374_737),
    ("10", 135_534_747),
];

/// How two sequence dictionaries relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryCompatibility {
    Identical,
    CommonSubset,
    Superset,
    NoCommonContigs,
    UnequalCommonContigs,
    NonCanonicalHumanOrder,
    OutOfOrder,
    DifferentIndices,
}

impl fmt::Display for DictionaryCompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DictionaryCompatibility::Identical => "identical",
            DictionaryCompatibility::CommonSubset => "common subset",
            DictionaryCompatibility::Superset => "superset",
            DictionaryCompatibility::NoCommonContigs => "no common contigs",
            DictionaryCompatibility::UnequalCommonContigs => "common contigs with unequal lengths",
            DictionaryCompatibility::NonCanonicalHumanOrder => "non-canonical human contig order",
            DictionaryCompatibility::OutOfOrder => "common contigs out of order",
            DictionaryCompatibility::DifferentIndices => "common contigs at different indices",
        };
        write!(f, "{s}")
    }
}

/// Classify how `first` relates to `second`.
///
/// With `check_order` unset, contig order is ignored: neither
/// `NonCanonicalHumanOrder`, `OutOfOrder`, nor `DifferentIndices` is returned.
#[must_use]
pub fn compare_dictionaries(
    first: &SequenceDictionary,
    second: &SequenceDictionary,
    check_order: bool,
) -> DictionaryCompatibility {
    if check_order && (has_non_canonical_human_order(first) || has_non_canonical_human_order(second))
    {
        return DictionaryCompatibility::NonCanonicalHumanOrder;
    }

    let common: Vec<&SequenceRecord> = first
        .iter()
        .filter(|record| second.get(&record.name).is_some())
        .collect();
    if common.is_empty() {
        return DictionaryCompatibility::NoCommonContigs;
    }

    let lengths_agree = common.iter().all(|record| {
        second
            .get(&record.name)
            .is_some_and(|other| record.is_equivalent(other))
    });
    if !lengths_agree {
        return DictionaryCompatibility::UnequalCommonContigs;
    }

    let same_relative_order = common_names_in_order(second, first)
        .eq(common.iter().map(|record| record.name.as_str()));

    if check_order && !same_relative_order {
        DictionaryCompatibility::OutOfOrder
    } else if same_relative_order && common.len() == first.len() && common.len() == second.len() {
        DictionaryCompatibility::Identical
    } else if check_order && !common_contigs_at_same_indices(&common, first, second) {
        DictionaryCompatibility::DifferentIndices
    } else if is_superset(first, second) {
        DictionaryCompatibility::Superset
    } else {
        DictionaryCompatibility::CommonSubset
    }
}

/// Names in `dictionary` that also appear in `other`, in `dictionary` order
fn common_names_in_order<'a>(
    dictionary: &'a SequenceDictionary,
    other: &'a SequenceDictionary,
) -> impl Iterator<Item = &'a str> {
    dictionary
        .names()
        .filter(move |name| other.get(name).is_some())
}

fn common_contigs_at_same_indices(
    common: &[&SequenceRecord],
    first: &SequenceDictionary,
    second: &SequenceDictionary,
) -> bool {
    common
        .iter()
        .all(|record| first.index_of(&record.name) == second.index_of(&record.name))
}

/// Every record of `second` is in `first` with an equivalent length.
fn is_superset(first: &SequenceDictionary, second: &SequenceDictionary) -> bool {
    second.iter().all(|record| {
        first
            .get(&record.name)
            .is_some_and(|other| other.is_equivalent(record))
    })
}

/// A recognized human dictionary whose chr1, chr2, and chr10 are not in
/// that order, as produced by sorting contig names lexicographically.
fn has_non_canonical_human_order(dictionary: &SequenceDictionary) -> bool {
    let position = |known: &[(&str, u64)]| {
        dictionary.iter().position(|record| {
            known
                .iter()
                .any(|&(name, length)| record.name == name && record.length == length)
        })
    };

    match (
        position(&HUMAN_CHR1),
        position(&HUMAN_CHR2),
        position(&HUMAN_CHR10),
    ) {
        (Some(chr1), Some(chr2), Some(chr10)) => !(chr1 < chr2 && chr2 < chr10),
        _ => false,
    }
}

/// Reduce a set of dictionaries to one that every input is compatible with.
///
/// Dictionaries are visited largest first. Each one must be identical to, or
/// contained in, the running candidate; a dictionary that contains the
/// candidate replaces it. `sources` pairs each dictionary with a label used
/// in error messages.
///
/// # Errors
///
/// Returns `HeaderError::IncompatibleHeaders`, naming both dictionaries, when
/// neither of two dictionaries contains the other.
pub fn common_dictionary<'a>(
    sources: impl IntoIterator<Item = (String, &'a SequenceDictionary)>,
) -> Result<Option<SequenceDictionary>, HeaderError> {
    let mut sources: Vec<(String, &SequenceDictionary)> = sources.into_iter().collect();
    // Stable, so equally sized dictionaries keep input order
    sources.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut candidate: Option<(String, &SequenceDictionary)> = None;
    for (label, dictionary) in sources {
        let (candidate_label, current) = match &candidate {
            Some((candidate_label, current)) => (candidate_label.clone(), *current),
            None => {
                candidate = Some((label, dictionary));
                continue;
            }
        };

        let compatibility = compare_dictionaries(current, dictionary, true);
        match compatibility {
            DictionaryCompatibility::Identical | DictionaryCompatibility::Superset => {}
            DictionaryCompatibility::CommonSubset | DictionaryCompatibility::DifferentIndices => {
                if compare_dictionaries(current, dictionary, false)
                    == DictionaryCompatibility::Superset
                {
                    continue;
                }
                if compare_dictionaries(dictionary, current, false)
                    == DictionaryCompatibility::Superset
                {
                    debug!(
                        from = %candidate_label,
                        to = %label,
                        "Adopting larger sequence dictionary"
                    );
                    candidate = Some((label, dictionary));
                    continue;
                }
                return Err(incompatible(compatibility, &candidate_label, current, &label, dictionary));
            }
            DictionaryCompatibility::NoCommonContigs
            | DictionaryCompatibility::UnequalCommonContigs
            | DictionaryCompatibility::NonCanonicalHumanOrder
            | DictionaryCompatibility::OutOfOrder => {
                return Err(incompatible(compatibility, &candidate_label, current, &label, dictionary));
            }
        }
    }

    Ok(candidate.map(|(_, dictionary)| dictionary.clone()))
}

fn incompatible(
    compatibility: DictionaryCompatibility,
    common_label: &str,
    common: &SequenceDictionary,
    source_label: &str,
    source: &SequenceDictionary,
) -> HeaderError {
    HeaderError::IncompatibleHeaders(format!(
        "sequence dictionary of {source_label} is incompatible with that of {common_label} ({compatibility}): {source_label} has {}, {common_label} has {}",
        abbreviate(&source.to_string()),
        abbreviate(&common.to_string()),
    ))
}

fn abbreviate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_DICTIONARY_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_MESSAGE_DICTIONARY_CHARS).collect();
    short.push_str("...");
    short
}
