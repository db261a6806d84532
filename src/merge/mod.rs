//! Merging the headers of several VCF files into one.
//!
//! - [`engine::merge_headers`]: merge metadata lines and sequence dictionaries
//! - [`dictionary::compare_dictionaries`]: classify how two dictionaries relate
//!
//! ## Algorithm
//!
//! 1. Every input must be at least VCFv4.2; the merged header takes the newest version.
//! 2. Sequence dictionaries are reduced, largest first, to one that contains all others.
//! 3. Lines are merged header by header in sorted order:
//!    - new identities are added
//!    - INFO/FORMAT conflicts widen `Number` to `.` and promote `Integer` to `Float`
//!    - other ID lines keep the first seen
//!    - plain lines with different values are all kept
//! 4. The version line, merged lines and one contig line per dictionary entry
//!    form a freshly validated header.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vcf_header::merge::{merge_headers, MergeOptions};
//! use vcf_header::parsing::vcf::read_header;
//! use vcf_header::HeaderOptions;
//!
//! let a = read_header("a.vcf".as_ref(), HeaderOptions::default()).unwrap();
//! let b = read_header("b.vcf".as_ref(), HeaderOptions::default()).unwrap();
//!
//! for line in merge_headers(&[a, b], MergeOptions::default()).unwrap() {
//!     println!("{line}");
//! }
//! ```

pub mod dictionary;
pub mod engine;

pub use dictionary::{compare_dictionaries, DictionaryCompatibility};
pub use engine::{merge_headers, merge_into_header, MergeOptions};
