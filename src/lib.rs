//! # vcf-header
//!
//! A library for parsing, validating, and merging the metadata header of VCF files.
//!
//! A VCF header is a list of typed `##` declarations (contig, FILTER, INFO,
//! FORMAT, ALT, PEDIGREE, META, and free-form lines) governed by the grammar
//! of the version named in its `##fileformat` line, followed by the `#CHROM`
//! column line naming the samples.
//!
//! ## Features
//!
//! - **Version-aware parsing**: VCFv3.2 through VCFv4.3, legacy and modern tag grammars
//! - **Typed lines**: INFO/FORMAT counts and types, FILTER, contig, ALT, META, SAMPLE, PEDIGREE
//! - **Validation**: per-version rules, strict by default or logged under lenient options
//! - **Forward-only versioning**: a header can move to a newer version, never an older one
//! - **Merging**: reconciles conflicting INFO/FORMAT lines and sequence dictionaries
//! - **Contig replacement**: from Picard `.dict`, SAM/BAM/CRAM, or another VCF
//!
//! ## Example
//!
//! ```rust,no_run
//! use vcf_header::parsing::vcf::parse_header_text;
//! use vcf_header::{FormatVersion, HeaderOptions};
//!
//! let text = "##fileformat=VCFv4.2\n\
//!             ##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">\n\
//!             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
//! let header = parse_header_text(text, HeaderOptions::default()).unwrap();
//!
//! assert_eq!(header.version(), FormatVersion::Vcf4_2);
//! assert!(header.info_line("DP").is_some());
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Header line model, metadata collection, header, and version rules
//! - [`parsing`]: Tag tokenizer, VCF header reader/writer, and dictionary readers
//! - [`merge`]: Merging headers and reconciling sequence dictionaries
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod error;
pub mod merge;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::contig::{SequenceDictionary, SequenceRecord};
pub use core::header::Header;
pub use core::line::{CompoundLine, ContigLine, FilterLine, HeaderLine, PlainLine, StructuredLine};
pub use core::types::*;
pub use core::version::FormatVersion;
pub use error::HeaderError;
pub use merge::{merge_headers, MergeOptions};
