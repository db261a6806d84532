//! Core data model for VCF header metadata.
//!
//! - [`version::FormatVersion`]: the known format versions and their ordering
//! - [`line::HeaderLine`]: a single `##` metadata line in one of its typed forms
//! - [`metadata::MetadataCollection`]: de-duplicated storage for a header's lines
//! - [`header::Header`]: the aggregate of metadata lines and sample names
//! - [`validation`]: which constructs are permitted at which version
//! - [`contig::SequenceDictionary`]: the ordered contigs a header declares
//!
//! ## Line kinds
//!
//! | Key | Kind | Identity |
//! |-----|------|----------|
//! | `fileformat` / `format` | version line | unique per header |
//! | `INFO`, `FORMAT` | [`line::CompoundLine`] | key + ID |
//! | `FILTER` | [`line::FilterLine`] | key + ID |
//! | `contig` | [`line::ContigLine`] | key + ID, plus a contig index |
//! | `ALT`, `META`, `SAMPLE`, `PEDIGREE`, other `<ID=...>` | [`line::StructuredLine`] | key + ID |
//! | anything else | [`line::PlainLine`] | key + full text |
//!
//! A header's version only moves forward: adding a newer version line
//! re-validates every existing line against the newer version, and adding an
//! older one is an error.

pub mod contig;
pub mod header;
pub mod line;
pub mod metadata;
pub mod reference;
pub mod types;
pub mod validation;
pub mod version;
