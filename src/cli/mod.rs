//! Command-line interface for vcf-header.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **validate**: Parse a VCF header and check it against a format version
//! - **merge**: Merge the headers of several VCF files into one
//! - **contigs**: List a header's contigs, or replace them from a sequence dictionary
//!
//! ## Usage
//!
//! ```text
//! # Check a header, reporting lines that VCFv4.3 would reject
//! vcf-header validate calls.vcf.gz --target-version 4.3
//!
//! # Pipe a header from bcftools
//! bcftools view -h calls.bcf | vcf-header validate -
//!
//! # Merge headers, logging every conflicting line
//! vcf-header merge a.vcf b.vcf.gz --warnings -o merged.hdr
//!
//! # Swap contig lines for those of a reference dictionary
//! vcf-header contigs calls.vcf --replace-from GRCh38.dict
//! ```

use clap::{Parser, Subcommand};

pub mod contigs;
pub mod merge;
pub mod validate;

#[derive(Parser)]
#[command(name = "vcf-header")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Parse, validate, and merge VCF headers")]
#[command(
    long_about = "vcf-header reads the metadata header of VCF files.\n\nIt can:\n- Validate header lines against a VCF version\n- Merge headers from several files, reconciling INFO/FORMAT conflicts and sequence dictionaries\n- List or replace the contig lines of a header"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the header of a VCF file
    Validate(validate::ValidateArgs),

    /// Merge the headers of several VCF files
    Merge(merge::MergeArgs),

    /// List or replace the contig lines of a VCF header
    Contigs(contigs::ContigsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
