use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::contig::SequenceDictionary;
use crate::core::reference::with_updated_contigs;
use crate::core::types::HeaderOptions;
use crate::parsing::read_sequence_dictionary;
use crate::parsing::vcf::{format_header, read_header};

#[derive(Args)]
pub struct ContigsArgs {
    /// Input VCF file (.vcf, .vcf.gz); use '-' for stdin
    #[arg(required = true)]
    pub input: PathBuf,

    /// Replace the contig lines with this sequence dictionary
    /// (.dict, SAM, BAM, CRAM, or another VCF)
    #[arg(long)]
    pub replace_from: Option<PathBuf>,

    /// Reference FASTA recorded in the ##reference line when replacing contigs;
    /// its file name also sets the contig assembly (e.g. hg19, b37)
    #[arg(long, requires = "replace_from")]
    pub reference: Option<PathBuf>,

    /// Record only the reference file stem, not a file:// URL
    #[arg(long, requires = "reference")]
    pub reference_name_only: bool,

    /// Log lines that are not valid for the header's version instead of failing
    #[arg(long)]
    pub lenient: bool,
}

/// Execute contigs subcommand
///
/// # Errors
///
/// Returns an error if the header or dictionary cannot be read, or if a
/// replacement contig is not valid for the header's version.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ContigsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let options = if args.lenient {
        HeaderOptions::lenient()
    } else {
        HeaderOptions::default()
    };
    let header = read_header(&args.input, options)
        .with_context(|| format!("Failed to read VCF header from {}", args.input.display()))?;

    let Some(source) = &args.replace_from else {
        let dictionary = header.sequence_dictionary()?.unwrap_or_default();
        if verbose {
            eprintln!("{} contigs in {}", dictionary.len(), args.input.display());
        }
        return print_dictionary(&dictionary, format);
    };

    let dictionary = read_sequence_dictionary(source)
        .with_context(|| format!("Failed to read sequence dictionary from {}", source.display()))?;
    if verbose {
        eprintln!(
            "Replacing {} contigs with {} from {}",
            header.contig_lines().len(),
            dictionary.len(),
            source.display()
        );
    }

    let updated = with_updated_contigs(
        &header,
        &dictionary,
        args.reference.as_deref(),
        args.reference_name_only,
    )?;

    match format {
        OutputFormat::Text => print!("{}", format_header(&updated)?),
        OutputFormat::Json | OutputFormat::Tsv => {
            let replaced = updated.sequence_dictionary()?.unwrap_or_default();
            print_dictionary(&replaced, format)?;
        }
    }
    Ok(())
}

fn print_dictionary(dictionary: &SequenceDictionary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print_text(dictionary),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "contig_count": dictionary.len(),
                "contigs": dictionary.records(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => print_tsv(dictionary),
    }
    Ok(())
}

fn print_text(dictionary: &SequenceDictionary) {
    if dictionary.is_empty() {
        println!("No contig lines");
        return;
    }

    println!("{:<6} {:<24} {:>12}  {:<32}  Assembly", "Index", "Name", "Length", "MD5");
    println!("{}", "-".repeat(90));
    for (index, record) in dictionary.iter().enumerate() {
        let length = if record.has_known_length() {
            record.length.to_string()
        } else {
            "unknown".to_string()
        };
        println!(
            "{:<6} {:<24} {:>12}  {:<32}  {}",
            index,
            record.name,
            length,
            record.md5.as_deref().unwrap_or("-"),
            record.assembly.as_deref().unwrap_or("-"),
        );
    }
}

fn print_tsv(dictionary: &SequenceDictionary) {
    println!("index\tname\tlength\tmd5\tassembly");
    for (index, record) in dictionary.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            index,
            record.name,
            record.length,
            record.md5.as_deref().unwrap_or(""),
            record.assembly.as_deref().unwrap_or(""),
        );
    }
}
