use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::header::Header;
use crate::core::types::HeaderOptions;
use crate::core::validation::ValidationFailure;
use crate::core::version::FormatVersion;
use crate::parsing::vcf::read_header;

#[derive(Args)]
pub struct ValidateArgs {
    /// Input VCF file (.vcf, .vcf.gz); use '-' for stdin
    #[arg(required = true)]
    pub input: PathBuf,

    /// Log lines that are not valid for the header's version instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Also check every line against this version (e.g. 4.3 or VCFv4.3)
    #[arg(long)]
    pub target_version: Option<FormatVersion>,
}

/// Line counts of a parsed header
struct HeaderSummary {
    info: usize,
    format: usize,
    filter: usize,
    contig: usize,
    other: usize,
}

impl HeaderSummary {
    fn of(header: &Header) -> Self {
        Self {
            info: header.info_lines().count(),
            format: header.format_lines().count(),
            filter: header.filter_lines().count(),
            contig: header.contig_lines().len(),
            other: header.other_lines().count(),
        }
    }
}

/// Execute validate subcommand
///
/// # Errors
///
/// Returns an error if the header cannot be read, or if a line is not valid
/// for the target version and `--lenient` was not given.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ValidateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let options = if args.lenient {
        HeaderOptions::lenient()
    } else {
        HeaderOptions::default()
    };
    let header = read_header(&args.input, options)
        .with_context(|| format!("Failed to read VCF header from {}", args.input.display()))?;

    if verbose {
        eprintln!(
            "Parsed {} header lines and {} samples from {}",
            header.metadata().len(),
            header.sample_count(),
            args.input.display()
        );
    }

    let target = args.target_version.unwrap_or(header.version());
    let failures = header.validation_failures(target);
    let summary = HeaderSummary::of(&header);

    match format {
        OutputFormat::Text => print_text(&args, &header, &summary, target, &failures),
        OutputFormat::Json => print_json(&args, &header, &summary, target, &failures)?,
        OutputFormat::Tsv => print_tsv(&failures),
    }

    if !failures.is_empty() && !args.lenient {
        anyhow::bail!(
            "{} header line(s) are not valid for {target}",
            failures.len()
        );
    }
    Ok(())
}

fn print_text(
    args: &ValidateArgs,
    header: &Header,
    summary: &HeaderSummary,
    target: FormatVersion,
    failures: &[ValidationFailure],
) {
    println!("Header Validation");
    println!("{}", "=".repeat(60));

    println!("\nInput: {}", args.input.display());
    println!("  Version: {}", header.version());
    println!("  INFO lines: {}", summary.info);
    println!("  FORMAT lines: {}", summary.format);
    println!("  FILTER lines: {}", summary.filter);
    println!("  Contig lines: {}", summary.contig);
    println!("  Other lines: {}", summary.other);
    println!("  Samples: {}", header.sample_count());
    if !header.samples_were_already_sorted() {
        println!("  Samples are not in sorted order");
    }

    if failures.is_empty() {
        println!("\nAll lines are valid for {target}");
        return;
    }

    println!("\nLines not valid for {target}:");
    for failure in failures {
        println!("  {}", failure.line);
        println!("    {}", failure.reason);
    }
}

fn print_json(
    args: &ValidateArgs,
    header: &Header,
    summary: &HeaderSummary,
    target: FormatVersion,
    failures: &[ValidationFailure],
) -> anyhow::Result<()> {
    let failures: Vec<_> = failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "line": f.line,
                "reason": f.reason,
            })
        })
        .collect();

    let output = serde_json::json!({
        "input": args.input.display().to_string(),
        "version": header.version().to_string(),
        "target_version": target.to_string(),
        "valid": failures.is_empty(),
        "line_counts": {
            "info": summary.info,
            "format": summary.format,
            "filter": summary.filter,
            "contig": summary.contig,
            "other": summary.other,
        },
        "samples": header.samples(),
        "failures": failures,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(failures: &[ValidationFailure]) {
    println!("version\tline\treason");
    for failure in failures {
        println!("{}\t{}\t{}", failure.version, failure.line, failure.reason);
    }
}
