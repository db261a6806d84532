use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::header::Header;
use crate::core::types::HeaderOptions;
use crate::merge::{merge_into_header, MergeOptions};
use crate::parsing::vcf::{format_header, read_header};

#[derive(Args)]
pub struct MergeArgs {
    /// Input VCF files (.vcf, .vcf.gz)
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Write the merged header here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log a warning for every conflicting header line
    #[arg(long)]
    pub warnings: bool,

    /// Log lines that are not valid for their version instead of failing
    #[arg(long)]
    pub lenient: bool,
}

/// Execute merge subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read or the headers cannot be merged.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MergeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let header_options = if args.lenient {
        HeaderOptions::lenient()
    } else {
        HeaderOptions::default()
    };

    let mut headers = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let header = read_header(path, header_options)
            .with_context(|| format!("Failed to read VCF header from {}", path.display()))?;
        if verbose {
            eprintln!(
                "{}: {} with {} header lines",
                path.display(),
                header.version(),
                header.metadata().len()
            );
        }
        headers.push(header);
    }

    let options = MergeOptions::default()
        .with_warnings(args.warnings)
        .with_header_options(header_options);
    let merged = merge_into_header(&headers, options).context("Failed to merge headers")?;

    if verbose {
        eprintln!(
            "Merged {} headers into {} lines ({} contigs)",
            headers.len(),
            merged.metadata().len(),
            merged.contig_lines().len()
        );
    }

    let rendered = match format {
        OutputFormat::Text => format_header(&merged)?,
        OutputFormat::Json => render_json(&args, &merged)?,
        OutputFormat::Tsv => render_tsv(&merged),
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(rendered.as_bytes())?;
            writer.flush()?;
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn render_json(args: &MergeArgs, merged: &Header) -> anyhow::Result<String> {
    let lines: Vec<String> = merged
        .sorted_lines()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let contigs: Vec<&str> = merged.contig_lines().into_iter().map(|c| c.id()).collect();

    let output = serde_json::json!({
        "inputs": args.inputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "version": merged.version().to_string(),
        "line_count": lines.len(),
        "contigs": contigs,
        "lines": lines,
    });

    let mut text = serde_json::to_string_pretty(&output)?;
    text.push('\n');
    Ok(text)
}

fn render_tsv(merged: &Header) -> String {
    let mut text = String::from("key\tid\tline\n");
    for line in merged.sorted_lines() {
        text.push_str(&format!(
            "{}\t{}\t{}\n",
            line.key(),
            line.id().unwrap_or("."),
            line
        ));
    }
    text
}
