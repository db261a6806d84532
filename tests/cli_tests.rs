//! Command-line tests for the vcf-header binary
//!
//! Each test writes small VCF headers to a temporary directory and runs the
//! binary against them, checking exit status and output.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER_A: &str = "##fileformat=VCFv4.2
##FILTER=<ID=q10,Description=\"Quality below 10\">
##INFO=<ID=AF,Number=1,Type=Float,Description=\"Allele frequency\">
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">
##contig=<ID=chr1,length=1000>
##contig=<ID=chr2,length=2000>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA12878
chr1\t100\t.\tA\tG\t50\tPASS\tDP=10;AF=0.5\tGT\t0/1
";

const HEADER_B: &str = "##fileformat=VCFv4.3
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">
##INFO=<ID=DP,Number=1,Type=Float,Description=\"Total depth\">
##contig=<ID=chr1,length=1000>
##contig=<ID=chr2,length=2000>
##contig=<ID=chr3,length=3000>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
";

const DISJOINT: &str = "##fileformat=VCFv4.2
##contig=<ID=chr8,length=8000>
##contig=<ID=chr9,length=9000>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write test input");
    path
}

fn vcf_header() -> Command {
    Command::cargo_bin("vcf-header").expect("Binary should be built")
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("Temp paths should be UTF-8")
}

/// Test that a valid header reports its version and line counts
#[test]
fn test_validate_reports_summary() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "a.vcf", HEADER_A);

    vcf_header()
        .args(["validate", arg(&input)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version: VCFv4.2"))
        .stdout(predicate::str::contains("INFO lines: 2"))
        .stdout(predicate::str::contains("Contig lines: 2"))
        .stdout(predicate::str::contains("Samples: 1"));
}

/// Test that validating against a newer version reports the offending lines
#[test]
fn test_validate_against_target_version() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "old.vcf",
        "##fileformat=VCFv4.2\n##INFO=<ID=1kg.AF,Number=A,Type=Float,Description=\"Frequency\">\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
    );

    vcf_header()
        .args(["validate", arg(&input), "--target-version", "4.3"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("1kg.AF"))
        .stderr(predicate::str::contains("not valid for VCFv4.3"));

    vcf_header()
        .args(["validate", arg(&input), "--target-version", "4.3", "--lenient"])
        .assert()
        .success();
}

/// Test JSON output of validate
#[test]
fn test_validate_json() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "a.vcf", HEADER_A);

    vcf_header()
        .args(["--format", "json", "validate", arg(&input)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\": \"VCFv4.2\""))
        .stdout(predicate::str::contains("\"valid\": true"))
        .stdout(predicate::str::contains("NA12878"));
}

/// Test that a malformed header line fails validation
#[test]
fn test_validate_malformed_line() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "bad.vcf",
        "##fileformat=VCFv4.2\n##INFO=<ID=DP,Number=1,Type=Integer,Description=\"unclosed>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
    );

    vcf_header()
        .args(["validate", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read VCF header"));
}

/// Test that headers are read from stdin
#[test]
fn test_validate_stdin() {
    vcf_header()
        .args(["validate", "-"])
        .write_stdin(HEADER_B)
        .assert()
        .success()
        .stdout(predicate::str::contains("Version: VCFv4.3"));
}

/// Test merging two compatible headers
#[test]
fn test_merge_headers() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.vcf", HEADER_A);
    let b = write(&dir, "b.vcf", HEADER_B);

    vcf_header()
        .args(["merge", arg(&a), arg(&b)])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("##fileformat=VCFv4.3\n"))
        .stdout(predicate::str::contains(
            "##INFO=<ID=AF,Number=.,Type=Float,Description=\"Allele frequency\">",
        ))
        .stdout(predicate::str::contains(
            "##INFO=<ID=DP,Number=1,Type=Float,Description=\"Total depth\">",
        ))
        .stdout(predicate::str::contains("##contig=<ID=chr3,length=3000>"))
        .stdout(predicate::str::contains("##FILTER=<ID=q10"));
}

/// Test writing the merged header to a file
#[test]
fn test_merge_to_output_file() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.vcf", HEADER_A);
    let output = dir.path().join("merged.hdr");

    vcf_header()
        .args(["merge", arg(&a), "--output", arg(&output)])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let merged = fs::read_to_string(&output).unwrap();
    assert!(merged.starts_with("##fileformat=VCFv4.2\n"));
    assert!(merged.ends_with("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n"));
}

/// Test that disjoint sequence dictionaries cannot be merged
#[test]
fn test_merge_disjoint_dictionaries_fails() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.vcf", HEADER_A);
    let c = write(&dir, "c.vcf", DISJOINT);

    vcf_header()
        .args(["merge", arg(&a), arg(&c)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incompatible headers"));
}

/// Test that headers older than VCFv4.2 cannot be merged
#[test]
fn test_merge_old_version_fails() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.vcf", HEADER_A);
    let old = write(
        &dir,
        "old.vcf",
        "##fileformat=VCFv4.1\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
    );

    vcf_header()
        .args(["merge", arg(&a), arg(&old)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VCFv4.2 or later"));
}

/// Test listing contigs as TSV
#[test]
fn test_contigs_tsv() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "a.vcf", HEADER_A);

    vcf_header()
        .args(["--format", "tsv", "contigs", arg(&input)])
        .assert()
        .success()
        .stdout(predicate::str::contains("index\tname\tlength"))
        .stdout(predicate::str::contains("0\tchr1\t1000"))
        .stdout(predicate::str::contains("1\tchr2\t2000"));
}

/// Test replacing contigs from a Picard dictionary
#[test]
fn test_contigs_replace_from_dict() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "a.vcf", HEADER_A);
    let dict = write(
        &dir,
        "ref.dict",
        "@HD\tVN:1.6\n@SQ\tSN:chrX\tLN:5000\tM5:0123456789abcdef0123456789abcdef\n@SQ\tSN:chrY\tLN:6000\n",
    );
    let reference = dir.path().join("ucsc.hg19.fasta");

    vcf_header()
        .args([
            "contigs",
            arg(&input),
            "--replace-from",
            arg(&dict),
            "--reference",
            arg(&reference),
            "--reference-name-only",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "##contig=<ID=chrX,length=5000,assembly=hg19,md5=0123456789abcdef0123456789abcdef>",
        ))
        .stdout(predicate::str::contains("##reference=ucsc.hg19"))
        .stdout(predicate::str::contains("ID=chr1,").not());
}
