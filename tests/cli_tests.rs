//! CLI tests driving the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_partition(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn genmerge() -> Command {
    Command::cargo_bin("genmerge").unwrap()
}

#[test]
fn test_merge_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_partition(&dir, "a.tsv", "#chrom\tpos\tv\nchr1\t1\ta\nchr1\t9\ta\n");
    let b = write_partition(&dir, "b.tsv", "#chrom\tpos\tv\nchr1\t5\tb\nchr2\t2\tb\n");

    genmerge()
        .args(["merge", &a, &b])
        .assert()
        .success()
        .stdout(
            "chrom\tpos\tv\nchr1\t1\ta\nchr1\t5\tb\nchr1\t9\ta\nchr2\t2\tb\n",
        );
}

#[test]
fn test_merge_with_seek() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_partition(&dir, "a.tsv", "#chrom\tpos\tv\nchr1\t1\ta\nchr1\t9\ta\n");
    let b = write_partition(&dir, "b.tsv", "#chrom\tpos\tv\nchr1\t5\tb\nchr2\t2\tb\n");

    genmerge()
        .args(["merge", &a, &b, "--seek", "chr1:5"])
        .assert()
        .success()
        .stdout("chrom\tpos\tv\nchr1\t5\tb\nchr1\t9\ta\nchr2\t2\tb\n");
}

#[test]
fn test_merge_with_manifest_and_progress() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_partition(&dir, "a.tsv", "#chrom\tpos\tv\nchr1\t1\ta\n");
    let b = write_partition(&dir, "b.tsv", "#chrom\tpos\tv\nchr2\t2\tb\n");
    let manifest = write_partition(
        &dir,
        "parts.json",
        &format!(
            r#"[
  {{"locator": "{a}", "range": {{"start_chr": "chr1", "start_pos": 1, "stop_chr": "chr1", "stop_pos": 10}}}},
  {{"locator": "{b}", "alias": "partB", "range": {{"start_chr": "chr2", "start_pos": 1, "stop_chr": "chr2", "stop_pos": 10}}}}
]"#
        ),
    );

    // fetching the header activates the first partition, so the first
    // reported frontier is the second partition's start
    genmerge()
        .args(["merge", "--manifest", &manifest, "--progress"])
        .assert()
        .success()
        .stdout("chrom\tpos\tv\nchr1\t1\ta\nchr2\t1\tprogress\nchr2\t2\tb\n");

    // without --progress the synthetic rows are dropped
    genmerge()
        .args(["merge", "--manifest", &manifest])
        .assert()
        .success()
        .stdout("chrom\tpos\tv\nchr1\t1\ta\nchr2\t2\tb\n");
}

#[test]
fn test_header_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_partition(&dir, "a.tsv", "#chrom\tpos\tdepth\nchr1\t1\t4\n");

    genmerge()
        .args(["header", &a])
        .assert()
        .success()
        .stdout("chrom\tpos\tdepth\n");
}

#[test]
fn test_merge_select_columns() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_partition(&dir, "a.tsv", "#chrom\tpos\tref\talt\tdepth\nchr1\t1\tA\tC\t9\n");

    genmerge()
        .args(["merge", &a, "--select", "2,4"])
        .assert()
        .success()
        .stdout("chrom\tpos\tref\tdepth\nchr1\t1\tA\t9\n");
}

#[test]
fn test_merge_requires_input() {
    genmerge()
        .arg("merge")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no partitions given"));
}

#[test]
fn test_merge_missing_file_fails() {
    genmerge()
        .args(["merge", "/nonexistent/part.tsv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/part.tsv"));
}
