mod common;

use anyhow::Result;
use assert_cmd::Command;
use common::create_test_files;
use predicates::str::contains;
use tempfile::tempdir;

#[test]
fn test_refine_fuses_two_similar_patterns_into_one() -> Result<()> {
  let dir = create_test_files([
    ("a/original_x.py", "x = 1\n"),
    ("a/modified_x.py", "x = 1\nlog(x)\n"),
    ("b/original_x.py", "y = 2\n"),
    ("b/modified_x.py", "y = 2\nlog(y)\n"),
  ])?;
  let store_dir = tempdir()?;
  let store = store_dir.path().join("patterns.bin");

  Command::cargo_bin("patterndiff")?
    .args(["mine"])
    .arg(dir.path())
    .arg("--store")
    .arg(&store)
    .assert()
    .success()
    .stdout(contains("mined 2 pattern"));

  Command::cargo_bin("patterndiff")?
    .args(["refine", "--store"])
    .arg(&store)
    .args(["--min-count", "1"])
    .assert()
    .success()
    .stdout(contains("refined 2 pattern").and(contains("down to 1")));
  Ok(())
}

#[test]
fn test_refine_without_store_flag_is_an_error() -> Result<()> {
  Command::cargo_bin("patterndiff")?.args(["refine"]).assert().failure();
  Ok(())
}
