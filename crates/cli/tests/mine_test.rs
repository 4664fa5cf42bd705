mod common;

use anyhow::Result;
use assert_cmd::Command;
use common::create_test_files;
use predicates::str::contains;
use tempfile::tempdir;

#[test]
fn test_mine_finds_a_single_pair() -> Result<()> {
  let dir = create_test_files([("original_a.py", "x = 1\n"), ("modified_a.py", "x = 1\ny = 2\n")])?;
  let store_dir = tempdir()?;
  let store = store_dir.path().join("patterns.bin");

  Command::cargo_bin("patterndiff")?
    .args(["mine"])
    .arg(dir.path())
    .arg("--store")
    .arg(&store)
    .assert()
    .success()
    .stdout(contains("mined 1 pattern"));

  assert!(store.exists());
  Ok(())
}

#[test]
fn test_mine_skips_unpaired_files() -> Result<()> {
  let dir = create_test_files([("original_a.py", "x = 1\n"), ("original_b.py", "y = 1\n")])?;
  let store_dir = tempdir()?;
  let store = store_dir.path().join("patterns.bin");

  Command::cargo_bin("patterndiff")?
    .args(["mine"])
    .arg(dir.path())
    .arg("--store")
    .arg(&store)
    .assert()
    .success()
    .stdout(contains("mined 0 pattern"));
  Ok(())
}

#[test]
fn test_mine_without_store_flag_is_an_error() -> Result<()> {
  let dir = create_test_files([("original_a.py", "x = 1\n")])?;
  Command::cargo_bin("patterndiff")?.args(["mine"]).arg(dir.path()).assert().failure();
  Ok(())
}
