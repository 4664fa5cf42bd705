mod common;

use anyhow::Result;
use assert_cmd::Command;
use common::create_test_files;
use predicates::str::contains;
use tempfile::tempdir;

fn mine(dir: &std::path::Path, store: &std::path::Path) -> Result<()> {
  Command::cargo_bin("patterndiff")?.args(["mine"]).arg(dir).arg("--store").arg(store).assert().success();
  Ok(())
}

#[test]
fn test_match_counts_a_wildcard_free_hit() -> Result<()> {
  let dir = create_test_files([("original_a.py", "x = 1\n"), ("modified_a.py", "x = 1\ny = 2\n")])?;
  let store_dir = tempdir()?;
  let store = store_dir.path().join("patterns.bin");
  mine(dir.path(), &store)?;

  let query = dir.path().join("original_a.py");
  Command::cargo_bin("patterndiff")?
    .arg("match")
    .arg(&query)
    .arg("--store")
    .arg(&store)
    .args(["--emitter", "count"])
    .assert()
    .success()
    .stdout(contains("1"));
  Ok(())
}

#[test]
fn test_match_rejects_unrelated_source() -> Result<()> {
  let dir = create_test_files([("original_a.py", "x = 1\n"), ("modified_a.py", "x = 1\ny = 2\n")])?;
  let store_dir = tempdir()?;
  let store = store_dir.path().join("patterns.bin");
  mine(dir.path(), &store)?;

  let query_dir = create_test_files([("query.py", "def foo():\n    pass\n")])?;
  Command::cargo_bin("patterndiff")?
    .arg("match")
    .arg(query_dir.path().join("query.py"))
    .arg("--store")
    .arg(&store)
    .args(["--emitter", "count"])
    .assert()
    .success()
    .stdout(contains("0"));
  Ok(())
}

#[test]
fn test_match_with_bogus_emitter_is_an_error() -> Result<()> {
  let dir = create_test_files([("query.py", "x = 1\n")])?;
  let store_dir = tempdir()?;
  let store = store_dir.path().join("patterns.bin");
  mine(dir.path(), &store)?;

  Command::cargo_bin("patterndiff")?
    .arg("match")
    .arg(dir.path().join("query.py"))
    .arg("--store")
    .arg(&store)
    .args(["--emitter", "bogus"])
    .assert()
    .failure();
  Ok(())
}
