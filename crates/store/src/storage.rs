//! The append-only pattern blob store: `save`, `load`,
//! `rewrite`, `delete` over a single file, with a sibling `.lock` file
//! guarding writers ("within the mining process only one
//! writer is active").
//!
//! Each record is `bincode`-encoded and length-prefixed, appended to the
//! file one pattern at a time -- the simplest encoding that satisfies
//! "opaque blob, round-trippable" and "append is just a write at EOF."

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use patterndiff_core::Pattern;

use crate::error::StoreError;

/// A scoped exclusive-write guard: its `Drop` impl removes the sibling
/// `.lock` file on every exit path, including an early return via `?` --
/// scoped acquisition with guaranteed release.
struct WriteLock {
  lock_path: PathBuf,
}

impl WriteLock {
  fn acquire(store_path: &Path) -> Result<Self, StoreError> {
    let lock_path = lock_path_for(store_path);
    OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&lock_path)
      .map_err(|source| {
        if source.kind() == std::io::ErrorKind::AlreadyExists {
          StoreError::Locked(store_path.to_path_buf())
        } else {
          StoreError::Io { path: lock_path.clone(), source }
        }
      })?;
    Ok(Self { lock_path })
  }
}

impl Drop for WriteLock {
  fn drop(&mut self) {
    let _ = fs::remove_file(&self.lock_path);
  }
}

fn lock_path_for(store_path: &Path) -> PathBuf {
  let mut name = store_path.as_os_str().to_os_string();
  name.push(".lock");
  PathBuf::from(name)
}

/// Handle onto a single pattern-store file. Cheap to construct; holds no
/// open file descriptors between calls, so multiple `StorageContext`s
/// pointed at the same path (mining process + a concurrent `match` query)
/// coexist safely as long as only one ever writes at a time.
#[derive(Debug, Clone)]
pub struct StorageContext {
  path: PathBuf,
}

impl StorageContext {
  pub fn new<P: Into<PathBuf>>(path: P) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Appends one pattern record to the store under an exclusive write
  /// lock. Mirrors this crate's `save`.
  pub fn save(&self, pattern: &Pattern) -> Result<(), StoreError> {
    let _lock = WriteLock::acquire(&self.path)?;
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
    let mut writer = BufWriter::new(file);
    write_record(&mut writer, pattern)?;
    writer.flush().map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
    Ok(())
  }

  /// Reads every record in the store, in append order. A shared (read)
  /// access; no lock is taken since records are only ever appended or the
  /// whole file atomically replaced, never mutated in place, so a reader
  /// never observes a half-written record.
  pub fn load(&self) -> Result<Vec<Pattern>, StoreError> {
    if !self.path.exists() {
      return Ok(Vec::new());
    }
    let file = File::open(&self.path).map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
    let mut reader = BufReader::new(file);
    let mut patterns = Vec::new();
    loop {
      match read_record(&mut reader)? {
        Some(pattern) => patterns.push(pattern),
        None => break,
      }
    }
    Ok(patterns)
  }

  /// Atomically replaces the whole store with `patterns`, used by the
  /// refiner to persist a fused pattern set. Writes to a temp file in the
  /// same directory then renames over the original -- a POSIX rename is
  /// atomic, so a concurrent `load` never observes a partially written
  /// file.
  pub fn rewrite(&self, patterns: &[Pattern]) -> Result<(), StoreError> {
    let _lock = WriteLock::acquire(&self.path)?;
    let tmp_path = self.path.with_extension("tmp");
    {
      let file = File::create(&tmp_path).map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
      let mut writer = BufWriter::new(file);
      for pattern in patterns {
        write_record(&mut writer, pattern)?;
      }
      writer.flush().map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
    }
    fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
    Ok(())
  }

  /// Purges the store file entirely. A no-op if it does not exist.
  pub fn delete(&self) -> Result<(), StoreError> {
    let _lock = WriteLock::acquire(&self.path)?;
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(source) => Err(StoreError::Io { path: self.path.clone(), source }),
    }
  }
}

fn write_record<W: Write>(writer: &mut W, pattern: &Pattern) -> Result<(), StoreError> {
  let payload = bincode::serialize(pattern)?;
  let len = payload.len() as u64;
  writer.write_all(&len.to_le_bytes()).map_err(|source| StoreError::Io { path: PathBuf::new(), source })?;
  writer.write_all(&payload).map_err(|source| StoreError::Io { path: PathBuf::new(), source })?;
  Ok(())
}

fn read_record<R: Read>(reader: &mut R) -> Result<Option<Pattern>, StoreError> {
  let mut len_buf = [0u8; 8];
  match reader.read_exact(&mut len_buf) {
    Ok(()) => {}
    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
    Err(source) => return Err(StoreError::Io { path: PathBuf::new(), source }),
  }
  let len = u64::from_le_bytes(len_buf) as usize;
  let mut payload = vec![0u8; len];
  reader.read_exact(&mut payload).map_err(|source| StoreError::Io { path: PathBuf::new(), source })?;
  let pattern: Pattern = bincode::deserialize(&payload)?;
  Ok(Some(pattern))
}

#[cfg(test)]
mod tests {
  use super::*;
  use patterndiff_core::{Arena, ConstKind, Differencer, Node};
  use tempfile::tempdir;

  fn sample_pattern(name: &str) -> Pattern {
    let mut arena = Arena::new();
    let target = arena.alloc(Node::Variable { name: name.into() });
    let original_value = arena.alloc(Node::Constant { literal: "1".into(), kind: ConstKind::Number });
    let original = arena.alloc(Node::Assign { target, op: "=".into(), value: original_value });
    let modified_value = arena.alloc(Node::Constant { literal: "2".into(), kind: ConstKind::Number });
    let modified = arena.alloc(Node::Assign { target, op: "=".into(), value: modified_value });
    let pairing = Differencer::default().connect_nodes(&arena, original, modified);
    Pattern { arena, original, modified, pairing }
  }

  #[test]
  fn save_then_load_round_trips_every_pattern() {
    let dir = tempdir().unwrap();
    let store = StorageContext::new(dir.path().join("patterns.bin"));
    store.save(&sample_pattern("x")).unwrap();
    store.save(&sample_pattern("y")).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 2);
  }

  #[test]
  fn load_on_a_missing_file_is_an_empty_store() {
    let dir = tempdir().unwrap();
    let store = StorageContext::new(dir.path().join("nope.bin"));
    assert!(store.load().unwrap().is_empty());
  }

  #[test]
  fn rewrite_atomically_replaces_the_contents() {
    let dir = tempdir().unwrap();
    let store = StorageContext::new(dir.path().join("patterns.bin"));
    store.save(&sample_pattern("x")).unwrap();
    store.save(&sample_pattern("y")).unwrap();
    assert_eq!(store.load().unwrap().len(), 2);

    store.rewrite(&[sample_pattern("fused")]).unwrap();
    assert_eq!(store.load().unwrap().len(), 1);
  }

  #[test]
  fn delete_removes_the_file_and_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = StorageContext::new(dir.path().join("patterns.bin"));
    store.save(&sample_pattern("x")).unwrap();
    store.delete().unwrap();
    assert!(store.load().unwrap().is_empty());
    store.delete().unwrap();
  }
}
