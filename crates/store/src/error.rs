//! Error type for `patterndiff-store`: one `thiserror`-derived enum, flat
//! per crate rather than per module.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("i/o error on pattern store {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("pattern store {0} is already locked by another writer")]
  Locked(PathBuf),

  #[error("could not decode pattern record: {0}")]
  Codec(#[from] bincode::Error),
}
