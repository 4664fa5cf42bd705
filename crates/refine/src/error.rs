//! Error type for `patterndiff-refine`: one `thiserror`-derived enum, flat
//! per crate rather than per module.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefineError {
  #[error(transparent)]
  Core(#[from] patterndiff_core::CoreError),
}
