//! `patterndiff-refine`: generalises a collection of mined patterns by
//! repeatedly fusing the two most similar ones, replacing the positions
//! where they disagree with linked `Wildcard`/`Use` placeholders.
//!
//! Builds on [`patterndiff_core`]'s `Pattern`/`Arena`/`Differencer`/
//! `EditScript` types; never parses source text itself.

mod merge;
pub mod optimiser;
pub mod refiner;

pub mod error;

pub use error::RefineError;
pub use optimiser::{FunctionPropagator, Optimiser, OptimiseContext, WildcardUseCompressor};
pub use refiner::Refiner;
