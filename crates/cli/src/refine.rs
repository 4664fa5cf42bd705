//! `refine`: loads the store, fuses patterns to a fixed point with
//! [`patterndiff_refine::Refiner`] and rewrites the store with the
//! generalised set. A one-line progress message is logged per fusion round
//! via `tracing` (the refiner itself emits that `tracing::info!`, see
//! `patterndiff-refine::refiner::Refiner::refine`); this subcommand only
//! needs to install the subscriber and report the before/after counts.

use anyhow::{Context, Result};
use clap::Parser;

use std::path::PathBuf;

use patterndiff_core::Differencer;
use patterndiff_refine::{FunctionPropagator, Optimiser, Refiner, WildcardUseCompressor};
use patterndiff_store::StorageContext;

use crate::config::{MiningConfig, OptimiserKind};
use crate::error::ErrorContext as EC;

#[derive(Parser)]
pub struct RefineArg {
  /// Pattern store to refine in place.
  #[clap(long)]
  pub store: PathBuf,
  /// Stop once at most this many patterns remain. Overrides the config file.
  #[clap(long)]
  pub min_count: Option<usize>,
  /// Stop once the closest remaining pair's distance reaches this. Overrides the config file.
  #[clap(long)]
  pub max_distance: Option<usize>,
  #[clap(short, long)]
  pub config: Option<PathBuf>,
}

fn optimiser_chain(kinds: &[OptimiserKind]) -> Vec<Box<dyn Optimiser>> {
  kinds
    .iter()
    .map(|kind| -> Box<dyn Optimiser> {
      match kind {
        OptimiserKind::Compressor => Box::new(WildcardUseCompressor),
        OptimiserKind::Propagator => Box::new(FunctionPropagator),
      }
    })
    .collect()
}

pub fn run_refine(arg: RefineArg) -> Result<()> {
  let config = MiningConfig::load(arg.config.as_deref())?;
  let min_count = arg.min_count.unwrap_or(config.refiner.min_count);
  let max_distance = arg.max_distance.or(config.refiner.max_distance);

  let store = StorageContext::new(arg.store.as_path());
  let patterns = store.load().with_context(|| EC::CannotOpenStore(arg.store.clone()))?;
  let before = patterns.len();

  let differencer = Differencer::new(config.differencer.f, config.differencer.iterations);
  let refiner = Refiner::new(differencer, config.editscript.sim_threshold, min_count, max_distance)
    .with_optimisers(optimiser_chain(&config.refiner.optimisers));

  let refined = refiner.refine(patterns)?;
  let after = refined.len();

  store.rewrite(&refined).with_context(|| EC::CannotOpenStore(arg.store.clone()))?;

  tracing::info!(before, after, "refinement complete");
  println!("refined {before} pattern(s) down to {after} in {}", arg.store.display());
  Ok(())
}
