//! `mine`: walks a directory for `original_*`/`modified_*` file pairs,
//! creates a [`patterndiff_core::Pattern`] per pair and appends it to the
//! store, using `ignore::WalkBuilder` to respect `.gitignore` the way any
//! other directory-scanning subcommand in this CLI does.

use anyhow::{Context, Result};
use clap::Parser;
use ignore::WalkBuilder;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use patterndiff_core::{Differencer, Pattern};
use patterndiff_lang::PythonParser;
use patterndiff_store::StorageContext;

use crate::config::MiningConfig;
use crate::error::ErrorContext as EC;

#[derive(Parser)]
pub struct MineArg {
  /// Directory to walk for original_*/modified_* pairs.
  pub dir: PathBuf,
  /// Pattern store file to append mined patterns to.
  #[clap(long)]
  pub store: PathBuf,
  /// Mining configuration YAML. Falls back to every default if omitted.
  #[clap(short, long)]
  pub config: Option<PathBuf>,
}

/// A matched `original_<suffix>` / `modified_<suffix>` file pair, keyed by
/// `<directory>/<suffix>` so that two sibling directories never collide.
fn collect_pairs(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
  let mut originals: HashMap<String, PathBuf> = HashMap::new();
  let mut modifieds: HashMap<String, PathBuf> = HashMap::new();

  let walker = WalkBuilder::new(dir).build();
  for entry in walker {
    let entry = entry.with_context(|| EC::CannotWalkDirectory(dir.to_path_buf()))?;
    if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
      continue;
    }
    let path = entry.path();
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
    let parent = path.parent().map(|p| p.display().to_string()).unwrap_or_default();
    if let Some(suffix) = file_name.strip_prefix("original_") {
      originals.insert(format!("{parent}/{suffix}"), path.to_path_buf());
    } else if let Some(suffix) = file_name.strip_prefix("modified_") {
      modifieds.insert(format!("{parent}/{suffix}"), path.to_path_buf());
    }
  }

  let mut pairs: Vec<(PathBuf, PathBuf)> = originals
    .into_iter()
    .filter_map(|(key, original)| modifieds.remove(&key).map(|modified| (original, modified)))
    .collect();
  pairs.sort();
  Ok(pairs)
}

pub fn run_mine(arg: MineArg) -> Result<()> {
  let config = MiningConfig::load(arg.config.as_deref())?;
  let differencer = Differencer::new(config.differencer.f, config.differencer.iterations);
  let parser = PythonParser;
  let store = StorageContext::new(arg.store.as_path());

  let pairs = collect_pairs(&arg.dir)?;
  tracing::info!(count = pairs.len(), dir = %arg.dir.display(), "found original/modified pairs");

  let mut mined = 0usize;
  let mut skipped = 0usize;
  for (original_path, modified_path) in pairs {
    let result = mine_one(&parser, &differencer, &original_path, &modified_path);
    match result {
      Ok(pattern) => {
        store.save(&pattern).with_context(|| EC::CannotOpenStore(arg.store.clone()))?;
        mined += 1;
      }
      Err(err) => {
        tracing::warn!(original = %original_path.display(), modified = %modified_path.display(), error = %err, "skipping pair that failed to parse");
        skipped += 1;
      }
    }
  }

  tracing::info!(mined, skipped, "mining complete");
  println!("mined {mined} pattern(s) into {}, {skipped} pair(s) skipped", arg.store.display());
  Ok(())
}

fn mine_one(parser: &PythonParser, differencer: &Differencer, original_path: &Path, modified_path: &Path) -> Result<Pattern> {
  let original_text = fs::read_to_string(original_path).with_context(|| format!("reading {}", original_path.display()))?;
  let modified_text = fs::read_to_string(modified_path).with_context(|| format!("reading {}", modified_path.display()))?;
  let pattern = Pattern::create(parser, differencer, &original_text, &modified_text)?;
  Ok(pattern)
}
