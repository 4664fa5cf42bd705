//! `MiningConfig`: the YAML configuration every subcommand reads its
//! differencer/edit-script/refiner/matcher tuning from. Loaded the same way
//! as other CLI config structs in this ecosystem (`serde_yaml` into a plain
//! struct, every field optional with a documented default) and carries a
//! `schemars`-derived `JsonSchema` for the same reason rule configs in
//! similar tools do: `xtask` emits it so editors can validate the file.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use std::fs;
use std::path::Path;

use crate::error::ErrorContext as EC;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DifferencerConfig {
  /// Pair-score floor; entries below are evicted from the pairing map.
  pub f: f64,
  /// Hard cap on bottom-up/top-down alternation rounds.
  pub iterations: usize,
}

impl Default for DifferencerConfig {
  fn default() -> Self {
    Self { f: 0.1, iterations: 1000 }
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EditScriptConfig {
  /// Score below which a node pair is treated as unmatched.
  pub sim_threshold: f64,
}

impl Default for EditScriptConfig {
  fn default() -> Self {
    Self { sim_threshold: 0.5 }
  }
}

/// Which optimiser passes `refine` runs, in order, after linking a fused
/// pattern's wildcards and uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OptimiserKind {
  Compressor,
  Propagator,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RefinerConfig {
  /// Stop fusing once at most this many patterns remain.
  pub min_count: usize,
  /// Stop fusing once the closest remaining pair's distance reaches this.
  /// `None` means no ceiling -- the refiner only stops on `min_count`.
  pub max_distance: Option<usize>,
  pub optimisers: Vec<OptimiserKind>,
}

impl Default for RefinerConfig {
  fn default() -> Self {
    Self { min_count: 2, max_distance: None, optimisers: vec![OptimiserKind::Compressor, OptimiserKind::Propagator] }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmitterKind {
  Readable,
  Xml,
  Count,
  Recommendation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MatcherConfig {
  pub emitter: EmitterKind,
}

impl Default for MatcherConfig {
  fn default() -> Self {
    Self { emitter: EmitterKind::Readable }
  }
}

/// The whole `mining.yml` document. Every section defaults independently,
/// so a config file only needs to override the fields it cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MiningConfig {
  pub differencer: DifferencerConfig,
  pub editscript: EditScriptConfig,
  pub refiner: RefinerConfig,
  pub matcher: MatcherConfig,
}

impl MiningConfig {
  /// Loads config from `path`, or falls back to every field's default if
  /// `path` is `None` -- there is no implicit `mining.yml` discovery, since
  /// a mining run is always pointed at an explicit store and directory
  /// already.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let Some(path) = path else {
      return Ok(Self::default());
    };
    let text = fs::read_to_string(path).context(EC::CannotReadConfiguration)?;
    let config: MiningConfig = serde_yaml::from_str(&text).context(EC::CannotParseConfiguration)?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_the_documented_values() {
    let config = MiningConfig::default();
    assert_eq!(config.differencer.f, 0.1);
    assert_eq!(config.differencer.iterations, 1000);
    assert_eq!(config.editscript.sim_threshold, 0.5);
    assert_eq!(config.refiner.min_count, 2);
    assert_eq!(config.refiner.max_distance, None);
    assert_eq!(config.matcher.emitter, EmitterKind::Readable);
  }

  #[test]
  fn partial_yaml_only_overrides_named_fields() {
    let yaml = "refiner:\n  minCount: 5\n";
    let config: MiningConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.refiner.min_count, 5);
    assert_eq!(config.differencer.f, 0.1);
  }

  #[test]
  fn missing_config_file_falls_back_to_defaults() {
    let config = MiningConfig::load(None).unwrap();
    assert_eq!(config.matcher.emitter, EmitterKind::Readable);
  }
}
