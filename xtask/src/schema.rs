use anyhow::{Context, Result};
use patterndiff_cli::config::MiningConfig;
use schemars::schema_for;
use serde_json::to_writer_pretty;

use std::fs::File;

pub fn generate_schema() -> Result<()> {
  let schema = schema_for!(MiningConfig);
  let xtask_path = std::env::var("CARGO_MANIFEST_DIR")?;
  let schema_path = std::fs::canonicalize(format!("{xtask_path}/.."))?.join("schemas/mining.json");
  let mut file = File::create(&schema_path)
    .with_context(|| format!("cannot create {}", schema_path.display()))?;
  to_writer_pretty(&mut file, &schema).context("cannot print JSON schema")
}
