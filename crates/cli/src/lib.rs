pub mod config;
mod error;
mod mine;
mod query;
mod refine;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mine::{run_mine, MineArg};
use query::{run_match, MatchArg};
use refine::{run_refine, RefineArg};

pub use error::exit_with_error;

const LOGO: &str = r#"
Mine, refine and match source-level code-change patterns.
"#;

#[derive(Parser)]
#[clap(author, version, about, long_about = LOGO)]
struct App {
  #[clap(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Walk a directory of original_*/modified_* pairs and mine patterns into a store.
  Mine(MineArg),
  /// Fuse the nearest patterns in a store down to a generalised set.
  Refine(RefineArg),
  /// Scan a source file against a pattern store and emit matches.
  Match(MatchArg),
}

pub fn execute_main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();
  match main_with_args(std::env::args()) {
    Err(error) => exit_with_error(error),
    ok => ok,
  }
}

fn main_with_args(args: impl Iterator<Item = String>) -> Result<()> {
  let app = App::try_parse_from(args)?;
  match app.command {
    Commands::Mine(arg) => run_mine(arg),
    Commands::Refine(arg) => run_refine(arg),
    Commands::Match(arg) => run_match(arg),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pd(args: &str) -> Result<App> {
    let app = App::try_parse_from(std::iter::once("patterndiff".to_string()).chain(args.split(' ').map(str::to_string)))?;
    Ok(app)
  }

  #[test]
  fn mine_requires_a_store_flag() {
    assert!(pd("mine some_dir --store patterns.bin").is_ok());
    assert!(pd("mine some_dir").is_err());
  }

  #[test]
  fn refine_accepts_optional_thresholds() {
    assert!(pd("refine --store patterns.bin").is_ok());
    assert!(pd("refine --store patterns.bin --min-count 3 --max-distance 10").is_ok());
  }

  #[test]
  fn match_accepts_an_emitter_override() {
    assert!(pd("match query.py --store patterns.bin --emitter xml").is_ok());
    assert!(pd("match query.py --store patterns.bin --emitter bogus").is_err());
  }

  #[test]
  fn no_subcommand_is_an_error() {
    let result = main_with_args(["patterndiff".to_owned()].into_iter());
    assert!(result.is_err());
  }
}
