//! `match`: parses a query file, scans every stored pattern against it with
//! a [`patterndiff_core::Recommender`] and writes the chosen emitter's
//! output to stdout. Named `query` at the module level since `match` is a
//! reserved word; the subcommand itself is still `patterndiff match`.

use anyhow::{Context, Result};
use clap::Parser;

use std::fs;
use std::path::PathBuf;

use patterndiff_core::Recommender;
use patterndiff_lang::{parse_document, PythonRenderer};
use patterndiff_store::{CounterEmitter, Emitter, ReadableEmitter, RecommendationEmitter, XmlEmitter};

use crate::config::{EmitterKind, MiningConfig};
use crate::error::ErrorContext as EC;

#[derive(Parser)]
pub struct MatchArg {
  /// Source file to scan for matches.
  pub file: PathBuf,
  /// Pattern store to match against.
  #[clap(long)]
  pub store: PathBuf,
  /// Overrides the configured emitter for this run.
  #[clap(long, value_enum)]
  pub emitter: Option<EmitterKind>,
  #[clap(short, long)]
  pub config: Option<PathBuf>,
}

pub fn run_match(arg: MatchArg) -> Result<()> {
  let config = MiningConfig::load(arg.config.as_deref())?;
  let emitter_kind = arg.emitter.unwrap_or(config.matcher.emitter);

  let source = fs::read_to_string(&arg.file).with_context(|| EC::CannotReadQueryFile(arg.file.clone()))?;
  let (doc, root) = parse_document(&source)?;

  let store = patterndiff_store::StorageContext::new(arg.store.as_path());
  let patterns = store.load().with_context(|| EC::CannotOpenStore(arg.store.clone()))?;

  let mut recommender = Recommender::new(&doc, root);
  for pattern in &patterns {
    recommender.subscribe(pattern);
  }
  let hits = recommender.run();

  let renderer = PythonRenderer;
  match emitter_kind {
    EmitterKind::Count => {
      let mut emitter = CounterEmitter::default();
      for hit in &hits {
        emitter.parse(hit, &doc, &renderer);
      }
      println!("{}", emitter.count());
    }
    EmitterKind::Xml => {
      let mut emitter = XmlEmitter::default();
      for hit in &hits {
        emitter.parse(hit, &doc, &renderer);
      }
      print!("{}", emitter.to_xml());
    }
    EmitterKind::Recommendation => {
      let mut emitter = RecommendationEmitter::default();
      for hit in &hits {
        emitter.parse(hit, &doc, &renderer);
      }
      for change in emitter.changes() {
        println!("{}-{}: {}", change.start_line, change.end_line, change.change_code);
      }
    }
    EmitterKind::Readable => {
      let mut emitter = ReadableEmitter::default();
      for hit in &hits {
        emitter.parse(hit, &doc, &renderer);
      }
      println!("{}", emitter.get_recommended_code(&source));
    }
  }

  Ok(())
}
