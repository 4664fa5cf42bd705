use ansi_term::{Color, Style};
use anyhow::{Error, Result};

use std::fmt;
use std::path::PathBuf;

/// Error kinds the CLI can surface with a title/description/fix, instead of
/// a bare `anyhow` chain: one enum per crate boundary the user can actually
/// do something about, everything else falls through to `anyhow`'s default
/// reporting.
#[derive(Debug, Clone)]
pub enum ErrorContext {
  CannotReadConfiguration,
  CannotParseConfiguration,
  CannotWalkDirectory(PathBuf),
  CannotOpenStore(PathBuf),
  CannotReadQueryFile(PathBuf),
}

impl ErrorContext {
  fn exit_code(&self) -> i32 {
    use ErrorContext::*;
    match self {
      CannotReadConfiguration | CannotWalkDirectory(_) | CannotReadQueryFile(_) => 2,
      _ => 1,
    }
  }
}

impl fmt::Display for ErrorContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let err_msg = ErrorMessage::from_context(self);
    write!(f, "{}", err_msg.title)
  }
}

struct ErrorMessage {
  title: String,
  description: String,
}

impl ErrorMessage {
  fn new<S: ToString>(title: S, description: S) -> Self {
    Self { title: title.to_string(), description: description.to_string() }
  }

  fn from_context(ctx: &ErrorContext) -> ErrorMessage {
    use ErrorContext::*;
    match ctx {
      CannotReadConfiguration => Self::new(
        "Cannot find configuration.",
        "Pass --config pointing at a mining.yml, or run without --config to use the defaults.",
      ),
      CannotParseConfiguration => Self::new(
        "Cannot parse configuration.",
        "The mining config is not valid YAML for the expected schema. Run `xtask schema` to regenerate the reference schema.",
      ),
      CannotWalkDirectory(dir) => Self::new(
        format!("Cannot walk directory {}.", dir.display()),
        "Check that the path exists and is readable.".to_string(),
      ),
      CannotOpenStore(path) => Self::new(
        format!("Cannot open pattern store {}.", path.display()),
        "The store file may be locked by a concurrent mine/refine run, or its parent directory may not exist.".to_string(),
      ),
      CannotReadQueryFile(path) => Self::new(
        format!("Cannot read query file {}.", path.display()),
        "Check that the path exists and is readable.".to_string(),
      ),
    }
  }
}

pub fn exit_with_error(error: Error) -> Result<()> {
  if let Some(e) = error.downcast_ref::<clap::Error>() {
    e.exit()
  }
  if let Some(e) = error.downcast_ref::<ErrorContext>() {
    let error_fmt = ErrorFormat { context: e, inner: &error };
    eprintln!("{error_fmt}");
    std::process::exit(e.exit_code())
  }
  Err(error)
}

struct ErrorFormat<'a> {
  context: &'a ErrorContext,
  inner: &'a Error,
}

impl fmt::Display for ErrorFormat<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ErrorMessage { title, description } = ErrorMessage::from_context(self.context);
    let bold = Style::new().bold();
    let error = Color::Red.paint("Error:");
    let message = bold.paint(title);
    writeln!(f, "{error} {message}")?;
    let help = Color::Blue.paint("Help:");
    writeln!(f, "{help} {description}")?;
    writeln!(f)?;
    writeln!(f, "{} Caused by", Color::Red.paint("×"))?;
    for err in self.inner.chain().skip(1) {
      let prefix = Color::Red.paint("╰▻");
      writeln!(f, "{prefix} {err}")?;
    }
    Ok(())
  }
}
