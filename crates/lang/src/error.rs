use thiserror::Error;

#[derive(Debug, Error)]
pub enum LangError {
  #[error("python source could not be parsed: {0}")]
  Parse(String),
}
