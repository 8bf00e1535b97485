//! Error types for `safeyou-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown share duration: {0:?}")]
  UnknownDuration(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
