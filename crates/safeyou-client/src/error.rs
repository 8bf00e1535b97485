//! Error type for `safeyou-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The server answered with a non-2xx status.
  #[error("{request} → {status}")]
  Status {
    request: String,
    status:  reqwest::StatusCode,
  },

  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
