//! Error type for `safeyou-tracker`.
//!
//! Every variant is meant for the user: these come back from state-changing
//! operations. Best-effort work (uploads, geocoding) only logs.

use safeyou_core::platform::GeoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A share was requested before any position was known.
  #[error("current location is not available yet")]
  NoCurrentPosition,

  #[error("contact not found: {0}")]
  ContactNotFound(uuid::Uuid),

  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Geolocation(#[from] GeoError),
}

impl Error {
  pub(crate) fn backend<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Backend(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
