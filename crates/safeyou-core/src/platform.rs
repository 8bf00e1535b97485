//! Device-side collaborators: the geolocation platform and the link launcher.

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::position::{Position, WatchOptions};

/// Failure reported by the geolocation platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
  #[error("location permission denied")]
  PermissionDenied,
  #[error("position unavailable")]
  PositionUnavailable,
  #[error("timed out waiting for a position")]
  Timeout,
  #[error("geolocation error: {0}")]
  Platform(String),
}

impl GeoError {
  /// Timeouts and unavailable fixes are worth retrying with relaxed options.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::PositionUnavailable | Self::Timeout)
  }
}

/// One delivery from a continuous subscription.
pub type WatchEvent = Result<Position, GeoError>;

/// Opaque handle to a platform subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// The device's geolocation facilities.
pub trait GeoPlatform: Send + Sync + 'static {
  /// Begin continuous updates. Every reading or error is sent on `events`
  /// until [`GeoPlatform::clear_watch`] is called with the returned id.
  fn watch_position(
    &self,
    options: WatchOptions,
    events: UnboundedSender<WatchEvent>,
  ) -> Result<WatchId, GeoError>;

  /// Cancel a subscription. Unknown ids are ignored.
  fn clear_watch(&self, id: WatchId);

  /// A single reading, independent of any subscription.
  fn current_position(
    &self,
    options: WatchOptions,
  ) -> impl Future<Output = Result<Position, GeoError>> + Send + '_;

  /// Address for a coordinate pair, if the platform can find one.
  fn reverse_geocode(
    &self,
    position: Position,
  ) -> impl Future<Output = Result<Option<String>, GeoError>> + Send + '_;
}

/// Opens an outbound link (a messaging deep link) for the user.
///
/// Fire-and-forget: nothing reports whether the user acted on it.
pub trait Launcher: Send + Sync {
  fn open(&self, url: &str);
}
