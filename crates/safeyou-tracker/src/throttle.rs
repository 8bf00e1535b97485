//! Upload throttling between the watcher and the backend.

use std::{sync::Arc, time::Duration};

use safeyou_core::{backend::Backend, position::Position};
use tokio::{sync::Mutex, time::Instant};

/// Minimum spacing between two position uploads.
pub const UPLOAD_INTERVAL: Duration = Duration::from_secs(10);

/// Rate-limits `update user location` calls.
///
/// Readings that arrive inside the interval are dropped; the watcher still
/// publishes them locally, so the UI never lags behind the upload cadence.
pub struct Throttler<B> {
  backend:   Arc<B>,
  interval:  Duration,
  last_sent: Mutex<Option<Instant>>,
}

impl<B: Backend + 'static> Throttler<B> {
  pub fn new(backend: Arc<B>) -> Self { Self::with_interval(backend, UPLOAD_INTERVAL) }

  pub fn with_interval(backend: Arc<B>, interval: Duration) -> Self {
    Self {
      backend,
      interval,
      last_sent: Mutex::new(None),
    }
  }

  /// Offer a fresh reading. Returns `true` if an upload was dispatched.
  ///
  /// The gate is decided in call order, but the request itself runs on its
  /// own task so a slow backend never holds up the next reading. Failures
  /// are logged and swallowed; the next reading past the interval tries
  /// again.
  pub async fn report(&self, position: &Position) -> bool {
    {
      let mut last_sent = self.last_sent.lock().await;
      let now = Instant::now();
      if let Some(prev) = *last_sent
        && now.duration_since(prev) <= self.interval
      {
        tracing::trace!("position upload throttled");
        return false;
      }
      *last_sent = Some(now);
    }

    let backend = Arc::clone(&self.backend);
    let (lat, lng) = (position.latitude, position.longitude);
    tokio::spawn(async move {
      match backend.update_user_location(lat, lng).await {
        Ok(()) => tracing::debug!(lat, lng, "uploaded position"),
        Err(e) => tracing::warn!("position upload failed: {e}"),
      }
    });
    true
  }
}
