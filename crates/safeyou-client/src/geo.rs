//! IP-based geolocation: a polling stand-in for a device position watch.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use reqwest::Client;
use safeyou_core::{
  platform::{GeoError, GeoPlatform, WatchEvent, WatchId},
  position::{AccuracyTier, Position, WatchOptions},
};
use serde::Deserialize;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

/// Endpoints and cadence for [`IpGeolocation`].
#[derive(Debug, Clone)]
pub struct IpGeolocationConfig {
  /// ip-api.com compatible JSON endpoint.
  pub locate_url:    String,
  /// Nominatim compatible `/reverse` endpoint.
  pub reverse_url:   String,
  /// Delay between two readings of a watch.
  pub poll_interval: Duration,
  /// Nominatim rejects requests without one.
  pub user_agent:    String,
}

impl Default for IpGeolocationConfig {
  fn default() -> Self {
    Self {
      locate_url:    "http://ip-api.com/json".into(),
      reverse_url:   "https://nominatim.openstreetmap.org/reverse".into(),
      poll_interval: Duration::from_secs(5),
      user_agent:    concat!("safeyou/", env!("CARGO_PKG_VERSION")).into(),
    }
  }
}

#[derive(Deserialize)]
struct IpApiResponse {
  status:  String,
  lat:     Option<f64>,
  lon:     Option<f64>,
  message: Option<String>,
}

#[derive(Deserialize)]
struct ReverseResponse {
  display_name: Option<String>,
}

/// [`GeoPlatform`] backed by HTTP lookups.
///
/// Readings are always [`AccuracyTier::Low`]: an IP fix is city-level no
/// matter what the caller asked for. Watches run as tokio tasks, so
/// [`GeoPlatform::watch_position`] must be called inside a runtime.
pub struct IpGeolocation {
  client:  Client,
  config:  IpGeolocationConfig,
  next_id: AtomicU64,
  watches: Mutex<HashMap<WatchId, JoinHandle<()>>>,
}

impl IpGeolocation {
  pub fn new(config: IpGeolocationConfig) -> crate::Result<Self> {
    let client = Client::builder().user_agent(&config.user_agent).build()?;
    Ok(Self {
      client,
      config,
      next_id: AtomicU64::new(1),
      watches: Mutex::new(HashMap::new()),
    })
  }

  /// Number of watches currently polling.
  pub fn active_watches(&self) -> usize { self.watches.lock().map(|w| w.len()).unwrap_or(0) }

  async fn locate(client: &Client, url: &str, timeout: Duration) -> Result<Position, GeoError> {
    let request = async {
      let resp = client.get(url).send().await?.error_for_status()?;
      resp.json::<IpApiResponse>().await
    };
    let body = tokio::time::timeout(timeout, request)
      .await
      .map_err(|_| GeoError::Timeout)?
      .map_err(|e| {
        tracing::debug!("ip geolocation request failed: {e}");
        GeoError::PositionUnavailable
      })?;

    match (body.status.as_str(), body.lat, body.lon) {
      ("success", Some(latitude), Some(longitude)) => Ok(Position {
        latitude,
        longitude,
        accuracy: AccuracyTier::Low,
        captured_at: Utc::now(),
      }),
      _ => {
        tracing::debug!(
          "ip geolocation declined: {}",
          body.message.as_deref().unwrap_or(&body.status)
        );
        Err(GeoError::PositionUnavailable)
      }
    }
  }
}

impl GeoPlatform for IpGeolocation {
  fn watch_position(
    &self,
    options: WatchOptions,
    events: UnboundedSender<WatchEvent>,
  ) -> Result<WatchId, GeoError> {
    let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
    let client = self.client.clone();
    let url = self.config.locate_url.clone();
    let interval = self.config.poll_interval;

    let task = tokio::spawn(async move {
      loop {
        let event = Self::locate(&client, &url, options.timeout).await;
        if events.send(event).is_err() {
          break;
        }
        tokio::time::sleep(interval).await;
      }
    });

    self
      .watches
      .lock()
      .map_err(|_| GeoError::Platform("watch table poisoned".into()))?
      .insert(id, task);
    Ok(id)
  }

  fn clear_watch(&self, id: WatchId) {
    if let Ok(mut watches) = self.watches.lock()
      && let Some(task) = watches.remove(&id)
    {
      task.abort();
    }
  }

  async fn current_position(&self, options: WatchOptions) -> Result<Position, GeoError> {
    Self::locate(&self.client, &self.config.locate_url, options.timeout).await
  }

  async fn reverse_geocode(&self, position: Position) -> Result<Option<String>, GeoError> {
    let body: ReverseResponse = self
      .client
      .get(&self.config.reverse_url)
      .query(&[
        ("format", "jsonv2".to_string()),
        ("lat", position.latitude.to_string()),
        ("lon", position.longitude.to_string()),
      ])
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| GeoError::Platform(e.to_string()))?
      .json()
      .await
      .map_err(|e| GeoError::Platform(e.to_string()))?;
    Ok(body.display_name)
  }
}

impl Drop for IpGeolocation {
  fn drop(&mut self) {
    if let Ok(watches) = self.watches.get_mut() {
      for (_, task) in watches.drain() {
        task.abort();
      }
    }
  }
}
