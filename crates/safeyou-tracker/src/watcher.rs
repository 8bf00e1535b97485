//! The continuous geolocation subscription.
//!
//! At most one platform subscription exists at any time, no matter how many
//! shares are active. Only the registry starts and stops it.

use std::sync::Arc;

use safeyou_core::{
  backend::Backend,
  platform::{GeoError, GeoPlatform, WatchEvent, WatchId},
  position::{AccuracyTier, Position, WatchOptions},
};
use tokio::{
  sync::{Mutex, mpsc, watch},
  task::JoinHandle,
};

use crate::throttle::Throttler;

// ─── Status ──────────────────────────────────────────────────────────────────

/// What the watcher is doing, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
  Idle,
  Running(AccuracyTier),
  /// The user refused location access. Not retried until the next start.
  Denied,
}

// ─── State ───────────────────────────────────────────────────────────────────

struct Subscription {
  id:      WatchId,
  options: WatchOptions,
  pump:    JoinHandle<()>,
}

struct State {
  active:         Option<Subscription>,
  /// Set by each `start`, consumed by the first transient error.
  fallback_armed: bool,
}

struct Shared<P, B> {
  platform:  Arc<P>,
  throttler: Throttler<B>,
  state:     Mutex<State>,
  position:  watch::Sender<Option<Position>>,
  status:    watch::Sender<WatchStatus>,
}

// ─── Watcher ─────────────────────────────────────────────────────────────────

/// Owner of the single platform subscription.
///
/// Cloning is cheap and yields a handle to the same subscription.
pub struct Watcher<P, B> {
  shared: Arc<Shared<P, B>>,
}

impl<P, B> Clone for Watcher<P, B> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<P, B> Watcher<P, B>
where
  P: GeoPlatform,
  B: Backend + 'static,
{
  pub fn new(platform: Arc<P>, throttler: Throttler<B>) -> Self {
    let (position, _) = watch::channel(None);
    let (status, _) = watch::channel(WatchStatus::Idle);
    Self {
      shared: Arc::new(Shared {
        platform,
        throttler,
        state: Mutex::new(State {
          active:         None,
          fallback_armed: false,
        }),
        position,
        status,
      }),
    }
  }

  /// Subscribe with [`WatchOptions::PRECISE`] unless already subscribed.
  ///
  /// A transient error while subscribing consumes the fallback immediately;
  /// permission denial leaves the watcher stopped with
  /// [`WatchStatus::Denied`].
  pub(crate) async fn start(&self) -> Result<(), GeoError> {
    let mut state = self.shared.state.lock().await;
    if state.active.is_some() {
      return Ok(());
    }
    state.fallback_armed = true;

    let result = match Shared::subscribe(&self.shared, &mut state, WatchOptions::PRECISE) {
      Err(e) if e.is_transient() => {
        state.fallback_armed = false;
        tracing::warn!("precise subscription failed ({e}); relaxing accuracy");
        Shared::subscribe(&self.shared, &mut state, WatchOptions::RELAXED)
      }
      other => other,
    };

    if let Err(e) = &result {
      self.shared.mark_failed(e);
    }
    result
  }

  /// Cancel the subscription if there is one.
  pub(crate) async fn stop(&self) {
    let mut state = self.shared.state.lock().await;
    state.fallback_armed = false;
    if let Some(sub) = state.active.take() {
      self.shared.platform.clear_watch(sub.id);
      sub.pump.abort();
      self.shared.status.send_replace(WatchStatus::Idle);
      tracing::info!(watch = sub.id.0, "location watch stopped");
    }
  }

  pub async fn is_running(&self) -> bool { self.shared.state.lock().await.active.is_some() }

  /// Accuracy tier of the live subscription, if any.
  pub async fn tier(&self) -> Option<AccuracyTier> {
    self
      .shared
      .state
      .lock()
      .await
      .active
      .as_ref()
      .map(|s| s.options.tier())
  }

  /// The freshest reading, uploaded or not.
  pub fn current_position(&self) -> Option<Position> { *self.shared.position.borrow() }

  pub fn positions(&self) -> watch::Receiver<Option<Position>> { self.shared.position.subscribe() }

  pub fn status(&self) -> watch::Receiver<WatchStatus> { self.shared.status.subscribe() }
}

impl<P, B> Shared<P, B>
where
  P: GeoPlatform,
  B: Backend + 'static,
{
  /// Open a platform subscription and spawn the task draining it.
  fn subscribe(
    this: &Arc<Self>,
    state: &mut State,
    options: WatchOptions,
  ) -> Result<(), GeoError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = this.platform.watch_position(options, tx)?;
    let pump = tokio::spawn(Self::pump(Arc::clone(this), id, rx));
    state.active = Some(Subscription { id, options, pump });
    this.status.send_replace(WatchStatus::Running(options.tier()));
    tracing::info!(
      watch = id.0,
      high_accuracy = options.high_accuracy,
      "location watch started"
    );
    Ok(())
  }

  fn mark_failed(&self, error: &GeoError) {
    if *error == GeoError::PermissionDenied {
      tracing::error!("location permission denied");
      self.status.send_replace(WatchStatus::Denied);
    } else {
      tracing::warn!("location watch could not start: {error}");
      self.status.send_replace(WatchStatus::Idle);
    }
  }

  async fn pump(this: Arc<Self>, id: WatchId, mut events: mpsc::UnboundedReceiver<WatchEvent>) {
    while let Some(event) = events.recv().await {
      match event {
        Ok(position) => {
          this.position.send_replace(Some(position));
          this.throttler.report(&position).await;
        }
        Err(e) => {
          if !Self::on_error(&this, id, e).await {
            return;
          }
        }
      }
    }
  }

  /// React to a subscription error. Returns `false` once subscription `id`
  /// is gone and its pump should exit.
  async fn on_error(this: &Arc<Self>, id: WatchId, error: GeoError) -> bool {
    let mut state = this.state.lock().await;
    if state.active.as_ref().map(|s| s.id) != Some(id) {
      return false;
    }

    if error == GeoError::PermissionDenied {
      this.platform.clear_watch(id);
      state.active = None;
      state.fallback_armed = false;
      this.mark_failed(&error);
      return false;
    }

    if !(error.is_transient() && state.fallback_armed) {
      tracing::warn!(watch = id.0, "location watch error: {error}");
      return true;
    }

    state.fallback_armed = false;
    tracing::warn!(watch = id.0, "{error}; retrying with relaxed accuracy");
    this.platform.clear_watch(id);
    // Dropping the handle detaches this task; it exits as soon as we return.
    state.active = None;
    if let Err(e) = Self::subscribe(this, &mut state, WatchOptions::RELAXED) {
      this.mark_failed(&e);
    }
    false
  }
}
