//! Share registry: which contacts are sharing, and whether the watcher runs.
//!
//! The watcher should run exactly when at least one contact has
//! `location_active`. That is re-derived from the backend's list after every
//! mutation and on every load, never tracked with a local counter.

use std::sync::Arc;

use safeyou_core::{
  backend::Backend,
  contact::{Contact, ContactDraft, any_sharing},
  platform::{GeoPlatform, Launcher},
  position::{Position, WatchOptions},
  share::ShareDuration,
};
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

use crate::{
  Error,
  Result,
  handoff::{Handoff, HandoffEmitter},
  throttle::Throttler,
  watcher::{WatchStatus, Watcher},
};

/// Result of a one-shot [`ShareRegistry::locate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
  pub position: Position,
  /// Best-effort street address; `None` when lookup failed.
  pub address:  Option<String>,
}

/// Coordinates shares across contacts and owns the singleton [`Watcher`].
pub struct ShareRegistry<B, P, L> {
  backend:  Arc<B>,
  platform: Arc<P>,
  watcher:  Watcher<P, B>,
  handoff:  HandoffEmitter<L>,
  /// Last list the backend returned.
  contacts: Mutex<Vec<Contact>>,
  /// One-shot reading that seeds the share dialog.
  seed:     Mutex<Option<Position>>,
}

impl<B, P, L> ShareRegistry<B, P, L>
where
  B: Backend + 'static,
  P: GeoPlatform,
  L: Launcher,
{
  pub fn new(backend: Arc<B>, platform: Arc<P>, handoff: HandoffEmitter<L>) -> Self {
    let throttler = Throttler::new(Arc::clone(&backend));
    Self::with_throttler(backend, platform, handoff, throttler)
  }

  pub fn with_throttler(
    backend: Arc<B>,
    platform: Arc<P>,
    handoff: HandoffEmitter<L>,
    throttler: Throttler<B>,
  ) -> Self {
    let watcher = Watcher::new(Arc::clone(&platform), throttler);
    Self {
      backend,
      platform,
      watcher,
      handoff,
      contacts: Mutex::new(Vec::new()),
      seed: Mutex::new(None),
    }
  }

  // ── Read-only views ─────────────────────────────────────────────────────

  pub async fn contacts(&self) -> Vec<Contact> { self.contacts.lock().await.clone() }

  pub async fn contact(&self, id: Uuid) -> Result<Contact> {
    self
      .contacts
      .lock()
      .await
      .iter()
      .find(|c| c.id == id)
      .cloned()
      .ok_or(Error::ContactNotFound(id))
  }

  pub async fn is_tracking(&self) -> bool { self.watcher.is_running().await }

  pub fn watch_status(&self) -> watch::Receiver<WatchStatus> { self.watcher.status() }

  pub fn positions(&self) -> watch::Receiver<Option<Position>> { self.watcher.positions() }

  pub fn handoff(&self) -> &HandoffEmitter<L> { &self.handoff }

  // ── Dialog seed ─────────────────────────────────────────────────────────

  /// Take a single precise reading to seed the share dialog, then look up its
  /// address. Independent of the continuous watcher.
  pub async fn locate(&self) -> Result<Located> {
    let position = self.platform.current_position(WatchOptions::PRECISE).await?;
    *self.seed.lock().await = Some(position);

    let address = match self.platform.reverse_geocode(position).await {
      Ok(address) => address,
      Err(e) => {
        tracing::debug!("reverse geocoding failed: {e}");
        None
      }
    };
    Ok(Located { position, address })
  }

  pub async fn seed_position(&self, position: Position) { *self.seed.lock().await = Some(position); }

  // ── Reconciliation ──────────────────────────────────────────────────────

  /// Fetch the authoritative list and reconcile the watcher against it.
  pub async fn refresh(&self) -> Result<Vec<Contact>> {
    let contacts = self.backend.list_contacts().await.map_err(Error::backend)?;
    *self.contacts.lock().await = contacts.clone();
    self.reconcile_on_load(&contacts).await;
    Ok(contacts)
  }

  /// Start or stop the watcher so that it runs iff someone in `contacts` is
  /// sharing, whatever it was doing before.
  pub async fn reconcile_on_load(&self, contacts: &[Contact]) {
    let should_run = any_sharing(contacts);
    let running = self.watcher.is_running().await;
    if should_run && !running {
      tracing::info!("active share found on load; starting watcher");
      if let Err(e) = self.watcher.start().await {
        tracing::warn!("could not resume location watch: {e}");
      }
    } else if !should_run && running {
      tracing::info!("no active shares; stopping watcher");
      self.watcher.stop().await;
    }
  }

  /// Resync after a mutation the backend already accepted. A failed fetch
  /// only logs; the mutation itself stands.
  async fn resync(&self) {
    if let Err(e) = self.refresh().await {
      tracing::warn!("contact list resync failed: {e}");
    }
  }

  // ── Shares ──────────────────────────────────────────────────────────────

  /// Start sharing with `contact` for `duration`.
  ///
  /// Requires a seeded position. Steps run strictly in order: persist, start
  /// watcher, resync, handoff. A backend rejection returns before any of the
  /// later steps.
  pub async fn start_share(&self, contact: &Contact, duration: ShareDuration) -> Result<Handoff> {
    let position = (*self.seed.lock().await).ok_or(Error::NoCurrentPosition)?;

    self
      .backend
      .start_location_share(contact.id, duration)
      .await
      .map_err(Error::backend)?;
    tracing::info!(contact = %contact.id, duration = duration.code(), "share persisted");

    if let Err(e) = self.watcher.start().await {
      tracing::warn!("location watch did not start: {e}");
    }
    self.resync().await;

    Ok(self.handoff.emit(contact, duration, &position))
  }

  /// Stop sharing with `contact`. The watcher stops only when no other
  /// contact in the current list is still sharing.
  pub async fn stop_share(&self, contact: &Contact) -> Result<()> {
    self
      .backend
      .stop_location_share(contact.id)
      .await
      .map_err(Error::backend)?;
    tracing::info!(contact = %contact.id, "share cleared");

    let others_sharing = self
      .contacts
      .lock()
      .await
      .iter()
      .any(|c| c.id != contact.id && c.location_active);
    if !others_sharing {
      self.watcher.stop().await;
    }

    self.resync().await;
    Ok(())
  }

  // ── Contact CRUD ────────────────────────────────────────────────────────

  pub async fn save_contact(&self, draft: ContactDraft) -> Result<Contact> {
    let saved = self.backend.save_contact(draft).await.map_err(Error::backend)?;
    self.resync().await;
    Ok(saved)
  }

  /// Deleting a sharing contact ends its share; the resync stops the watcher
  /// if it was the last one.
  pub async fn delete_contact(&self, id: Uuid) -> Result<()> {
    self.backend.delete_contact(id).await.map_err(Error::backend)?;
    self.resync().await;
    Ok(())
  }
}
