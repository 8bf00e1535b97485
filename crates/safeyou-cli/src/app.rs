//! Command handlers on top of the share registry.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use safeyou_client::{ApiConfig, HttpBackend, IpGeolocation, IpGeolocationConfig};
use safeyou_core::{
  contact::{Contact, ContactDraft, any_sharing},
  platform::Launcher,
  share::ShareDuration,
};
use safeyou_tracker::{HandoffConfig, HandoffEmitter, ShareRegistry, WatchStatus};
use uuid::Uuid;

use crate::config::Settings;

/// Prints the messaging link; a terminal cannot open WhatsApp for the user.
pub struct TerminalLauncher;

impl Launcher for TerminalLauncher {
  fn open(&self, url: &str) {
    println!("Open this link to notify your contact:\n  {url}");
  }
}

/// Optional field changes for `edit`.
pub struct ContactEdit {
  pub name:      Option<String>,
  pub relation:  Option<String>,
  pub phone:     Option<String>,
  pub email:     Option<String>,
  pub emergency: Option<bool>,
}

type Registry = ShareRegistry<HttpBackend, IpGeolocation, TerminalLauncher>;

pub struct App {
  registry: Registry,
}

impl App {
  pub fn new(settings: &Settings) -> Result<Self> {
    let backend = HttpBackend::new(ApiConfig {
      base_url: settings.url.clone(),
      token:    settings.token.clone(),
    })
    .context("building API client")?;
    let platform =
      IpGeolocation::new(IpGeolocationConfig::default()).context("building geolocation client")?;
    let handoff = HandoffEmitter::new(
      HandoffConfig {
        tracking_base_url: settings.tracking_url.clone(),
        user_token:        settings.user_token.clone(),
        country_code:      settings.country_code.clone(),
      },
      TerminalLauncher,
    );

    Ok(Self {
      registry: ShareRegistry::new(Arc::new(backend), Arc::new(platform), handoff),
    })
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  pub async fn list(&self) -> Result<()> {
    let contacts = self.registry.refresh().await.context("loading contacts")?;
    if contacts.is_empty() {
      println!("No contacts yet.");
    }
    for c in &contacts {
      print_contact(c);
    }
    Ok(())
  }

  pub async fn add(
    &self,
    name: String,
    relation: String,
    phone: String,
    email: Option<String>,
    emergency: bool,
  ) -> Result<()> {
    let saved = self
      .registry
      .save_contact(ContactDraft {
        id: None,
        name,
        relation,
        phone,
        email,
        is_emergency: emergency,
      })
      .await
      .context("saving contact")?;
    print_contact(&saved);
    Ok(())
  }

  pub async fn edit(&self, id: Uuid, edit: ContactEdit) -> Result<()> {
    self.registry.refresh().await.context("loading contacts")?;
    let mut draft = ContactDraft::from(&self.registry.contact(id).await?);
    if let Some(name) = edit.name {
      draft.name = name;
    }
    if let Some(relation) = edit.relation {
      draft.relation = relation;
    }
    if let Some(phone) = edit.phone {
      draft.phone = phone;
    }
    if edit.email.is_some() {
      draft.email = edit.email;
    }
    if let Some(emergency) = edit.emergency {
      draft.is_emergency = emergency;
    }
    let saved = self.registry.save_contact(draft).await.context("saving contact")?;
    print_contact(&saved);
    Ok(())
  }

  pub async fn remove(&self, id: Uuid) -> Result<()> {
    self.registry.delete_contact(id).await.context("deleting contact")?;
    println!("Deleted {id}.");
    Ok(())
  }

  // ── Sharing ───────────────────────────────────────────────────────────────

  pub async fn share(&self, id: Uuid, duration: ShareDuration) -> Result<()> {
    self.registry.refresh().await.context("loading contacts")?;
    let contact = self.registry.contact(id).await?;

    let located = self
      .registry
      .locate()
      .await
      .context("could not determine your location")?;
    match &located.address {
      Some(address) => println!("You are near {address}."),
      None => println!(
        "You are at {:.5}, {:.5}.",
        located.position.latitude, located.position.longitude
      ),
    }

    self
      .registry
      .start_share(&contact, duration)
      .await
      .with_context(|| format!("starting share with {}", contact.name))?;
    println!("Sharing your location with {} for {}.", contact.name, duration);
    Ok(())
  }

  pub async fn unshare(&self, id: Uuid) -> Result<()> {
    self.registry.refresh().await.context("loading contacts")?;
    let contact = self.registry.contact(id).await?;
    self
      .registry
      .stop_share(&contact)
      .await
      .with_context(|| format!("stopping share with {}", contact.name))?;
    println!("Stopped sharing with {}.", contact.name);
    Ok(())
  }

  /// Keep the watcher alive until Ctrl-C, the last share ends, or location
  /// access is denied. The contact list is resynced every `poll`.
  pub async fn track(&self, poll: Duration) -> Result<()> {
    let contacts = self.registry.refresh().await.context("loading contacts")?;
    if !self.registry.is_tracking().await {
      return not_tracking(any_sharing(&contacts), *self.registry.watch_status().borrow());
    }
    println!("Tracking. Press Ctrl-C to stop (shares stay active on the server).");

    let mut positions = self.registry.positions();
    let mut status = self.registry.watch_status();
    let mut resync = tokio::time::interval(poll);
    resync.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
      tokio::select! {
        _ = &mut ctrl_c => break,
        changed = positions.changed() => {
          if changed.is_err() {
            break;
          }
          if let Some(p) = *positions.borrow_and_update() {
            println!(
              "{} {:.5} {:.5}",
              p.captured_at.format("%H:%M:%S"),
              p.latitude,
              p.longitude
            );
          }
        }
        changed = status.changed() => {
          if changed.is_err() {
            break;
          }
          if *status.borrow_and_update() == WatchStatus::Denied {
            anyhow::bail!("location access denied");
          }
        }
        _ = resync.tick() => {
          match self.registry.refresh().await {
            Ok(_) if !self.registry.is_tracking().await => {
              println!("All shares have ended.");
              break;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("resync failed: {e}"),
          }
        }
      }
    }
    Ok(())
  }
}

/// Outcome of `track` when the watcher is not running after a refresh.
fn not_tracking(sharing: bool, status: WatchStatus) -> Result<()> {
  match (sharing, status) {
    (false, _) => {
      println!("No active shares; nothing to track.");
      Ok(())
    }
    (true, WatchStatus::Denied) => {
      anyhow::bail!("location access denied; active shares cannot be tracked")
    }
    (true, _) => anyhow::bail!("location unavailable; active shares cannot be tracked"),
  }
}

fn print_contact(c: &Contact) {
  let mut flags = Vec::new();
  if c.is_emergency {
    flags.push("emergency");
  }
  if c.location_active {
    flags.push("sharing");
  }
  println!(
    "{}  {:<24} {:<12} {:<18} {}",
    c.id,
    c.name,
    c.relation,
    c.phone,
    flags.join(",")
  );
}
