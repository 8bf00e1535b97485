//! The WhatsApp handoff sent after a share is persisted.

use safeyou_core::{
  contact::Contact,
  platform::Launcher,
  position::Position,
  share::ShareDuration,
};

/// Where links in the handoff message point.
#[derive(Debug, Clone)]
pub struct HandoffConfig {
  /// Base of the public tracking page, e.g. `https://safeyou.app`.
  pub tracking_base_url: String,
  /// Identifies the sharing user in the tracking link.
  pub user_token:        String,
  /// Calling code prefixed to phone numbers that lack one.
  pub country_code:      String,
}

impl Default for HandoffConfig {
  fn default() -> Self {
    Self {
      tracking_base_url: "https://safeyou.app".into(),
      user_token:        String::new(),
      country_code:      "55".into(),
    }
  }
}

/// A composed handoff, returned after it was handed to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
  /// Digits-only international number.
  pub phone:   String,
  pub message: String,
  /// The `wa.me` deep link carrying `message`.
  pub url:     String,
}

/// Builds share messages and opens them in the messaging app.
pub struct HandoffEmitter<L> {
  config:   HandoffConfig,
  launcher: L,
}

impl<L: Launcher> HandoffEmitter<L> {
  pub fn new(config: HandoffConfig, launcher: L) -> Self { Self { config, launcher } }

  pub fn launcher(&self) -> &L { &self.launcher }

  /// Compose the message for `contact` and open it. Whether the user sends
  /// it is unknown and irrelevant to the share state.
  pub fn emit(
    &self,
    contact: &Contact,
    duration: ShareDuration,
    position: &Position,
  ) -> Handoff {
    let handoff = self.compose(contact, duration, position);
    tracing::info!(contact = %contact.id, "opening share handoff");
    self.launcher.open(&handoff.url);
    handoff
  }

  pub fn compose(
    &self,
    contact: &Contact,
    duration: ShareDuration,
    position: &Position,
  ) -> Handoff {
    let tracking = self.tracking_link();
    let maps = maps_link(position);
    let message = format!(
      "Olá {name}! Estou compartilhando minha localização em tempo real com você \
       pelo Safe You durante {label}.\n\n\
       Acompanhe aqui: {tracking}\n\n\
       Minha última localização: {maps}",
      name = contact.name,
      label = duration.label(),
    );
    let phone = international_digits(&contact.phone, &self.config.country_code);
    let url = format!("https://wa.me/{phone}?text={}", encode_component(&message));
    Handoff {
      phone,
      message,
      url,
    }
  }

  fn tracking_link(&self) -> String {
    format!(
      "{}/tracking/{}",
      self.config.tracking_base_url.trim_end_matches('/'),
      self.config.user_token
    )
  }
}

/// Map-service link for raw coordinates, usable without the tracking page.
pub fn maps_link(position: &Position) -> String {
  format!(
    "https://www.google.com/maps?q={},{}",
    position.latitude, position.longitude
  )
}

/// Strip everything but digits and prefix `country_code` unless the number
/// already carries it.
///
/// Local numbers are at most 11 digits, so anything longer that starts with
/// the calling code is taken as already international.
fn international_digits(phone: &str, country_code: &str) -> String {
  let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
  if digits.len() > 11 && digits.starts_with(country_code) {
    digits
  } else {
    format!("{country_code}{digits}")
  }
}

/// Percent-encode for a query value, spaces as `%20`.
fn encode_component(s: &str) -> String {
  // `byte_serialize` writes a literal '+' as %2B, so every remaining '+'
  // stands for a space.
  url::form_urlencoded::byte_serialize(s.as_bytes())
    .collect::<String>()
    .replace('+', "%20")
}
