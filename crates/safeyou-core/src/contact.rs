//! Contact — a trusted person the user may share their location with.
//!
//! Contacts are owned by the backend. The client only ever holds the list the
//! backend last returned; `location_active` in particular is never flipped
//! locally.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contact as returned by `list contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              Uuid,
  pub name:            String,
  /// Free-form relation label, e.g. "Mãe" or "Amigo".
  pub relation:        String,
  pub phone:           String,
  #[serde(default)]
  pub email:           Option<String>,
  #[serde(default)]
  pub is_emergency:    bool,
  /// Server-confirmed sharing state.
  #[serde(default)]
  pub location_active: bool,
}

/// The create/update payload for `save contact`.
///
/// `id` is `None` for a new contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:           Option<Uuid>,
  pub name:         String,
  pub relation:     String,
  pub phone:        String,
  pub email:        Option<String>,
  pub is_emergency: bool,
}

impl From<&Contact> for ContactDraft {
  fn from(c: &Contact) -> Self {
    ContactDraft {
      id:           Some(c.id),
      name:         c.name.clone(),
      relation:     c.relation.clone(),
      phone:        c.phone.clone(),
      email:        c.email.clone(),
      is_emergency: c.is_emergency,
    }
  }
}

/// True if any contact in `contacts` currently has an active share.
pub fn any_sharing(contacts: &[Contact]) -> bool {
  contacts.iter().any(|c| c.location_active)
}
