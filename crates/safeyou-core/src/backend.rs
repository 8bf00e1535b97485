//! The remote REST backend, seen from the client.

use uuid::Uuid;

use crate::{
  contact::{Contact, ContactDraft},
  share::ShareDuration,
};

/// Abstraction over the Safe You REST API.
///
/// The backend owns every piece of state this client displays. In particular
/// it is the only writer of [`Contact::location_active`]: the share calls
/// below flip it, and callers learn the new value by listing again.
///
/// All methods return `Send` futures so implementations can be shared across
/// tokio tasks (the watcher uploads from its own task).
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Return every contact of the signed-in user.
  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Create (`draft.id == None`) or update a contact.
  fn save_contact(
    &self,
    draft: ContactDraft,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn delete_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Location sharing ──────────────────────────────────────────────────

  /// Persist a share; on success the contact's `location_active` is true
  /// server-side.
  fn start_location_share(
    &self,
    contact_id: Uuid,
    duration: ShareDuration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Clear a share; on success the contact's `location_active` is false
  /// server-side.
  fn stop_location_share(
    &self,
    contact_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Best-effort telemetry sink for the user's latest position.
  fn update_user_location(
    &self,
    latitude: f64,
    longitude: f64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
