//! Async HTTP client wrapping the Safe You JSON API.

use std::time::Duration;

use reqwest::{Client, Response};
use safeyou_core::{
  backend::Backend,
  contact::{Contact, ContactDraft},
  share::ShareDuration,
};
use serde_json::json;
use uuid::Uuid;

use crate::{Error, Result};

/// Connection settings for the Safe You API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Bearer token of the signed-in user; empty for none.
  pub token:    String,
}

/// Async HTTP client for the Safe You REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpBackend {
  client: Client,
  config: ApiConfig,
}

impl HttpBackend {
  pub fn new(config: ApiConfig) -> Result<Self> {
    url::Url::parse(&config.base_url)?;
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.token.is_empty() {
      req
    } else {
      req.bearer_auth(&self.config.token)
    }
  }

  /// Turn a non-2xx response into [`Error::Status`].
  fn check(resp: Response, request: &str) -> Result<Response> {
    if resp.status().is_success() {
      Ok(resp)
    } else {
      Err(Error::Status {
        request: request.to_owned(),
        status:  resp.status(),
      })
    }
  }
}

impl Backend for HttpBackend {
  type Error = Error;

  // ── Contacts ──────────────────────────────────────────────────────────────

  /// `GET /api/contacts`
  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    let resp = self
      .auth(self.client.get(self.url("/contacts")))
      .send()
      .await?;
    let resp = Self::check(resp, "GET /contacts")?;
    Ok(resp.json().await?)
  }

  /// `POST /api/contacts` for new contacts, `PUT /api/contacts/<id>` otherwise.
  async fn save_contact(&self, draft: ContactDraft) -> Result<Contact> {
    let (req, label) = match draft.id {
      Some(id) => (
        self.client.put(self.url(&format!("/contacts/{id}"))),
        "PUT /contacts/{id}",
      ),
      None => (self.client.post(self.url("/contacts")), "POST /contacts"),
    };
    let resp = self.auth(req).json(&draft).send().await?;
    let resp = Self::check(resp, label)?;
    Ok(resp.json().await?)
  }

  /// `DELETE /api/contacts/<id>`
  async fn delete_contact(&self, id: Uuid) -> Result<()> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/contacts/{id}"))))
      .send()
      .await?;
    Self::check(resp, "DELETE /contacts/{id}")?;
    Ok(())
  }

  // ── Location sharing ──────────────────────────────────────────────────────

  /// `POST /api/contacts/<id>/location-share` with `{"duration":"1h"}`
  async fn start_location_share(&self, contact_id: Uuid, duration: ShareDuration) -> Result<()> {
    let resp = self
      .auth(
        self
          .client
          .post(self.url(&format!("/contacts/{contact_id}/location-share"))),
      )
      .json(&json!({ "duration": duration }))
      .send()
      .await?;
    Self::check(resp, "POST /contacts/{id}/location-share")?;
    Ok(())
  }

  /// `DELETE /api/contacts/<id>/location-share`
  async fn stop_location_share(&self, contact_id: Uuid) -> Result<()> {
    let resp = self
      .auth(
        self
          .client
          .delete(self.url(&format!("/contacts/{contact_id}/location-share"))),
      )
      .send()
      .await?;
    Self::check(resp, "DELETE /contacts/{id}/location-share")?;
    Ok(())
  }

  /// `POST /api/users/me/location`
  async fn update_user_location(&self, latitude: f64, longitude: f64) -> Result<()> {
    let resp = self
      .auth(self.client.post(self.url("/users/me/location")))
      .json(&json!({ "latitude": latitude, "longitude": longitude }))
      .send()
      .await?;
    Self::check(resp, "POST /users/me/location")?;
    Ok(())
  }
}
