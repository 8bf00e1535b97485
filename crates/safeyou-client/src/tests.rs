//! Client tests against an in-process axum server.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  Json,
  Router,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  routing::{get, post, put},
};
use safeyou_core::{
  backend::Backend,
  contact::{Contact, ContactDraft},
  platform::{GeoError, GeoPlatform},
  position::{AccuracyTier, Position, WatchOptions},
  share::ShareDuration,
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::mpsc};
use uuid::Uuid;

use crate::{ApiConfig, Error, HttpBackend, IpGeolocation, IpGeolocationConfig};

// ─── Fake server ─────────────────────────────────────────────────────────────

const TOKEN: &str = "secret";

#[derive(Clone, Default)]
struct Fake {
  contacts: Arc<Mutex<Vec<Contact>>>,
  log:      Arc<Mutex<Vec<String>>>,
}

impl Fake {
  fn log(&self) -> Vec<String> { self.log.lock().unwrap().clone() }

  fn record(&self, entry: String) { self.log.lock().unwrap().push(entry); }
}

fn authorized(headers: &HeaderMap) -> Result<(), StatusCode> {
  let expected = format!("Bearer {TOKEN}");
  match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
    Some(v) if v == expected => Ok(()),
    _ => Err(StatusCode::UNAUTHORIZED),
  }
}

fn from_draft(id: Uuid, draft: ContactDraft) -> Contact {
  Contact {
    id,
    name: draft.name,
    relation: draft.relation,
    phone: draft.phone,
    email: draft.email,
    is_emergency: draft.is_emergency,
    location_active: false,
  }
}

async fn list(State(f): State<Fake>, headers: HeaderMap) -> Result<Json<Vec<Contact>>, StatusCode> {
  authorized(&headers)?;
  Ok(Json(f.contacts.lock().unwrap().clone()))
}

async fn create(
  State(f): State<Fake>,
  headers: HeaderMap,
  Json(draft): Json<ContactDraft>,
) -> Result<(StatusCode, Json<Contact>), StatusCode> {
  authorized(&headers)?;
  let contact = from_draft(Uuid::new_v4(), draft);
  f.contacts.lock().unwrap().push(contact.clone());
  f.record(format!("create {}", contact.name));
  Ok((StatusCode::CREATED, Json(contact)))
}

async fn update(
  State(f): State<Fake>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
  Json(draft): Json<ContactDraft>,
) -> Result<Json<Contact>, StatusCode> {
  authorized(&headers)?;
  let mut contacts = f.contacts.lock().unwrap();
  let slot = contacts
    .iter_mut()
    .find(|c| c.id == id)
    .ok_or(StatusCode::NOT_FOUND)?;
  let active = slot.location_active;
  *slot = from_draft(id, draft);
  slot.location_active = active;
  f.record(format!("update {id}"));
  Ok(Json(slot.clone()))
}

async fn remove(
  State(f): State<Fake>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
  authorized(&headers)?;
  let mut contacts = f.contacts.lock().unwrap();
  let before = contacts.len();
  contacts.retain(|c| c.id != id);
  if contacts.len() == before {
    return Err(StatusCode::NOT_FOUND);
  }
  Ok(StatusCode::NO_CONTENT)
}

async fn set_share(f: &Fake, id: Uuid, active: bool) -> Result<StatusCode, StatusCode> {
  let mut contacts = f.contacts.lock().unwrap();
  let c = contacts
    .iter_mut()
    .find(|c| c.id == id)
    .ok_or(StatusCode::NOT_FOUND)?;
  c.location_active = active;
  Ok(StatusCode::NO_CONTENT)
}

async fn start_share(
  State(f): State<Fake>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
  Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
  authorized(&headers)?;
  f.record(format!("share {id} {}", body["duration"].as_str().unwrap_or("?")));
  set_share(&f, id, true).await
}

async fn stop_share(
  State(f): State<Fake>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
  authorized(&headers)?;
  f.record(format!("unshare {id}"));
  set_share(&f, id, false).await
}

async fn location(
  State(f): State<Fake>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
  authorized(&headers)?;
  f.record(format!("location {} {}", body["latitude"], body["longitude"]));
  Ok(StatusCode::NO_CONTENT)
}

async fn ip_ok() -> Json<Value> {
  Json(json!({ "status": "success", "lat": -23.55, "lon": -46.63, "city": "São Paulo" }))
}

async fn ip_fail() -> Json<Value> {
  Json(json!({ "status": "fail", "message": "reserved range" }))
}

async fn ip_slow() -> Json<Value> {
  tokio::time::sleep(Duration::from_secs(5)).await;
  ip_ok().await
}

async fn reverse(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
  Json(json!({ "display_name": format!("near {},{}", q["lat"], q["lon"]) }))
}

async fn serve(fake: Fake) -> String {
  let app = Router::new()
    .route("/api/contacts", get(list).post(create))
    .route("/api/contacts/{id}", put(update).delete(remove))
    .route(
      "/api/contacts/{id}/location-share",
      post(start_share).delete(stop_share),
    )
    .route("/api/users/me/location", post(location))
    .route("/ip", get(ip_ok))
    .route("/ip-fail", get(ip_fail))
    .route("/ip-slow", get(ip_slow))
    .route("/reverse", get(reverse))
    .with_state(fake);

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}")
}

fn backend(base_url: &str, token: &str) -> HttpBackend {
  HttpBackend::new(ApiConfig {
    base_url: base_url.to_owned(),
    token:    token.to_owned(),
  })
  .unwrap()
}

fn draft(name: &str) -> ContactDraft {
  ContactDraft {
    name: name.into(),
    relation: "Pai".into(),
    phone: "+55 (21) 99999-1234".into(),
    ..Default::default()
  }
}

fn geo(base_url: &str, locate: &str) -> IpGeolocation {
  IpGeolocation::new(IpGeolocationConfig {
    locate_url: format!("{base_url}{locate}"),
    reverse_url: format!("{base_url}/reverse"),
    poll_interval: Duration::from_millis(10),
    ..Default::default()
  })
  .unwrap()
}

// ─── HttpBackend ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn contact_crud_round_trip() {
  let fake = Fake::default();
  let base = serve(fake.clone()).await;
  let api = backend(&base, TOKEN);

  let created = api.save_contact(draft("João")).await.unwrap();
  assert_eq!(created.name, "João");
  assert!(!created.location_active);

  let mut edit = ContactDraft::from(&created);
  edit.name = "João Silva".into();
  let updated = api.save_contact(edit).await.unwrap();
  assert_eq!(updated.id, created.id);

  let listed = api.list_contacts().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].name, "João Silva");

  api.delete_contact(created.id).await.unwrap();
  assert!(api.list_contacts().await.unwrap().is_empty());
  assert_eq!(
    fake.log(),
    vec!["create João".to_string(), format!("update {}", created.id)]
  );
}

#[tokio::test]
async fn share_calls_flip_server_flag() {
  let fake = Fake::default();
  let base = serve(fake.clone()).await;
  let api = backend(&base, TOKEN);
  let c = api.save_contact(draft("Ana")).await.unwrap();

  api
    .start_location_share(c.id, ShareDuration::TwelveHours)
    .await
    .unwrap();
  assert!(api.list_contacts().await.unwrap()[0].location_active);

  api.stop_location_share(c.id).await.unwrap();
  assert!(!api.list_contacts().await.unwrap()[0].location_active);

  let log = fake.log();
  assert!(log.contains(&format!("share {} 12h", c.id)), "log: {log:?}");
  assert!(log.contains(&format!("unshare {}", c.id)), "log: {log:?}");
}

#[tokio::test]
async fn location_upload_posts_coordinates() {
  let fake = Fake::default();
  let base = serve(fake.clone()).await;
  let api = backend(&base, TOKEN);

  api.update_user_location(10.0, 20.5).await.unwrap();

  assert_eq!(fake.log(), vec!["location 10.0 20.5".to_string()]);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
  let base = serve(Fake::default()).await;

  let err = backend(&base, "wrong").list_contacts().await.unwrap_err();
  assert!(
    matches!(err, Error::Status { status, .. } if status == StatusCode::UNAUTHORIZED),
    "{err}"
  );

  let err = backend(&base, TOKEN)
    .stop_location_share(Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Status { status, .. } if status == StatusCode::NOT_FOUND));
}

#[test]
fn invalid_base_url_is_rejected() {
  let err = HttpBackend::new(ApiConfig {
    base_url: "not a url".into(),
    token:    String::new(),
  })
  .err()
  .unwrap();
  assert!(matches!(err, Error::Url(_)));
}

// ─── IpGeolocation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn current_position_from_ip_lookup() {
  let base = serve(Fake::default()).await;
  let g = geo(&base, "/ip");

  let pos = g.current_position(WatchOptions::PRECISE).await.unwrap();
  assert_eq!((pos.latitude, pos.longitude), (-23.55, -46.63));
  assert_eq!(pos.accuracy, AccuracyTier::Low);
}

#[tokio::test]
async fn declined_lookup_is_unavailable() {
  let base = serve(Fake::default()).await;
  let g = geo(&base, "/ip-fail");

  let err = g.current_position(WatchOptions::RELAXED).await.unwrap_err();
  assert_eq!(err, GeoError::PositionUnavailable);
}

#[tokio::test]
async fn slow_lookup_times_out() {
  let base = serve(Fake::default()).await;
  let g = geo(&base, "/ip-slow");
  let options = WatchOptions {
    timeout: Duration::from_millis(50),
    ..WatchOptions::PRECISE
  };

  let err = g.current_position(options).await.unwrap_err();
  assert_eq!(err, GeoError::Timeout);
}

#[tokio::test]
async fn watch_polls_until_cleared() {
  let base = serve(Fake::default()).await;
  let g = geo(&base, "/ip");
  let (tx, mut rx) = mpsc::unbounded_channel();

  let id = g.watch_position(WatchOptions::PRECISE, tx).unwrap();
  for _ in 0..2 {
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
      .await
      .unwrap()
      .unwrap();
    assert!(event.is_ok());
  }
  assert_eq!(g.active_watches(), 1);

  g.clear_watch(id);
  assert_eq!(g.active_watches(), 0);
  // The aborted task drops its sender; the channel drains and closes.
  let closed = tokio::time::timeout(Duration::from_secs(5), async {
    while rx.recv().await.is_some() {}
  })
  .await;
  assert!(closed.is_ok());
}

#[tokio::test]
async fn reverse_geocode_returns_display_name() {
  let base = serve(Fake::default()).await;
  let g = geo(&base, "/ip");
  let pos = Position::new(10.0, 20.0, AccuracyTier::High);

  let address = g.reverse_geocode(pos).await.unwrap();
  assert_eq!(address.as_deref(), Some("near 10,20"));
}
