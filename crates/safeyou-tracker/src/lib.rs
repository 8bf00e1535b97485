//! Real-time location sharing for Safe You.
//!
//! The pieces, leaves first:
//!
//! - [`Watcher`] owns the single continuous geolocation subscription and
//!   falls back to relaxed accuracy once per start.
//! - [`Throttler`] forwards at most one position upload per interval.
//! - [`ShareRegistry`] decides when the watcher runs, always re-deriving that
//!   from the backend's contact list.
//! - [`HandoffEmitter`] builds the WhatsApp message once a share is persisted.

mod handoff;
mod registry;
mod throttle;
mod watcher;

pub mod error;

pub use error::{Error, Result};
pub use handoff::{Handoff, HandoffConfig, HandoffEmitter};
pub use registry::{Located, ShareRegistry};
pub use throttle::{Throttler, UPLOAD_INTERVAL};
pub use watcher::{WatchStatus, Watcher};
