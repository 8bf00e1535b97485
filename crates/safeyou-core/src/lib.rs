//! Core types and trait definitions for the Safe You location-sharing client.
//!
//! This crate is deliberately free of HTTP dependencies. It names the
//! collaborators the tracker talks to (the REST backend, the geolocation
//! platform, the messaging launcher) as traits, and nothing else.

pub mod backend;
pub mod contact;
pub mod error;
pub mod platform;
pub mod position;
pub mod share;

pub use error::{Error, Result};
