//! HTTP implementations of the Safe You seams.
//!
//! - [`HttpBackend`] talks to the Safe You REST API.
//! - [`IpGeolocation`] is a desktop stand-in for a device GPS: it polls an IP
//!   geolocation service and reverse geocodes through Nominatim.

mod api;
mod geo;

pub mod error;

pub use api::{ApiConfig, HttpBackend};
pub use error::{Error, Result};
pub use geo::{IpGeolocation, IpGeolocationConfig};

#[cfg(test)]
mod tests;
