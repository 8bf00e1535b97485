//! Position readings and the options used to request them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a reading was requested with high accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyTier {
  High,
  Low,
}

/// A single geolocation reading. Held in memory only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub latitude:    f64,
  pub longitude:   f64,
  pub accuracy:    AccuracyTier,
  pub captured_at: DateTime<Utc>,
}

impl Position {
  pub fn new(latitude: f64, longitude: f64, accuracy: AccuracyTier) -> Self {
    Self {
      latitude,
      longitude,
      accuracy,
      captured_at: Utc::now(),
    }
  }
}

/// Options for a position request, mirroring the platform's
/// high-accuracy / maximum-age / timeout triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
  pub high_accuracy: bool,
  /// Oldest cached reading the platform may hand back.
  pub maximum_age:   Duration,
  pub timeout:       Duration,
}

impl WatchOptions {
  /// First-choice subscription.
  pub const PRECISE: WatchOptions = WatchOptions {
    high_accuracy: true,
    maximum_age:   Duration::from_secs(10),
    timeout:       Duration::from_secs(30),
  };

  /// Fallback after a transient failure of [`WatchOptions::PRECISE`].
  pub const RELAXED: WatchOptions = WatchOptions {
    high_accuracy: false,
    maximum_age:   Duration::from_secs(30),
    timeout:       Duration::from_secs(30),
  };

  pub fn tier(&self) -> AccuracyTier {
    if self.high_accuracy {
      AccuracyTier::High
    } else {
      AccuracyTier::Low
    }
  }
}
