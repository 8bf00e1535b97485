//! Share durations offered in the share-setup dialog.

use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// How long a share stays active on the backend.
///
/// The wire code (`"1h"`, `"1w"`, …) is what the backend stores; the label is
/// what the contact reads in the handoff message.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
pub enum ShareDuration {
  #[serde(rename = "1h")]
  #[strum(serialize = "1h")]
  OneHour,
  #[serde(rename = "2h")]
  #[strum(serialize = "2h")]
  TwoHours,
  #[serde(rename = "4h")]
  #[strum(serialize = "4h")]
  FourHours,
  #[serde(rename = "8h")]
  #[strum(serialize = "8h")]
  EightHours,
  #[serde(rename = "12h")]
  #[strum(serialize = "12h")]
  TwelveHours,
  #[serde(rename = "1d")]
  #[strum(serialize = "1d")]
  OneDay,
  #[serde(rename = "2d")]
  #[strum(serialize = "2d")]
  TwoDays,
  #[serde(rename = "3d")]
  #[strum(serialize = "3d")]
  ThreeDays,
  #[serde(rename = "1w")]
  #[strum(serialize = "1w")]
  OneWeek,
  #[serde(rename = "2w")]
  #[strum(serialize = "2w")]
  TwoWeeks,
  #[serde(rename = "1m")]
  #[strum(serialize = "1m")]
  OneMonth,
  #[serde(rename = "indefinite")]
  #[strum(serialize = "indefinite")]
  Indefinite,
}

impl ShareDuration {
  /// The backend wire code.
  pub fn code(self) -> &'static str { self.into() }

  /// Human label used in the handoff message.
  pub fn label(self) -> &'static str {
    match self {
      Self::OneHour => "1 hora",
      Self::TwoHours => "2 horas",
      Self::FourHours => "4 horas",
      Self::EightHours => "8 horas",
      Self::TwelveHours => "12 horas",
      Self::OneDay => "1 dia",
      Self::TwoDays => "2 dias",
      Self::ThreeDays => "3 dias",
      Self::OneWeek => "1 semana",
      Self::TwoWeeks => "2 semanas",
      Self::OneMonth => "1 mês",
      Self::Indefinite => "Indeterminado",
    }
  }

  /// Wall-clock length, `None` for [`ShareDuration::Indefinite`].
  ///
  /// A month counts as 30 days.
  pub fn as_duration(self) -> Option<Duration> {
    let secs = match self {
      Self::OneHour => HOUR,
      Self::TwoHours => 2 * HOUR,
      Self::FourHours => 4 * HOUR,
      Self::EightHours => 8 * HOUR,
      Self::TwelveHours => 12 * HOUR,
      Self::OneDay => DAY,
      Self::TwoDays => 2 * DAY,
      Self::ThreeDays => 3 * DAY,
      Self::OneWeek => 7 * DAY,
      Self::TwoWeeks => 14 * DAY,
      Self::OneMonth => 30 * DAY,
      Self::Indefinite => return None,
    };
    Some(Duration::from_secs(secs))
  }

  /// Parse a wire code, e.g. `"12h"`.
  pub fn from_code(code: &str) -> Result<Self> {
    <Self as FromStr>::from_str(code.trim())
      .map_err(|_| Error::UnknownDuration(code.to_owned()))
  }

  /// Every option in dialog order.
  pub fn all() -> impl Iterator<Item = ShareDuration> { Self::iter() }
}

impl std::fmt::Display for ShareDuration {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn twelve_options_with_unique_codes() {
    let codes: Vec<_> = ShareDuration::all().map(ShareDuration::code).collect();
    assert_eq!(codes.len(), 12);
    let mut dedup = codes.clone();
    dedup.sort();
    dedup.dedup();
    assert_eq!(dedup.len(), 12);
  }

  #[test]
  fn code_matches_serde_representation() {
    for d in ShareDuration::all() {
      let json = serde_json::to_string(&d).unwrap();
      assert_eq!(json, format!("\"{}\"", d.code()));
      assert_eq!(ShareDuration::from_code(d.code()).unwrap(), d);
    }
  }

  #[test]
  fn labels() {
    assert_eq!(ShareDuration::OneHour.label(), "1 hora");
    assert_eq!(ShareDuration::OneMonth.label(), "1 mês");
    assert_eq!(ShareDuration::Indefinite.to_string(), "Indeterminado");
  }

  #[test]
  fn indefinite_has_no_length() {
    assert_eq!(ShareDuration::Indefinite.as_duration(), None);
    assert_eq!(
      ShareDuration::OneWeek.as_duration(),
      Some(Duration::from_secs(7 * 24 * 3600))
    );
  }

  #[test]
  fn unknown_code_is_rejected() {
    assert!(matches!(
      ShareDuration::from_code("5h"),
      Err(Error::UnknownDuration(c)) if c == "5h"
    ));
  }
}
