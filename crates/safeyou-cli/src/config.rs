//! Settings resolution: CLI flags and env override the TOML file, which
//! overrides defaults.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::Args;

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct ConfigFile {
  url:                String,
  token:              String,
  user_token:         String,
  tracking_url:       String,
  country_code:       String,
  /// Seconds between contact-list resyncs in `track`.
  poll_interval_secs: Option<u64>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
  pub url:           String,
  pub token:         String,
  pub user_token:    String,
  pub tracking_url:  String,
  pub country_code:  String,
  pub poll_interval: Duration,
}

fn pick(flag: Option<String>, file: String, default: &str) -> String {
  flag
    .or_else(|| (!file.is_empty()).then_some(file))
    .unwrap_or_else(|| default.to_string())
}

impl Settings {
  pub fn resolve(args: &Args) -> Result<Self> {
    let file: ConfigFile = match &args.config {
      Some(path) => {
        let raw = std::fs::read_to_string(path)
          .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).context("parsing config file")?
      }
      None => ConfigFile::default(),
    };
    Self::merge(args, file)
  }

  fn merge(args: &Args, file: ConfigFile) -> Result<Self> {
    let poll_secs = args.poll_interval.or(file.poll_interval_secs).unwrap_or(60);
    if poll_secs == 0 {
      bail!("poll interval must be at least one second");
    }

    Ok(Settings {
      url:           pick(args.url.clone(), file.url, "http://localhost:8080"),
      token:         pick(args.token.clone(), file.token, ""),
      user_token:    pick(args.user_token.clone(), file.user_token, ""),
      tracking_url:  pick(args.tracking_url.clone(), file.tracking_url, "https://safeyou.app"),
      country_code:  pick(args.country_code.clone(), file.country_code, "55"),
      poll_interval: Duration::from_secs(poll_secs),
    })
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[test]
  fn flags_override_file_and_defaults_fill_gaps() {
    let args = Args::try_parse_from(["safeyou", "--url", "https://api.example", "contacts"]).unwrap();
    let file: ConfigFile = toml::from_str(
      r#"
        url = "http://ignored"
        token = "abc"
        poll_interval_secs = 15
      "#,
    )
    .unwrap();

    let s = Settings::merge(&args, file).unwrap();
    assert_eq!(s.url, "https://api.example");
    assert_eq!(s.token, "abc");
    assert_eq!(s.country_code, "55");
    assert_eq!(s.tracking_url, "https://safeyou.app");
    assert_eq!(s.poll_interval, Duration::from_secs(15));
  }

  #[test]
  fn poll_interval_flag_beats_file() {
    let args =
      Args::try_parse_from(["safeyou", "--poll-interval", "5", "track"]).unwrap();
    let file: ConfigFile = toml::from_str("poll_interval_secs = 30").unwrap();

    let s = Settings::merge(&args, file).unwrap();
    assert_eq!(s.poll_interval, Duration::from_secs(5));
  }

  #[test]
  fn zero_poll_interval_is_rejected() {
    let args = Args::try_parse_from(["safeyou", "track"]).unwrap();
    let file: ConfigFile = toml::from_str("poll_interval_secs = 0").unwrap();
    assert!(Settings::merge(&args, file).is_err());

    let args = Args::try_parse_from(["safeyou", "--poll-interval", "0", "track"]).unwrap();
    assert!(Settings::merge(&args, ConfigFile::default()).is_err());
  }
}
