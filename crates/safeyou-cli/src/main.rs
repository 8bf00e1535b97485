//! `safeyou` — command-line client for Safe You contacts and location sharing.
//!
//! # Usage
//!
//! ```
//! safeyou --url https://api.safeyou.app --token <jwt> contacts
//! safeyou --config ~/.config/safeyou/config.toml share <contact-id> --duration 2h
//! safeyou track
//! ```

mod app;
mod config;

use anyhow::Result;
use app::{App, ContactEdit};
use clap::{Parser, Subcommand};
use safeyou_core::share::ShareDuration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "safeyou", version, about = "Safe You contacts and live location sharing")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the Safe You API.
  #[arg(long, env = "SAFEYOU_URL")]
  url: Option<String>,

  /// Bearer token of the signed-in user.
  #[arg(long, env = "SAFEYOU_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Token identifying the user in tracking links.
  #[arg(long, env = "SAFEYOU_USER_TOKEN")]
  user_token: Option<String>,

  /// Base URL of the public tracking page.
  #[arg(long, env = "SAFEYOU_TRACKING_URL")]
  tracking_url: Option<String>,

  /// Calling code prefixed to contact phone numbers.
  #[arg(long, env = "SAFEYOU_COUNTRY_CODE")]
  country_code: Option<String>,

  /// Seconds between contact-list resyncs while tracking.
  #[arg(long, value_name = "SECS", env = "SAFEYOU_POLL_INTERVAL")]
  poll_interval: Option<u64>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List contacts and their sharing state.
  Contacts,

  /// Add a trusted contact.
  Add {
    #[arg(long)]
    name:      String,
    #[arg(long)]
    relation:  String,
    #[arg(long)]
    phone:     String,
    #[arg(long)]
    email:     Option<String>,
    #[arg(long)]
    emergency: bool,
  },

  /// Change fields of an existing contact.
  Edit {
    id:        Uuid,
    #[arg(long)]
    name:      Option<String>,
    #[arg(long)]
    relation:  Option<String>,
    #[arg(long)]
    phone:     Option<String>,
    #[arg(long)]
    email:     Option<String>,
    #[arg(long)]
    emergency: Option<bool>,
  },

  /// Delete a contact.
  Remove { id: Uuid },

  /// Start sharing your location with a contact.
  Share {
    id:        Uuid,
    /// 1h, 2h, 4h, 8h, 12h, 1d, 2d, 3d, 1w, 2w, 1m or indefinite.
    #[arg(short, long, default_value = "1h", value_parser = parse_duration)]
    duration:  ShareDuration,
    /// Return after the handoff instead of tracking until Ctrl-C.
    #[arg(long)]
    no_follow: bool,
  },

  /// Stop sharing your location with a contact.
  Unshare { id: Uuid },

  /// Track and upload your location while any share is active.
  Track,
}

fn parse_duration(s: &str) -> Result<ShareDuration, String> {
  ShareDuration::from_code(s).map_err(|e| e.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let settings = config::Settings::resolve(&args)?;
  let app = App::new(&settings)?;

  match args.command {
    Command::Contacts => app.list().await,
    Command::Add {
      name,
      relation,
      phone,
      email,
      emergency,
    } => {
      app
        .add(name, relation, phone, email, emergency)
        .await
    }
    Command::Edit {
      id,
      name,
      relation,
      phone,
      email,
      emergency,
    } => {
      app
        .edit(id, ContactEdit {
          name,
          relation,
          phone,
          email,
          emergency,
        })
        .await
    }
    Command::Remove { id } => app.remove(id).await,
    Command::Share {
      id,
      duration,
      no_follow,
    } => {
      app.share(id, duration).await?;
      if no_follow {
        Ok(())
      } else {
        app.track(settings.poll_interval).await
      }
    }
    Command::Unshare { id } => app.unshare(id).await,
    Command::Track => app.track(settings.poll_interval).await,
  }
}
