use std::{env, path::PathBuf};

use migration::Migrator;

use crate::{prelude::*, sv};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  /// Base URL of the catalog/token API used by the launcher side.
  pub api_base: String,
  /// Per-user application data directory.
  pub data_dir: PathBuf,
  pub download_timeout: Duration,
  /// Quantity issued when a request does not specify one.
  pub token_batch: u32,
}

impl Default for Config {
  fn default() -> Self {
    let data_dir = env::var_os("LOCALAPPDATA")
      .or_else(|| env::var_os("HOME"))
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from("."));

    Self {
      database_url: String::from("sqlite:primex.db?mode=rwc"),
      port: 8000,
      api_base: String::from("http://127.0.0.1:8000"),
      data_dir,
      download_timeout: Duration::from_secs(120),
      token_batch: 10,
    }
  }
}

fn parse_var<T>(name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
  let raw = env::var(name).ok()?;
  let value = parse(&raw);
  if value.is_none() {
    warn!("Ignoring invalid {name}={raw:?}, using default");
  }
  value
}

impl Config {
  pub fn from_env() -> Self {
    let default = Self::default();

    Self {
      database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),
      port: parse_var("PORT", |s| s.parse::<u16>().ok()).unwrap_or(default.port),
      api_base: env::var("PRIMEX_API")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or(default.api_base),
      data_dir: env::var_os("PRIMEX_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or(default.data_dir),
      download_timeout: parse_var("DOWNLOAD_TIMEOUT", |s| {
        humantime::parse_duration(s).ok()
      })
      .unwrap_or(default.download_timeout),
      token_batch: parse_var("TOKEN_BATCH", |s| {
        let n = s.parse::<u32>().ok()?;
        (1..=sv::token::MAX_BATCH).contains(&n).then_some(n)
      })
      .unwrap_or(default.token_batch),
    }
  }

  pub fn games_dir(&self) -> PathBuf {
    self.data_dir.join("PrimeX").join("games")
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.games_dir().join("instalados.json")
  }
}

pub struct Services<'a> {
  pub token: sv::Token<'a>,
  pub game: sv::Game<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    Ok(Self { db, config })
  }

  pub fn sv(&self) -> Services<'_> {
    Services { token: sv::Token::new(&self.db), game: sv::Game::new(&self.db) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_layout_under_data_dir() {
    let config =
      Config { data_dir: PathBuf::from("/data"), ..Default::default() };

    assert_eq!(config.games_dir(), PathBuf::from("/data/PrimeX/games"));
    assert_eq!(
      config.manifest_path(),
      PathBuf::from("/data/PrimeX/games/instalados.json")
    );
    assert_eq!(config.download_timeout, Duration::from_secs(120));
  }
}
