//! PrimeX - game store backend and launcher-side installer
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for the token and catalog HTTP API
//! - Reqwest + zip for the background game installer
//! - Tokio for async runtime

mod acquire;
mod entity;
mod error;
mod model;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  acquire::{
    Catalog, Downloader, Event, InstallRequest, Installer, MachineKey,
    Manifest,
  },
  prelude::*,
  state::{AppState, Config},
};

#[derive(Parser)]
#[command(version, about = "PrimeX game store")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run the token and catalog API
  Serve,
  /// Download and install a game from the catalog
  Install {
    #[arg(long)]
    game: i32,
    #[arg(long)]
    user: i64,
  },
  /// Start an installed game
  Launch { title: String },
  /// List installed games
  Installed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "primex=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let cli = Cli::parse();
  let config = Config::from_env();

  match cli.command {
    Command::Serve => serve(config).await,
    Command::Install { game, user } => install(config, game, user).await,
    Command::Launch { title } => {
      let manifest = Manifest::new(config.manifest_path());
      let status =
        acquire::launch::launch(&manifest, &MachineKey::current(), &title)
          .await?;
      info!("{title} exited with {status}");
      Ok(())
    }
    Command::Installed => {
      let manifest = Manifest::new(config.manifest_path());
      for (title, entry) in manifest.installed().await? {
        println!("{title}\t{}", entry.install_dir.display());
      }
      Ok(())
    }
  }
}

async fn serve(config: Config) -> anyhow::Result<()> {
  info!("Starting PrimeX server v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(config).await?);

  plugins::App::new().register(plugins::server::Plugin).run(app).await;
  Ok(())
}

async fn install(config: Config, game: i32, user: i64) -> anyhow::Result<()> {
  let catalog = Catalog::new(&config.api_base)?;

  let (plan, game) = catalog.authorize(game, user).await?;
  info!("Installing {} for user {user} ({:?})", game.title, plan.plan_status);

  let installer = Arc::new(Installer::new(
    config.games_dir(),
    Arc::new(Manifest::new(config.manifest_path())),
    Downloader::new(config.download_timeout)?,
    MachineKey::current(),
  ));

  let cancel = CancellationToken::new();
  let mut events =
    installer.install(InstallRequest::from(game), &plan, cancel.clone())?;

  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("Cancelling install...");
      cancel.cancel();
    }
  });

  let started = Utc::now();
  while let Some(event) = events.recv().await {
    match event {
      Event::Stage(stage) => debug!("Stage: {stage:?}"),
      Event::Progress(pct) => info!("Downloaded {pct}%"),
      Event::Finished(entry) => {
        info!(
          "Installed into {} in {}",
          entry.install_dir.display(),
          utils::format_duration(Utc::now() - started)
        );
        return Ok(());
      }
      Event::Failed(reason) => anyhow::bail!(reason),
    }
  }

  anyhow::bail!("installer stopped without a result")
}
