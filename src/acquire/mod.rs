//! Game acquisition: download, extract, locate the main executable,
//! scramble it and record the install.
//!
//! Each install runs on its own tokio task and reports back through an
//! event channel. A failing stage aborts the rest; whatever it already
//! wrote to disk stays there.

pub mod catalog;
pub mod cipher;
pub mod download;
pub mod extract;
pub mod launch;
pub mod manifest;
pub mod scan;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use self::{
  catalog::Catalog,
  cipher::MachineKey,
  download::Downloader,
  manifest::{Entry, Manifest},
};
use crate::{
  model::{CatalogGame, UserPlan},
  prelude::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
  Idle,
  Downloading,
  Extracting,
  Scanning,
  Obfuscating,
  Done,
  Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  Stage(Stage),
  Progress(u8),
  Finished(Entry),
  Failed(String),
}

#[derive(Debug, Clone)]
pub struct InstallRequest {
  pub title: String,
  pub url: String,
  pub cover_url: String,
  pub genres: Vec<String>,
}

impl From<CatalogGame> for InstallRequest {
  fn from(game: CatalogGame) -> Self {
    Self {
      title: game.title,
      url: game.download_url,
      cover_url: game.cover_url,
      genres: game.genres,
    }
  }
}

pub struct Installer {
  games_dir: PathBuf,
  manifest: Arc<Manifest>,
  downloader: Downloader,
  key: MachineKey,
  running: DashMap<String, ()>,
}

/// Releases the per-title slot when the worker ends, however it ends.
struct Slot {
  installer: Arc<Installer>,
  name: String,
}

impl Drop for Slot {
  fn drop(&mut self) {
    self.installer.running.remove(&self.name);
  }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
  F: FnOnce() -> Result<T> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|err| Error::Internal(format!("worker: {err}")))?
}

fn relative(path: &Path, root: &Path) -> String {
  path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned()
}

impl Installer {
  pub fn new(
    games_dir: impl Into<PathBuf>,
    manifest: Arc<Manifest>,
    downloader: Downloader,
    key: MachineKey,
  ) -> Self {
    Self {
      games_dir: games_dir.into(),
      manifest,
      downloader,
      key,
      running: DashMap::new(),
    }
  }

  /// Starts an install on a background task. Fails immediately, before any
  /// network access, if the plan does not allow downloads, the title has
  /// no usable name or the same title is already being installed.
  pub fn install(
    self: &Arc<Self>,
    req: InstallRequest,
    plan: &UserPlan,
    cancel: CancellationToken,
  ) -> Result<mpsc::UnboundedReceiver<Event>> {
    if !plan.allows_download() {
      return Err(Error::AccessDenied);
    }
    let name = utils::sanitize_name(&req.title)?;

    if self.running.insert(name.clone(), ()).is_some() {
      return Err(Error::InstallInProgress(name));
    }
    let slot = Slot { installer: self.clone(), name: name.clone() };

    let (tx, rx) = mpsc::unbounded_channel();
    let installer = self.clone();

    tokio::spawn(async move {
      let _ = tx.send(Event::Stage(Stage::Idle));

      let result = installer.run(&name, &req, &tx, &cancel).await;
      drop(slot);

      match result {
        Ok(entry) => {
          info!("Installed {} into {}", req.title, entry.install_dir.display());
          let _ = tx.send(Event::Stage(Stage::Done));
          let _ = tx.send(Event::Finished(entry));
        }
        Err(err) => {
          error!("Install of {} failed: {err}", req.title);
          let _ = tx.send(Event::Stage(Stage::Error));
          let _ = tx.send(Event::Failed(err.to_string()));
        }
      }
    });

    Ok(rx)
  }

  async fn run(
    &self,
    name: &str,
    req: &InstallRequest,
    tx: &mpsc::UnboundedSender<Event>,
    cancel: &CancellationToken,
  ) -> Result<Entry> {
    let stage = |stage: Stage| {
      debug!("{name}: {stage:?}");
      let _ = tx.send(Event::Stage(stage));
    };
    let checkpoint = || {
      if cancel.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
    };

    let install_dir = self.games_dir.join(name);
    let archive = self.games_dir.join(format!("{name}.zip"));
    tokio::fs::create_dir_all(&self.games_dir).await?;
    checkpoint()?;

    stage(Stage::Downloading);
    let fetched = self
      .downloader
      .fetch(
        &req.url,
        &archive,
        |pct| {
          let _ = tx.send(Event::Progress(pct));
        },
        cancel,
      )
      .await;
    if let Err(err) = fetched {
      utils::cleanup(&archive).await;
      return Err(err);
    }
    if let Err(err) = checkpoint() {
      utils::cleanup(&archive).await;
      return Err(err);
    }

    stage(Stage::Extracting);
    let extracted = {
      let (archive, install_dir) = (archive.clone(), install_dir.clone());
      blocking(move || extract::extract(&archive, &install_dir)).await
    };
    utils::cleanup(&archive).await;
    if let Err(err) = extracted {
      utils::cleanup(&extract::staging_dir(&install_dir)).await;
      return Err(err);
    }
    checkpoint()?;

    stage(Stage::Scanning);
    let exe = {
      let install_dir = install_dir.clone();
      blocking(move || scan::locate_main_executable(&install_dir)).await?
    };
    checkpoint()?;

    let (exe, exe_enc) = match exe {
      Some(rel) => {
        stage(Stage::Obfuscating);
        let path = install_dir.join(&rel);
        let key = self.key.clone();
        let enc = blocking(move || cipher::obfuscate(&path, &key)).await?;
        (rel.to_string_lossy().into_owned(), relative(&enc, &install_dir))
      }
      None => (String::new(), String::new()),
    };

    let entry = Entry {
      install_dir,
      exe,
      exe_enc,
      capa_url: req.cover_url.clone(),
      genero: req.genres.clone(),
    };
    self.manifest.record(&req.title, entry.clone()).await?;

    Ok(entry)
  }
}
