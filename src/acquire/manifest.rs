//! Record of installed games, one JSON object keyed by title.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};

use crate::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  #[serde(alias = "installDir")]
  pub install_dir: PathBuf,
  /// Plaintext executable relative to `install_dir`. Only runnable for
  /// installs made before obfuscation existed.
  #[serde(default)]
  pub exe: String,
  /// Scrambled executable relative to `install_dir`, empty if the archive
  /// had no main executable.
  #[serde(default)]
  pub exe_enc: String,
  #[serde(default)]
  pub capa_url: String,
  #[serde(default)]
  pub genero: Vec<String>,
}

pub type Entries = BTreeMap<String, Entry>;

pub struct Manifest {
  path: PathBuf,
  write: Mutex<()>,
}

impl Manifest {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write: Mutex::new(()) }
  }

  /// Raw contents. A missing or unreadable file counts as empty.
  async fn load(&self) -> Result<Entries> {
    let bytes = match fs::read(&self.path).await {
      Ok(bytes) => bytes,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Ok(Entries::new());
      }
      Err(err) => return Err(err.into()),
    };

    match json::from_slice(&bytes) {
      Ok(entries) => Ok(entries),
      Err(err) => {
        warn!("Ignoring corrupt manifest {}: {err}", self.path.display());
        Ok(Entries::new())
      }
    }
  }

  /// Entries whose install directory still exists.
  pub async fn installed(&self) -> Result<Entries> {
    let mut entries = self.load().await?;
    entries.retain(|_, entry| entry.install_dir.is_dir());
    Ok(entries)
  }

  pub async fn get(&self, title: &str) -> Result<Option<Entry>> {
    Ok(self.installed().await?.remove(title))
  }

  /// Inserts or replaces `title`. Writers are serialized and the file is
  /// swapped in with a rename so readers never see half a document.
  pub async fn record(&self, title: &str, entry: Entry) -> Result<()> {
    let _guard = self.write.lock().await;

    let mut entries = self.load().await?;
    entries.insert(title.to_string(), entry);

    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).await?;
    }
    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, json::to_vec_pretty(&entries)?).await?;
    fs::rename(&tmp, &self.path).await?;

    Ok(())
  }
}
