use std::{path::PathBuf, process::ExitStatus};

use tokio::process::Command;

use super::{
  cipher::{self, MachineKey},
  manifest::{Entry, Manifest},
};
use crate::prelude::*;

/// Executable ready to run. Temporary copies are removed after the game
/// exits.
#[derive(Debug)]
pub struct Runnable {
  pub path: PathBuf,
  pub temporary: bool,
}

/// Restores the scrambled executable of `entry`, or falls back to the
/// plaintext one for installs that predate obfuscation.
pub fn prepare(title: &str, entry: &Entry, key: &MachineKey) -> Result<Runnable> {
  if !entry.exe_enc.is_empty() {
    let enc = entry.install_dir.join(&entry.exe_enc);
    let path = cipher::plain_path(&enc);
    // restoring onto the scrambled file itself would truncate it
    if path == enc {
      return Err(Error::NoExecutable(title.to_string()));
    }
    cipher::deobfuscate(&enc, &path, key)?;
    return Ok(Runnable { path, temporary: true });
  }

  if !entry.exe.is_empty() {
    let path = entry.install_dir.join(&entry.exe);
    if path.is_file() {
      return Ok(Runnable { path, temporary: false });
    }
  }

  Err(Error::NoExecutable(title.to_string()))
}

pub async fn launch(
  manifest: &Manifest,
  key: &MachineKey,
  title: &str,
) -> Result<ExitStatus> {
  let entry = manifest
    .get(title)
    .await?
    .ok_or_else(|| Error::NotInstalled(title.to_string()))?;

  let runnable = {
    let title = title.to_string();
    let key = key.clone();
    tokio::task::spawn_blocking(move || prepare(&title, &entry, &key))
      .await
      .map_err(|err| Error::Internal(err.to_string()))??
  };

  info!("Launching {title} from {}", runnable.path.display());
  let mut cmd = Command::new(&runnable.path);
  if let Some(dir) = runnable.path.parent() {
    cmd.current_dir(dir);
  }

  let status = cmd.status().await;

  if runnable.temporary {
    utils::cleanup(&runnable.path).await;
  }

  Ok(status?)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn test_prepare_restores_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("bin/game.exe");
    fs::create_dir_all(exe.parent().unwrap()).unwrap();
    fs::write(&exe, b"MZ real game").unwrap();

    let key = MachineKey::derive("host", "user");
    cipher::obfuscate(&exe, &key).unwrap();

    let entry = Entry {
      install_dir: dir.path().to_path_buf(),
      exe: "bin/game.exe".into(),
      exe_enc: "bin/game.exe.primexenc".into(),
      ..Default::default()
    };
    let runnable = prepare("Game", &entry, &key).unwrap();

    assert!(runnable.temporary);
    assert_eq!(runnable.path, exe);
    assert_eq!(fs::read(&exe).unwrap(), b"MZ real game");
  }

  #[test]
  fn test_prepare_legacy_and_missing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("old.exe"), b"MZ").unwrap();
    let key = MachineKey::derive("host", "user");

    let legacy = Entry {
      install_dir: dir.path().to_path_buf(),
      exe: "old.exe".into(),
      ..Default::default()
    };
    let runnable = prepare("Old", &legacy, &key).unwrap();
    assert!(!runnable.temporary);

    let empty = Entry { exe: String::new(), ..legacy };
    assert!(matches!(
      prepare("Emu", &empty, &key),
      Err(Error::NoExecutable(title)) if title == "Emu"
    ));
  }

  #[test]
  fn test_prepare_rejects_unscrambled_name() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("game.bin");
    fs::write(&bin, vec![7u8; 1000]).unwrap();
    let key = MachineKey::derive("host", "user");

    let entry = Entry {
      install_dir: dir.path().to_path_buf(),
      exe_enc: "game.bin".into(),
      ..Default::default()
    };

    assert!(matches!(
      prepare("Bin", &entry, &key),
      Err(Error::NoExecutable(title)) if title == "Bin"
    ));
    assert_eq!(fs::metadata(&bin).unwrap().len(), 1000);
  }

  #[tokio::test]
  async fn test_launch_unknown_title() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::new(dir.path().join("instalados.json"));
    let key = MachineKey::derive("host", "user");

    assert!(matches!(
      launch(&manifest, &key, "Nope").await,
      Err(Error::NotInstalled(_))
    ));
  }
}
