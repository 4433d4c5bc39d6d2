//! Heuristic search for the executable that actually starts the game.
//!
//! Walking the tree and judging candidates are kept apart: [`score`] is a
//! pure function and [`locate_with`] accepts any other scorer.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::prelude::*;

/// Anything smaller is a stub, wrapper or tool rather than a game binary.
pub const MIN_SIZE: u64 = 200 * 1024;

/// Known non-game executables, compared case-insensitively.
const EXCLUDED: &[&str] = &[
  "unins000.exe",
  "unins001.exe",
  "uninstall.exe",
  "uninst.exe",
  "vc_redist.x64.exe",
  "vc_redist.x86.exe",
  "vcredist_x64.exe",
  "vcredist_x86.exe",
  "dxsetup.exe",
  "dxwebsetup.exe",
  "dotnetfx.exe",
  "physxsetup.exe",
  "oalinst.exe",
  "ue4prereqsetup_x64.exe",
  "ueprereqsetup_x64.exe",
  "crashreportclient.exe",
  "unitycrashhandler32.exe",
  "unitycrashhandler64.exe",
  "steam.exe",
  "steamerrorreporter.exe",
  "epicgameslauncher.exe",
  "galaxyclient.exe",
  "origin.exe",
  "uplay.exe",
];

/// Installer-related fragments; any file name containing one is rejected.
const KEYWORDS: &[&str] =
  &["setup", "install", "unins", "redist", "prereq", "dotnet", "directx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
  /// Path relative to the install directory.
  pub path: PathBuf,
  pub size: u64,
  /// Number of directories between the install root and the file.
  pub depth: usize,
}

impl Candidate {
  fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().to_lowercase())
      .unwrap_or_default()
  }
}

/// Root-level files beat nested ones, then bigger beats smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
  root: bool,
  size: u64,
}

pub fn score(candidate: &Candidate) -> Option<Score> {
  let name = candidate.file_name();

  if EXCLUDED.contains(&name.as_str()) {
    return None;
  }
  if KEYWORDS.iter().any(|kw| name.contains(kw)) {
    return None;
  }
  if candidate.size < MIN_SIZE {
    return None;
  }

  Some(Score { root: candidate.depth == 0, size: candidate.size })
}

fn is_executable(path: &Path) -> bool {
  path
    .extension()
    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("exe"))
}

/// Every `.exe` under `root`, sorted by relative path.
pub fn candidates(root: &Path) -> Result<Vec<Candidate>> {
  let mut out = Vec::new();

  for entry in WalkDir::new(root).min_depth(1) {
    let entry = entry.map_err(std::io::Error::from)?;
    if !entry.file_type().is_file() || !is_executable(entry.path()) {
      continue;
    }

    let size = entry.metadata().map_err(std::io::Error::from)?.len();
    let path = entry.path();
    let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    out.push(Candidate { path: rel, size, depth: entry.depth() - 1 });
  }

  out.sort_by(|a, b| a.path.cmp(&b.path));
  Ok(out)
}

pub fn locate_with<S: Ord>(
  root: &Path,
  scorer: impl Fn(&Candidate) -> Option<S>,
) -> Result<Option<PathBuf>> {
  let best = candidates(root)?
    .into_iter()
    .filter_map(|c| scorer(&c).map(|s| (s, c)))
    .max_by(|(a, _), (b, _)| a.cmp(b))
    .map(|(_, c)| c.path);

  Ok(best)
}

/// Relative path of the most plausible game executable, or `None` when the
/// archive ships without one.
pub fn locate_main_executable(root: &Path) -> Result<Option<PathBuf>> {
  let found = locate_with(root, score)?;
  match &found {
    Some(path) => debug!("Main executable: {}", path.display()),
    None => info!("No main executable found in {}", root.display()),
  }
  Ok(found)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  const MB: u64 = 1024 * 1024;

  fn candidate(path: &str, size: u64) -> Candidate {
    let path = PathBuf::from(path);
    let depth = path.components().count() - 1;
    Candidate { path, size, depth }
  }

  fn touch(root: &Path, rel: &str, size: u64) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = fs::File::create(path).unwrap();
    file.set_len(size).unwrap();
  }

  #[test]
  fn test_score_filters() {
    assert_eq!(score(&candidate("unins000.exe", 5 * MB)), None);
    assert_eq!(score(&candidate("Redist/VC_redist.x64.exe", 20 * MB)), None);
    assert_eq!(score(&candidate("GameSetup.exe", 50 * MB)), None);
    assert_eq!(score(&candidate("tool.exe", 100 * 1024)), None);
    assert!(score(&candidate("Game.exe", MIN_SIZE)).is_some());
  }

  #[test]
  fn test_root_beats_nested() {
    let root = score(&candidate("game.exe", MB)).unwrap();
    let nested = score(&candidate("bin/x64/game.exe", 10 * MB)).unwrap();
    assert!(root > nested);
  }

  #[test]
  fn test_setup_excluded_regardless_of_size() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "setup.exe", 50 * MB);
    touch(dir.path(), "game.exe", 80 * MB);

    let found = locate_main_executable(dir.path()).unwrap();
    assert_eq!(found, Some(PathBuf::from("game.exe")));
  }

  #[test]
  fn test_equal_size_prefers_root() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "bin/engine.exe", 3 * MB);
    touch(dir.path(), "start.exe", 3 * MB);

    let found = locate_main_executable(dir.path()).unwrap();
    assert_eq!(found, Some(PathBuf::from("start.exe")));
  }

  #[test]
  fn test_largest_within_tier() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Game/launcher_small.exe", MB);
    touch(dir.path(), "Game/Binaries/game.exe", 40 * MB);
    touch(dir.path(), "Game/readme.txt", 90 * MB);

    let found = locate_main_executable(dir.path()).unwrap();
    assert_eq!(found, Some(PathBuf::from("Game/Binaries/game.exe")));
  }

  #[test]
  fn test_nothing_above_threshold() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "tiny.exe", 10 * 1024);
    touch(dir.path(), "roms/emu.EXE", MIN_SIZE - 1);
    touch(dir.path(), "data.pak", 100 * MB);

    assert_eq!(locate_main_executable(dir.path()).unwrap(), None);
  }

  #[test]
  fn test_custom_scorer() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a.exe", 1);
    touch(dir.path(), "b.exe", 2);

    // smallest wins
    let found = locate_with(dir.path(), |c| Some(std::cmp::Reverse(c.size)));
    assert_eq!(found.unwrap(), Some(PathBuf::from("a.exe")));
  }

  #[test]
  fn test_candidates_walk_nested_dirs() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "root.exe", 1);
    touch(dir.path(), "a/b/c/deep.EXE", 2);
    touch(dir.path(), "a/notes.txt", 3);
    fs::create_dir_all(dir.path().join("empty.exe")).unwrap();

    let found: Vec<_> = candidates(dir.path())
      .unwrap()
      .into_iter()
      .map(|c| (c.path, c.size, c.depth))
      .collect();

    assert_eq!(
      found,
      vec![
        (PathBuf::from("a/b/c/deep.EXE"), 2, 3),
        (PathBuf::from("root.exe"), 1, 0),
      ]
    );
  }
}
