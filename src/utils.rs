use std::path::Path;

use crate::prelude::*;

/// Characters Windows refuses in file names.
const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

pub fn format_duration(duration: TimeDelta) -> String {
  format!(
    "{}d {}h {}m",
    duration.num_days(),
    duration.num_hours() % 24,
    duration.num_minutes() % 60
  )
}

/// Turns a game title into a directory name, failing with
/// [`Error::InvalidName`] if nothing usable is left.
pub fn sanitize_name(title: &str) -> Result<String> {
  let name: String = title.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
  let name = name.trim();

  if name.is_empty() {
    return Err(Error::InvalidName);
  }
  Ok(name.to_string())
}

/// Rewrites a Dropbox share link into a direct download link.
pub fn direct_link(link: &str) -> String {
  if link.contains("dropbox.com") {
    link
      .replace("?dl=0", "?dl=1")
      .replace("www.dropbox.com", "dl.dropboxusercontent.com")
  } else {
    link.to_string()
  }
}

/// Best-effort removal of a file or directory. Failures are logged and
/// never propagated.
pub async fn cleanup(path: &Path) {
  let result = match tokio::fs::metadata(path).await {
    Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
    Ok(_) => tokio::fs::remove_file(path).await,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
    Err(err) => Err(err),
  };

  if let Err(err) = result {
    warn!("Cleanup of {} failed: {err}", path.display());
  } else {
    debug!("Removed {}", path.display());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sanitize_name() {
    assert_eq!(sanitize_name("Half-Life: Source").unwrap(), "Half-Life Source");
    assert_eq!(sanitize_name("  a/b\\c  ").unwrap(), "abc");
    assert!(matches!(sanitize_name(r#"<>:"/\|?*"#), Err(Error::InvalidName)));
    assert!(matches!(sanitize_name("   "), Err(Error::InvalidName)));
  }

  #[test]
  fn test_direct_link() {
    assert_eq!(
      direct_link("https://www.dropbox.com/s/abc/game.zip?dl=0"),
      "https://dl.dropboxusercontent.com/s/abc/game.zip?dl=1"
    );
    assert_eq!(direct_link("https://cdn.test/g.zip"), "https://cdn.test/g.zip");
  }

  #[test]
  fn test_format_duration() {
    let d = TimeDelta::days(2) + TimeDelta::hours(5) + TimeDelta::minutes(7);
    assert_eq!(format_duration(d), "2d 5h 7m");
  }

  #[tokio::test]
  async fn test_cleanup_ignores_missing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("leftover.zip");
    tokio::fs::write(&file, b"x").await.unwrap();

    cleanup(&file).await;
    assert!(!file.exists());

    // second call hits NotFound and stays silent
    cleanup(&file).await;
    cleanup(dir.path()).await;
    assert!(!dir.path().exists());
  }
}
