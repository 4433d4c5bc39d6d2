use std::{
  fs::{self, File},
  io::BufReader,
  path::{Path, PathBuf},
};

use zip::{ZipArchive, result::ZipError};

use crate::prelude::*;

fn zip_error(err: ZipError) -> Error {
  match err {
    ZipError::Io(err) => Error::Io(err),
    ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
      Error::UnsupportedArchive
    }
    other => Error::Internal(format!("zip: {other}")),
  }
}

/// Sibling directory the archive is unpacked into before being moved in
/// place.
pub fn staging_dir(install_dir: &Path) -> PathBuf {
  let name = install_dir
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  install_dir.with_file_name(format!(".{name}.partial"))
}

/// Unpacks a ZIP archive into `install_dir`. Nothing appears at
/// `install_dir` unless every entry was written; an existing install is
/// replaced.
pub fn extract(archive: &Path, install_dir: &Path) -> Result<usize> {
  let file = File::open(archive)?;
  let mut zip = ZipArchive::new(BufReader::new(file)).map_err(zip_error)?;
  let entries = zip.len();

  let staging = staging_dir(install_dir);
  if staging.exists() {
    fs::remove_dir_all(&staging)?;
  }
  fs::create_dir_all(&staging)?;
  zip.extract(&staging).map_err(zip_error)?;

  if install_dir.exists() {
    fs::remove_dir_all(install_dir)?;
  }
  fs::rename(&staging, install_dir)?;

  Ok(entries)
}
