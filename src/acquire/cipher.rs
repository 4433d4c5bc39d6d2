//! Machine-bound XOR scrambling of installed executables.
//!
//! This only stops a binary from being double-clicked outside the
//! launcher. The key is derived from public environment data and anyone on
//! the same machine can recompute it.

use std::{
  env, fmt,
  fs::{self, File},
  io::{BufReader, BufWriter, Read, Write},
  path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};

use crate::prelude::*;

/// Extension appended to scrambled files.
pub const EXTENSION: &str = "primexenc";

const SALT: &str = "PrimeX::launcher";

const CHUNK: usize = 64 * 1024;

#[derive(Clone, PartialEq, Eq)]
pub struct MachineKey([u8; 32]);

impl fmt::Debug for MachineKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "MachineKey({}..)", hex::encode(&self.0[..4]))
  }
}

fn first_var(names: &[&str]) -> Option<String> {
  names.iter().find_map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
}

impl MachineKey {
  pub fn derive(host: &str, user: &str) -> Self {
    let digest = Sha256::digest(format!("{host}{user}{SALT}").as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    Self(key)
  }

  /// Key for the current host and user.
  pub fn current() -> Self {
    let host = first_var(&["COMPUTERNAME", "HOSTNAME"])
      .or_else(|| {
        fs::read_to_string("/etc/hostname").ok().map(|s| s.trim().to_string())
      })
      .unwrap_or_else(|| "localhost".to_string());
    let user = first_var(&["USERNAME", "USER"]).unwrap_or_default();

    Self::derive(&host, &user)
  }

  /// XORs `buf` in place; `offset` is the position of `buf[0]` in the whole
  /// stream so the key keeps cycling across chunks.
  pub fn apply(&self, buf: &mut [u8], offset: u64) {
    let len = self.0.len();
    let start = (offset % len as u64) as usize;
    for (i, byte) in buf.iter_mut().enumerate() {
      *byte ^= self.0[(start + i) % len];
    }
  }

  fn transform(&self, src: &Path, dst: &Path) -> Result<u64> {
    let mut reader = BufReader::new(File::open(src)?);
    let mut writer = BufWriter::new(File::create(dst)?);
    let mut buf = vec![0u8; CHUNK];
    let mut offset = 0u64;

    loop {
      let n = reader.read(&mut buf)?;
      if n == 0 {
        break;
      }
      self.apply(&mut buf[..n], offset);
      writer.write_all(&buf[..n])?;
      offset += n as u64;
    }
    writer.flush()?;

    Ok(offset)
  }
}

pub fn encrypted_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(".");
  name.push(EXTENSION);
  PathBuf::from(name)
}

/// Original location of a scrambled file.
pub fn plain_path(path: &Path) -> PathBuf {
  match path.extension() {
    Some(ext) if ext == EXTENSION => path.with_extension(""),
    _ => path.to_path_buf(),
  }
}

/// Writes `<path>.primexenc` and removes the plaintext.
pub fn obfuscate(path: &Path, key: &MachineKey) -> Result<PathBuf> {
  let enc = encrypted_path(path);
  let n = key.transform(path, &enc)?;
  fs::remove_file(path)?;

  debug!("Obfuscated {} ({n} bytes)", path.display());
  Ok(enc)
}

/// Restores a runnable copy of `enc` at `out`; the scrambled file stays.
pub fn deobfuscate(enc: &Path, out: &Path, key: &MachineKey) -> Result<()> {
  key.transform(enc, out)?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(out, fs::Permissions::from_mode(0o755))?;
  }

  Ok(())
}
