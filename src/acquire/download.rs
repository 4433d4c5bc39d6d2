use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::prelude::*;

/// Turns byte counts into percentage events, firing only when the integer
/// percentage changes.
#[derive(Debug)]
pub struct Progress {
  total: Option<u64>,
  received: u64,
  last: Option<u8>,
}

impl Progress {
  /// A zero or missing length means the size is unknown.
  pub fn new(total: Option<u64>) -> Self {
    Self { total: total.filter(|&t| t > 0), received: 0, last: None }
  }

  pub fn advance(&mut self, n: u64) -> Option<u8> {
    self.received += n;
    let total = self.total?;

    let pct = (self.received.saturating_mul(100) / total).min(100) as u8;
    if self.last == Some(pct) {
      return None;
    }
    self.last = Some(pct);
    Some(pct)
  }

  /// Terminal 100% unless it was already reported.
  pub fn finish(&mut self) -> Option<u8> {
    if self.last == Some(100) {
      return None;
    }
    self.last = Some(100);
    Some(100)
  }

  pub fn received(&self) -> u64 {
    self.received
  }
}

#[derive(Clone)]
pub struct Downloader {
  client: Client,
}

impl Downloader {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .user_agent(concat!("primex/", env!("CARGO_PKG_VERSION")))
      .connect_timeout(Duration::from_secs(30))
      .read_timeout(timeout)
      .build()
      .map_err(|err| Error::Internal(format!("HTTP client: {err}")))?;

    Ok(Self { client })
  }

  /// Streams `url` into `dest`, calling `on_progress` with each new
  /// percentage. Returns the number of bytes written.
  pub async fn fetch(
    &self,
    url: &str,
    dest: &Path,
    mut on_progress: impl FnMut(u8),
    cancel: &CancellationToken,
  ) -> Result<u64> {
    let failed = |err: reqwest::Error| Error::DownloadFailed(err.to_string());

    let res = self
      .client
      .get(url)
      .send()
      .await
      .and_then(|res| res.error_for_status())
      .map_err(failed)?;

    let mut progress = Progress::new(res.content_length());
    debug!("Downloading {url} ({:?} bytes)", res.content_length());

    let mut file = File::create(dest).await?;
    let mut stream = res.bytes_stream();

    while let Some(chunk) = stream.next().await {
      if cancel.is_cancelled() {
        return Err(Error::Cancelled);
      }

      let chunk = chunk.map_err(failed)?;
      file.write_all(&chunk).await?;

      if let Some(pct) = progress.advance(chunk.len() as u64) {
        on_progress(pct);
      }
    }
    file.flush().await?;

    if let Some(pct) = progress.finish() {
      on_progress(pct);
    }

    Ok(progress.received())
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::net::SocketAddr;

  use axum::{
    Router,
    body::{Body, Bytes},
    http::StatusCode,
    routing::get,
  };

  use super::*;

  /// Serves `/sized` with a content length, `/chunked` without one,
  /// `/slow` as chunks 20ms apart and `/missing` as a 404.
  pub async fn serve(payload: Vec<u8>) -> SocketAddr {
    let sized = payload.clone();
    let slow = payload.clone();
    let router = Router::new()
      .route("/sized", get(move || async move { sized }))
      .route(
        "/slow",
        get(move || async move {
          let chunks: Vec<Bytes> =
            slow.chunks(64 * 1024).map(Bytes::copy_from_slice).collect();
          let stream = futures::stream::iter(chunks).then(|c| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, std::io::Error>(c)
          });
          Body::from_stream(stream)
        }),
      )
      .route(
        "/chunked",
        get(move || async move {
          let chunks: Vec<Result<Bytes, std::io::Error>> = payload
            .chunks(64 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
          Body::from_stream(futures::stream::iter(chunks))
        }),
      )
      .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });
    addr
  }

  #[test]
  fn test_progress_only_on_change() {
    let mut p = Progress::new(Some(1000));
    assert_eq!(p.advance(5), Some(0));
    assert_eq!(p.advance(4), None);
    assert_eq!(p.advance(1), Some(1));
    assert_eq!(p.advance(990), Some(100));
    assert_eq!(p.finish(), None);
  }

  #[test]
  fn test_progress_unknown_length() {
    for total in [None, Some(0)] {
      let mut p = Progress::new(total);
      assert_eq!(p.advance(10_000), None);
      assert_eq!(p.finish(), Some(100));
      assert_eq!(p.received(), 10_000);
    }
  }

  #[tokio::test]
  async fn test_fetch_reports_progress() {
    let payload = vec![7u8; 512 * 1024];
    let addr = serve(payload.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("game.zip");

    let dl = Downloader::new(Duration::from_secs(10)).unwrap();
    let mut events = Vec::new();
    let n = dl
      .fetch(
        &format!("http://{addr}/sized"),
        &dest,
        |p| events.push(p),
        &CancellationToken::new(),
      )
      .await
      .unwrap();

    assert_eq!(n, payload.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
    assert_eq!(events.last(), Some(&100));
    assert!(events.windows(2).all(|w| w[0] < w[1]));
  }

  #[tokio::test]
  async fn test_fetch_chunked_only_terminal_event() {
    let addr = serve(vec![1u8; 300 * 1024]).await;
    let dir = tempfile::tempdir().unwrap();

    let dl = Downloader::new(Duration::from_secs(10)).unwrap();
    let mut events = Vec::new();
    dl.fetch(
      &format!("http://{addr}/chunked"),
      &dir.path().join("game.zip"),
      |p| events.push(p),
      &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(events, vec![100]);
  }

  #[tokio::test]
  async fn test_fetch_http_error() {
    let addr = serve(Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();

    let dl = Downloader::new(Duration::from_secs(10)).unwrap();
    let result = dl
      .fetch(
        &format!("http://{addr}/missing"),
        &dir.path().join("game.zip"),
        |_| {},
        &CancellationToken::new(),
      )
      .await;

    assert!(matches!(result, Err(Error::DownloadFailed(_))));
  }
}
