pub mod server;

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::state::AppState;

/// Pause between a service going down and the next start.
const RESTART_DELAY: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
  delay: Duration,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new(), delay: RESTART_DELAY }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Runs every plugin under its own supervisor. Resolves once all
  /// supervisors have exited.
  pub async fn run(self, app: Arc<AppState>) {
    let handles: Vec<_> = self
      .plugins
      .into_iter()
      .map(|plugin| tokio::spawn(supervise(plugin, app.clone(), self.delay)))
      .collect();

    futures::future::join_all(handles).await;
  }
}

/// Keeps `plugin` running: a clean return, an error or a panic all lead to
/// a restart after `delay`. Only cancellation of the task ends the loop.
async fn supervise(
  plugin: Arc<dyn Plugin>,
  app: Arc<AppState>,
  delay: Duration,
) {
  let name = plugin.name();
  info!("primex: starting `{name}`");

  for attempt in 1u32.. {
    let task = {
      let (plugin, app) = (plugin.clone(), app.clone());
      tokio::spawn(async move { plugin.start(app).await })
    };

    match task.await {
      Ok(Ok(())) => warn!("primex: `{name}` returned on its own"),
      Ok(Err(err)) => error!("primex: `{name}` failed: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!("primex: `{name}` cancelled, not restarting");
        return;
      }
      Err(_) => error!("primex: `{name}` panicked"),
    }

    sleep(delay).await;
    info!("primex: restarting `{name}` (attempt {})", attempt + 1);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{state::Config, sv::token::tests::setup_test_db};

  struct Flaky {
    starts: Arc<AtomicUsize>,
  }

  #[async_trait::async_trait]
  impl Plugin for Flaky {
    fn name(&self) -> &'static str {
      "flaky"
    }

    async fn start(&self, _: Arc<AppState>) -> anyhow::Result<()> {
      match self.starts.fetch_add(1, Ordering::SeqCst) {
        0 => anyhow::bail!("boom"),
        1 => panic!("worse"),
        _ => Ok(()),
      }
    }
  }

  #[tokio::test]
  async fn test_supervisor_restarts_after_every_exit() {
    let db = setup_test_db().await;
    let app = Arc::new(AppState { db, config: Config::default() });
    let starts = Arc::new(AtomicUsize::new(0));

    let plugin = Arc::new(Flaky { starts: starts.clone() });
    let handle = tokio::spawn(supervise(plugin, app, Duration::from_millis(1)));

    // error, panic and clean return each get restarted
    tokio::time::timeout(Duration::from_secs(5), async {
      while starts.load(Ordering::SeqCst) < 4 {
        sleep(Duration::from_millis(5)).await;
      }
    })
    .await
    .unwrap();

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
  }
}
