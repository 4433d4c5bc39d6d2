use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
  model::{CatalogGame, UserPlan},
  prelude::*,
};

/// Launcher-side client for the catalog and plan endpoints.
#[derive(Clone)]
pub struct Catalog {
  client: Client,
  base: String,
}

impl Catalog {
  pub fn new(base: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .map_err(|err| Error::Internal(format!("HTTP client: {err}")))?;

    Ok(Self { client, base: base.into() })
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = format!("{}{path}", self.base);
    let res = self
      .client
      .get(&url)
      .send()
      .await
      .and_then(|res| res.error_for_status())
      .map_err(|err| Error::Catalog(err.to_string()))?;

    res.json().await.map_err(|err| Error::Catalog(err.to_string()))
  }

  pub async fn games(&self) -> Result<Vec<CatalogGame>> {
    self.get("/games").await
  }

  pub async fn game(&self, id: i32) -> Result<CatalogGame> {
    self
      .games()
      .await?
      .into_iter()
      .find(|g| g.id == id)
      .ok_or(Error::GameNotFound)
  }

  pub async fn plan(&self, user_id: i64) -> Result<UserPlan> {
    self.get(&format!("/users/{user_id}/plan")).await
  }

  /// Plan first, so a user without downloads never touches the catalog.
  pub async fn authorize(
    &self,
    game_id: i32,
    user_id: i64,
  ) -> Result<(UserPlan, CatalogGame)> {
    let plan = self.plan(user_id).await?;
    if !plan.allows_download() {
      return Err(Error::AccessDenied);
    }

    let game = self.game(game_id).await?;
    Ok((plan, game))
  }
}
