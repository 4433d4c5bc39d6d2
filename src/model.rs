//! JSON bodies shared by the HTTP API and the launcher-side client.

use serde::{Deserialize, Serialize};

use crate::{
  entity::{PlanType, game, token},
  prelude::*,
  sv::token::PlanStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGame {
  pub id: i32,
  pub title: String,
  pub download_url: String,
  #[serde(default)]
  pub cover_url: String,
  #[serde(default)]
  pub genres: Vec<String>,
}

impl From<game::Model> for CatalogGame {
  fn from(game: game::Model) -> Self {
    let genres = game.genre_list();
    Self {
      id: game.id,
      title: game.title,
      download_url: game.download_url,
      cover_url: game.cover_url,
      genres,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
  pub title: String,
  pub download_url: String,
  pub cover_url: Option<String>,
  #[serde(default)]
  pub genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReq {
  pub plan_type: String,
  pub quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct IssueRes {
  pub tokens: Vec<TokenView>,
  pub count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateReq {
  pub token_id: String,
  pub user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
  pub id: String,
  pub plan_type: PlanType,
  pub created_at: DateTime,
  pub activated_at: Option<DateTime>,
  pub expires_at: Option<DateTime>,
  pub owner_user_id: Option<i64>,
  pub active: bool,
  pub status: token::Status,
}

impl TokenView {
  pub fn new(token: token::Model, now: DateTime) -> Self {
    let status = token.status(now);
    Self {
      id: token.id,
      plan_type: token.plan_type,
      created_at: token.created_at,
      activated_at: token.activated_at,
      expires_at: token.expires_at,
      owner_user_id: token.owner_user_id,
      active: token.active,
      status,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlan {
  pub user_id: i64,
  pub plan_status: PlanStatus,
}

impl UserPlan {
  pub fn new(user_id: i64, plan_status: PlanStatus) -> Self {
    Self { user_id, plan_status }
  }

  pub fn allows_download(&self) -> bool {
    matches!(self.plan_status, PlanStatus::Active | PlanStatus::Permanent)
  }
}
