use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  response::Redirect,
};

use crate::{
  entity::PlanType,
  model::{
    ActivateReq, CatalogGame, IssueReq, IssueRes, NewGame, TokenView, UserPlan,
  },
  prelude::*,
  state::AppState,
  sv::token::Activation,
};

pub async fn health() -> &'static str {
  "OK"
}

pub async fn list_tokens(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<TokenView>>> {
  let now = Utc::now().naive_utc();
  let tokens = app.sv().token.all().await?;
  Ok(Json(tokens.into_iter().map(|t| TokenView::new(t, now)).collect()))
}

pub async fn issue_tokens(
  State(app): State<Arc<AppState>>,
  Json(req): Json<IssueReq>,
) -> Result<Json<IssueRes>> {
  let plan: PlanType = req.plan_type.parse()?;
  let quantity = req.quantity.unwrap_or(app.config.token_batch);

  let now = Utc::now().naive_utc();
  let tokens: Vec<_> = app
    .sv()
    .token
    .issue(plan, quantity)
    .await?
    .into_iter()
    .map(|t| TokenView::new(t, now))
    .collect();

  Ok(Json(IssueRes { count: tokens.len(), tokens }))
}

pub async fn activate_token(
  State(app): State<Arc<AppState>>,
  Json(req): Json<ActivateReq>,
) -> Result<Json<Activation>> {
  let activation = app.sv().token.activate(&req.token_id, req.user_id).await?;
  Ok(Json(activation))
}

pub async fn user_plan(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> Result<Json<UserPlan>> {
  let status = app.sv().token.plan_status(user_id).await?;
  Ok(Json(UserPlan::new(user_id, status)))
}

pub async fn list_games(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<CatalogGame>>> {
  let games = app.sv().game.all().await?;
  Ok(Json(games.into_iter().map(CatalogGame::from).collect()))
}

pub async fn create_game(
  State(app): State<Arc<AppState>>,
  Json(req): Json<NewGame>,
) -> Result<Json<CatalogGame>> {
  let game = app
    .sv()
    .game
    .create(req.title, &req.download_url, req.cover_url, req.genres)
    .await?;
  Ok(Json(game.into()))
}

pub async fn download(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Redirect> {
  let url = app.sv().game.download_url(id).await?;
  Ok(Redirect::temporary(&url))
}
