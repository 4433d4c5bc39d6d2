//! Catalog entry for a downloadable game

use json::Value;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "games")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub title: String,
  pub download_url: String,
  pub cover_url: String,
  /// json array of genre names
  pub genres: Value,
  pub created_at: DateTime,
}

impl Model {
  pub fn genre_list(&self) -> Vec<String> {
    json::from_value(self.genres.clone()).unwrap_or_default()
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
