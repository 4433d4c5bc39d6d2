//! Access token entity - single-use credentials bound to a plan tier

use std::{fmt, str::FromStr};

use chrono::TimeDelta;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(
  Copy,
  Clone,
  Debug,
  PartialEq,
  Eq,
  Hash,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PlanType {
  #[sea_orm(string_value = "trial")]
  Trial,
  #[sea_orm(string_value = "monthly")]
  Monthly,
  #[sea_orm(string_value = "quarterly")]
  Quarterly,
  #[sea_orm(string_value = "yearly")]
  Yearly,
  #[sea_orm(string_value = "permanent")]
  Permanent,
}

impl PlanType {
  /// Validity window counted from issuance, `None` for tokens that never
  /// expire.
  pub fn duration(self) -> Option<TimeDelta> {
    match self {
      Self::Trial => Some(TimeDelta::hours(3)),
      Self::Monthly => Some(TimeDelta::days(30)),
      Self::Quarterly => Some(TimeDelta::days(90)),
      Self::Yearly => Some(TimeDelta::days(365)),
      Self::Permanent => None,
    }
  }
}

impl fmt::Display for PlanType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Trial => "Trial",
      Self::Monthly => "Monthly",
      Self::Quarterly => "Quarterly",
      Self::Yearly => "Yearly",
      Self::Permanent => "Permanent",
    };
    f.write_str(name)
  }
}

impl FromStr for PlanType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    // launcher admin panels still send the old portuguese labels
    match s.trim().to_lowercase().as_str() {
      "trial" | "teste gratuito" => Ok(Self::Trial),
      "monthly" | "mensal" => Ok(Self::Monthly),
      "quarterly" | "trimestral" => Ok(Self::Quarterly),
      "yearly" | "anual" => Ok(Self::Yearly),
      "permanent" | "permanente" => Ok(Self::Permanent),
      _ => Err(Error::InvalidPlanType(s.to_string())),
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub plan_type: PlanType,
  pub created_at: DateTime,
  pub activated_at: Option<DateTime>,
  pub expires_at: Option<DateTime>,
  pub owner_user_id: Option<i64>,
  pub active: bool,
}

/// Status derived from `active` and `expires_at` at query time; never
/// persisted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  UnusedValid,
  UnusedExpired,
  UsedValid,
  UsedExpired,
  UsedPermanent,
}

impl Model {
  pub fn is_expired(&self, now: DateTime) -> bool {
    self.expires_at.is_some_and(|exp| exp < now)
  }

  pub fn status(&self, now: DateTime) -> Status {
    match (self.active, self.expires_at) {
      (true, None) => Status::UsedPermanent,
      (true, Some(_)) if self.is_expired(now) => Status::UsedExpired,
      (true, Some(_)) => Status::UsedValid,
      (false, _) if self.is_expired(now) => Status::UnusedExpired,
      (false, _) => Status::UnusedValid,
    }
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
