//! Token lifecycle: batch issuance, single-use activation, derived status.
//!
//! Activation ordering is fixed as not-found -> already-used -> expired ->
//! success. The final write is a conditional `UPDATE ... WHERE active = 0`
//! so two racing activations can never both succeed.

use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{PlanType, token},
  prelude::*,
};

/// Upper bound for a single issuance batch.
pub const MAX_BATCH: u32 = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
  pub plan_type: PlanType,
  pub expires_at: Option<DateTime>,
}

/// Plan status of a user as seen by the acquisition pre-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
  Permanent,
  Active,
  Expired,
  None,
}

pub struct Token<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Token<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn issue(
    &self,
    plan: PlanType,
    quantity: u32,
  ) -> Result<Vec<token::Model>> {
    if quantity == 0 || quantity > MAX_BATCH {
      return Err(Error::InvalidQuantity(quantity));
    }

    let now = Utc::now().naive_utc();
    let expires_at = plan.duration().map(|d| now + d);

    let tokens: Vec<_> = (0..quantity)
      .map(|_| token::Model {
        id: Uuid::new_v4().to_string(),
        plan_type: plan,
        created_at: now,
        activated_at: None,
        expires_at,
        owner_user_id: None,
        active: false,
      })
      .collect();

    let txn = self.db.begin().await?;
    token::Entity::insert_many(tokens.iter().map(|t| token::ActiveModel {
      id: Set(t.id.clone()),
      plan_type: Set(t.plan_type),
      created_at: Set(t.created_at),
      activated_at: Set(None),
      expires_at: Set(t.expires_at),
      owner_user_id: Set(None),
      active: Set(false),
    }))
    .exec(&txn)
    .await?;
    txn.commit().await?;

    info!("Issued {} {plan} token(s)", tokens.len());
    Ok(tokens)
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<token::Model>> {
    Ok(token::Entity::find_by_id(id).one(self.db).await?)
  }

  /// All tokens, newest first.
  pub async fn all(&self) -> Result<Vec<token::Model>> {
    let tokens = token::Entity::find()
      .order_by_desc(token::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(tokens)
  }

  pub async fn by_owner(&self, user_id: i64) -> Result<Vec<token::Model>> {
    let tokens = token::Entity::find()
      .filter(token::Column::OwnerUserId.eq(user_id))
      .order_by_desc(token::Column::ActivatedAt)
      .all(self.db)
      .await?;
    Ok(tokens)
  }

  pub async fn activate(&self, id: &str, user_id: i64) -> Result<Activation> {
    let token = self.by_id(id).await?.ok_or(Error::TokenNotFound)?;

    if token.active {
      return Err(Error::TokenAlreadyUsed);
    }

    let now = Utc::now().naive_utc();
    if token.is_expired(now) {
      return Err(Error::TokenExpired);
    }

    let result = token::Entity::update_many()
      .col_expr(token::Column::Active, Expr::value(true))
      .col_expr(token::Column::ActivatedAt, Expr::value(now))
      .col_expr(token::Column::OwnerUserId, Expr::value(user_id))
      .filter(token::Column::Id.eq(id))
      .filter(token::Column::Active.eq(false))
      .exec(self.db)
      .await?;

    // someone else flipped it between our read and the update
    if result.rows_affected == 0 {
      return Err(Error::TokenAlreadyUsed);
    }

    info!("Token {id} activated by user {user_id}");
    Ok(Activation { plan_type: token.plan_type, expires_at: token.expires_at })
  }

  pub async fn plan_status(&self, user_id: i64) -> Result<PlanStatus> {
    use token::Status;

    let now = Utc::now().naive_utc();
    let statuses: Vec<_> = self
      .by_owner(user_id)
      .await?
      .iter()
      .map(|t| t.status(now))
      .collect();

    let status = if statuses.contains(&Status::UsedPermanent) {
      PlanStatus::Permanent
    } else if statuses.contains(&Status::UsedValid) {
      PlanStatus::Active
    } else if statuses.contains(&Status::UsedExpired) {
      PlanStatus::Expired
    } else {
      PlanStatus::None
    };

    Ok(status)
  }
}
