use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Tokens::Table)
          .if_not_exists()
          .col(ColumnDef::new(Tokens::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Tokens::PlanType).string().not_null())
          .col(ColumnDef::new(Tokens::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Tokens::ActivatedAt).date_time().null())
          .col(ColumnDef::new(Tokens::ExpiresAt).date_time().null())
          .col(ColumnDef::new(Tokens::OwnerUserId).big_integer().null())
          .col(
            ColumnDef::new(Tokens::Active)
              .boolean()
              .not_null()
              .default(false),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_tokens_owner")
          .table(Tokens::Table)
          .col(Tokens::OwnerUserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Tokens::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Tokens {
  Table,
  Id,
  PlanType,
  CreatedAt,
  ActivatedAt,
  ExpiresAt,
  OwnerUserId,
  Active,
}
