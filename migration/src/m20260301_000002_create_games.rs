use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Games::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Games::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Games::Title).string().not_null())
          .col(ColumnDef::new(Games::DownloadUrl).string().not_null())
          .col(ColumnDef::new(Games::CoverUrl).string().not_null().default(""))
          .col(ColumnDef::new(Games::Genres).json().not_null())
          .col(ColumnDef::new(Games::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Games::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Games {
  Table,
  Id,
  Title,
  DownloadUrl,
  CoverUrl,
  Genres,
  CreatedAt,
}
