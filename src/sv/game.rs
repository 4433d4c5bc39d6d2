use crate::{entity::game, prelude::*};

pub struct Game<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Game<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    title: String,
    download_url: &str,
    cover_url: Option<String>,
    genres: Vec<String>,
  ) -> Result<game::Model> {
    let now = Utc::now().naive_utc();

    let game = game::ActiveModel {
      id: NotSet,
      title: Set(title),
      download_url: Set(utils::direct_link(download_url)),
      cover_url: Set(cover_url.unwrap_or_default()),
      genres: Set(json::to_value(genres)?),
      created_at: Set(now),
    };

    Ok(game.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<game::Model>> {
    Ok(game::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<game::Model>> {
    let games = game::Entity::find()
      .order_by_asc(game::Column::Title)
      .all(self.db)
      .await?;
    Ok(games)
  }

  pub async fn download_url(&self, id: i32) -> Result<String> {
    let game = self.by_id(id).await?.ok_or(Error::GameNotFound)?;
    Ok(game.download_url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::token::tests::setup_test_db;

  #[tokio::test]
  async fn test_create_rewrites_dropbox_link() {
    let db = setup_test_db().await;
    let sv = Game::new(&db);

    let game = sv
      .create(
        "Celeste".into(),
        "https://www.dropbox.com/s/x/celeste.zip?dl=0",
        None,
        vec!["Platformer".into()],
      )
      .await
      .unwrap();

    assert_eq!(
      game.download_url,
      "https://dl.dropboxusercontent.com/s/x/celeste.zip?dl=1"
    );
    assert_eq!(game.genre_list(), vec!["Platformer".to_string()]);
    assert_eq!(sv.download_url(game.id).await.unwrap(), game.download_url);
    assert!(matches!(sv.download_url(999).await, Err(Error::GameNotFound)));
  }

  #[tokio::test]
  async fn test_all_sorted_by_title() {
    let db = setup_test_db().await;
    let sv = Game::new(&db);

    for title in ["Hades", "Braid"] {
      sv.create(title.into(), "https://cdn.test/g.zip", None, vec![])
        .await
        .unwrap();
    }

    let titles: Vec<_> =
      sv.all().await.unwrap().into_iter().map(|g| g.title).collect();
    assert_eq!(titles, ["Braid", "Hades"]);
  }
}
