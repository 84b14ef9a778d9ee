//! Catalog queries: the data mapping between the SQLite relational
//! model and the vk-core catalog models.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use vk_core::error::Result;
use vk_core::models::{Author, Category, Episode, Genre, ShortStory, Story};
use vk_core::traits::CatalogRepo;

use crate::{db_err, SqliteStore};

fn story_from(row: &SqliteRow) -> Story {
    Story {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        release_date: row.get("release_date"),
        category_id: row.get("category_id"),
        is_featured: row.get("is_featured"),
    }
}

fn episode_from(row: &SqliteRow) -> Episode {
    Episode {
        id: row.get("id"),
        episode_number: row.get("episode_number"),
        title_dv: row.get("title_dv"),
        title_en: row.get("title_en"),
        content_dv: row.get("content_dv"),
        content_en: row.get("content_en"),
        published_date: row.get("published_date"),
        author_id: row.get("author_id"),
        genre_id: row.get("genre_id"),
    }
}

fn short_story_from(row: &SqliteRow) -> ShortStory {
    ShortStory {
        id: row.get("id"),
        title_dv: row.get("title_dv"),
        title_en: row.get("title_en"),
        author_id: row.get("author_id"),
        genre_id: row.get("genre_id"),
        category_id: row.get("category_id"),
        content_dv: row.get("content_dv"),
        content_en: row.get("content_en"),
        published_date: row.get("published_date"),
        is_featured: row.get("is_featured"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn category_from(row: &SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        color: row.get("color"),
        icon: row.get("icon"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl CatalogRepo for SqliteStore {
    async fn story(&self, id: i64) -> Result<Option<Story>> {
        let row = sqlx::query("SELECT * FROM stories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;
        Ok(row.map(|row| story_from(&row)))
    }

    async fn episode(&self, id: i64) -> Result<Option<Episode>> {
        let row = sqlx::query("SELECT * FROM episodes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;
        Ok(row.map(|row| episode_from(&row)))
    }

    async fn short_story(&self, id: i64) -> Result<Option<ShortStory>> {
        let row = sqlx::query("SELECT * FROM short_stories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;
        Ok(row.map(|row| short_story_from(&row)))
    }

    async fn author(&self, id: i64) -> Result<Option<Author>> {
        let row = sqlx::query("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;
        Ok(row.map(|row| Author {
            id: row.get("id"),
            name: row.get("name"),
            bio: row.get("bio"),
            website: row.get("website"),
        }))
    }

    async fn genre(&self, id: i64) -> Result<Option<Genre>> {
        let row = sqlx::query("SELECT * FROM genres WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;
        Ok(row.map(|row| Genre {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            icon: row.get("icon"),
        }))
    }

    async fn list_stories(&self, category: Option<i64>) -> Result<Vec<Story>> {
        let rows = match category {
            Some(category_id) => {
                sqlx::query("SELECT * FROM stories WHERE category_id = ? ORDER BY release_date DESC")
                    .bind(category_id)
                    .fetch_all(self.pool())
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM stories ORDER BY release_date DESC")
                    .fetch_all(self.pool())
                    .await
            }
        }
        .map_err(db_err)?;
        Ok(rows.iter().map(story_from).collect())
    }

    async fn list_episodes(&self) -> Result<Vec<Episode>> {
        let rows = sqlx::query("SELECT * FROM episodes ORDER BY episode_number")
            .fetch_all(self.pool())
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(episode_from).collect())
    }

    async fn episodes_for_story(&self, story_id: i64) -> Result<Vec<Episode>> {
        let rows = sqlx::query(
            "SELECT e.* FROM episodes e \
             JOIN story_episodes se ON se.episode_id = e.id \
             WHERE se.story_id = ? ORDER BY e.episode_number",
        )
        .bind(story_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        Ok(rows.iter().map(episode_from).collect())
    }

    async fn story_for_episode(&self, episode_id: i64) -> Result<Option<Story>> {
        let row = sqlx::query(
            "SELECT s.* FROM stories s \
             JOIN story_episodes se ON se.story_id = s.id \
             WHERE se.episode_id = ? ORDER BY s.id LIMIT 1",
        )
        .bind(episode_id)
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;
        Ok(row.map(|row| story_from(&row)))
    }

    async fn list_short_stories(&self, category: Option<i64>) -> Result<Vec<ShortStory>> {
        let rows = match category {
            Some(category_id) => {
                sqlx::query(
                    "SELECT * FROM short_stories WHERE is_published = 1 AND category_id = ? \
                     ORDER BY published_date DESC, created_at DESC",
                )
                .bind(category_id)
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM short_stories WHERE is_published = 1 \
                     ORDER BY published_date DESC, created_at DESC",
                )
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(db_err)?;
        Ok(rows.iter().map(short_story_from).collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories WHERE is_active = 1 ORDER BY name")
            .fetch_all(self.pool())
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(category_from).collect())
    }

    async fn newest_stories(&self, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query("SELECT * FROM stories ORDER BY release_date DESC LIMIT ?")
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(story_from).collect())
    }

    async fn newest_episodes(&self, limit: i64) -> Result<Vec<Episode>> {
        let rows = sqlx::query("SELECT * FROM episodes ORDER BY published_date DESC LIMIT ?")
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(episode_from).collect())
    }

    async fn featured_short_stories(&self, limit: i64) -> Result<Vec<ShortStory>> {
        let rows = sqlx::query(
            "SELECT * FROM short_stories WHERE is_published = 1 AND is_featured = 1 \
             ORDER BY published_date DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        Ok(rows.iter().map(short_story_from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_author(store: &SqliteStore) -> i64 {
        sqlx::query("INSERT INTO authors (name) VALUES ('Aminath Shiuna')")
            .execute(store.pool())
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn seed_story(store: &SqliteStore, title: &str, release_date: &str) -> i64 {
        sqlx::query("INSERT INTO stories (title, description, release_date) VALUES (?, '...', ?)")
            .bind(title)
            .bind(release_date)
            .execute(store.pool())
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn seed_episode(store: &SqliteStore, author_id: i64, number: i64, date: &str) -> i64 {
        sqlx::query(
            "INSERT INTO episodes \
             (episode_number, title_dv, title_en, content_dv, content_en, published_date, author_id) \
             VALUES (?, 'ބައި', 'Part', '', '', ?, ?)",
        )
        .bind(number)
        .bind(date)
        .bind(author_id)
        .execute(store.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn link_episode(store: &SqliteStore, story_id: i64, episode_id: i64) {
        sqlx::query("INSERT INTO story_episodes (story_id, episode_id) VALUES (?, ?)")
            .bind(story_id)
            .bind(episode_id)
            .execute(store.pool())
            .await
            .unwrap();
    }

    async fn seed_short_story(
        store: &SqliteStore,
        author_id: i64,
        date: &str,
        featured: bool,
        published: bool,
    ) -> i64 {
        sqlx::query(
            "INSERT INTO short_stories \
             (title_dv, title_en, author_id, content_dv, content_en, published_date, is_featured, is_published) \
             VALUES ('ކުރުވާހަކަ', 'A short one', ?, '', '', ?, ?, ?)",
        )
        .bind(author_id)
        .bind(date)
        .bind(featured)
        .bind(published)
        .execute(store.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn episodes_are_ordered_within_their_story() {
        let store = SqliteStore::memory().await.unwrap();
        let author = seed_author(&store).await;
        let story = seed_story(&store, "Dheriyaa", "2024-03-01").await;

        let ep3 = seed_episode(&store, author, 3, "2024-03-20").await;
        let ep1 = seed_episode(&store, author, 1, "2024-03-05").await;
        for id in [ep3, ep1] {
            link_episode(&store, story, id).await;
        }

        let episodes = store.episodes_for_story(story).await.unwrap();
        assert_eq!(
            episodes.iter().map(|e| e.episode_number).collect::<Vec<_>>(),
            vec![1, 3]
        );

        let owner = store.story_for_episode(ep1).await.unwrap().unwrap();
        assert_eq!(owner.id, story);
        assert!(store.story_for_episode(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn short_story_listing_hides_unpublished() {
        let store = SqliteStore::memory().await.unwrap();
        let author = seed_author(&store).await;
        let visible = seed_short_story(&store, author, "2024-05-01", false, true).await;
        let _hidden = seed_short_story(&store, author, "2024-05-02", true, false).await;

        let listed = store.list_short_stories(None).await.unwrap();
        assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![visible]);

        // Featured feed requires published as well.
        assert!(store.featured_short_stories(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn featured_short_stories_are_featured_and_published() {
        let store = SqliteStore::memory().await.unwrap();
        let author = seed_author(&store).await;
        let featured = seed_short_story(&store, author, "2024-05-03", true, true).await;
        let _plain = seed_short_story(&store, author, "2024-05-04", false, true).await;

        let feed = store.featured_short_stories(3).await.unwrap();
        assert_eq!(feed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![featured]);
    }

    #[tokio::test]
    async fn newest_stories_respects_order_and_limit() {
        let store = SqliteStore::memory().await.unwrap();
        let _old = seed_story(&store, "Old", "2023-01-01").await;
        let mid = seed_story(&store, "Mid", "2024-01-01").await;
        let new = seed_story(&store, "New", "2024-06-01").await;

        let feed = store.newest_stories(2).await.unwrap();
        assert_eq!(feed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![new, mid]);
    }

    #[tokio::test]
    async fn categories_are_active_only_and_sorted() {
        let store = SqliteStore::memory().await.unwrap();
        sqlx::query("INSERT INTO categories (name, is_active) VALUES ('Romance', 1), ('Archive', 0), ('Mystery', 1)")
            .execute(store.pool())
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Mystery", "Romance"]);
    }
}
