//! Music document collection
//!
//! [`MusicStore`] is the seam between handlers and the document store.
//! [`PgMusicStore`] keeps each document in a JSONB column; every mutation is
//! a single statement. [`InMemoryMusicStore`] backs tests and local runs.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{LikeChange, MetadataChanges, Music};

/// Lookups and mutations on the music collection
#[async_trait]
pub trait MusicStore: Send + Sync {
    async fn count(&self) -> Result<u64, sqlx::Error>;

    async fn list(&self) -> Result<Vec<Music>, sqlx::Error>;

    async fn find(&self, id: Uuid) -> Result<Option<Music>, sqlx::Error>;

    async fn insert(&self, music: &Music) -> Result<(), sqlx::Error>;

    /// Returns the updated document, `None` if it does not exist
    async fn change_likes(&self, id: Uuid, change: LikeChange) -> Result<Option<Music>, sqlx::Error>;

    /// Only matches documents uploaded by `artist_id`
    async fn update_metadata(
        &self,
        id: Uuid,
        artist_id: &str,
        changes: &MetadataChanges,
    ) -> Result<Option<Music>, sqlx::Error>;

    /// Only matches documents uploaded by `artist_id`
    async fn set_poster(
        &self,
        id: Uuid,
        artist_id: &str,
        poster_url: &str,
    ) -> Result<Option<Music>, sqlx::Error>;
}

// =========================================================================
// PgMusicStore
// =========================================================================

/// Music documents in the `musics` JSONB table
#[derive(Debug, Clone)]
pub struct PgMusicStore {
    pool: PgPool,
}

impl PgMusicStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MusicStore for PgMusicStore {
    async fn count(&self) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM musics")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn list(&self) -> Result<Vec<Music>, sqlx::Error> {
        let documents: Vec<Json<Music>> =
            sqlx::query_scalar("SELECT document FROM musics ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(documents.into_iter().map(|Json(music)| music).collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Music>, sqlx::Error> {
        let document: Option<Json<Music>> =
            sqlx::query_scalar("SELECT document FROM musics WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(document.map(|Json(music)| music))
    }

    async fn insert(&self, music: &Music) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO musics (id, document) VALUES ($1, $2)")
            .bind(music.id)
            .bind(Json(music))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn change_likes(&self, id: Uuid, change: LikeChange) -> Result<Option<Music>, sqlx::Error> {
        // Clamped in the same statement so concurrent unlikes never go below zero
        let document: Option<Json<Music>> = sqlx::query_scalar(
            r#"
            UPDATE musics
            SET document = jsonb_set(
                document,
                '{likes}',
                to_jsonb(GREATEST(COALESCE((document->>'likes')::bigint, 0) + $2, 0))
            )
            WHERE id = $1
            RETURNING document
            "#,
        )
        .bind(id)
        .bind(change.delta())
        .fetch_optional(&self.pool)
        .await?;
        Ok(document.map(|Json(music)| music))
    }

    async fn update_metadata(
        &self,
        id: Uuid,
        artist_id: &str,
        changes: &MetadataChanges,
    ) -> Result<Option<Music>, sqlx::Error> {
        if changes.is_empty() {
            return Ok(self.find(id).await?.filter(|music| music.artist_id == artist_id));
        }

        let document: Option<Json<Music>> = sqlx::query_scalar(
            r#"
            UPDATE musics
            SET document = document || jsonb_strip_nulls(
                jsonb_build_object('title', $3::text, 'shortDesc', $4::text)
            )
            WHERE id = $1 AND document->>'artistId' = $2
            RETURNING document
            "#,
        )
        .bind(id)
        .bind(artist_id)
        .bind(changes.title.as_deref())
        .bind(changes.short_desc.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(document.map(|Json(music)| music))
    }

    async fn set_poster(
        &self,
        id: Uuid,
        artist_id: &str,
        poster_url: &str,
    ) -> Result<Option<Music>, sqlx::Error> {
        let document: Option<Json<Music>> = sqlx::query_scalar(
            r#"
            UPDATE musics
            SET document = document || jsonb_build_object('posterUrl', $3::text)
            WHERE id = $1 AND document->>'artistId' = $2
            RETURNING document
            "#,
        )
        .bind(id)
        .bind(artist_id)
        .bind(poster_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document.map(|Json(music)| music))
    }
}

// =========================================================================
// InMemoryMusicStore
// =========================================================================

/// Insertion-ordered documents behind a lock
#[derive(Debug, Default)]
pub struct InMemoryMusicStore {
    musics: RwLock<Vec<Music>>,
}

impl InMemoryMusicStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: Uuid, artist_id: Option<&str>, f: F) -> Option<Music>
    where
        F: FnOnce(&mut Music),
    {
        let mut musics = self.musics.write().await;
        let music = musics
            .iter_mut()
            .find(|m| m.id == id && artist_id.map_or(true, |a| m.artist_id == a))?;
        f(music);
        Some(music.clone())
    }
}

#[async_trait]
impl MusicStore for InMemoryMusicStore {
    async fn count(&self) -> Result<u64, sqlx::Error> {
        Ok(self.musics.read().await.len() as u64)
    }

    async fn list(&self) -> Result<Vec<Music>, sqlx::Error> {
        Ok(self.musics.read().await.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Music>, sqlx::Error> {
        Ok(self.musics.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn insert(&self, music: &Music) -> Result<(), sqlx::Error> {
        self.musics.write().await.push(music.clone());
        Ok(())
    }

    async fn change_likes(&self, id: Uuid, change: LikeChange) -> Result<Option<Music>, sqlx::Error> {
        Ok(self
            .modify(id, None, |music| music.likes = change.apply(music.likes))
            .await)
    }

    async fn update_metadata(
        &self,
        id: Uuid,
        artist_id: &str,
        changes: &MetadataChanges,
    ) -> Result<Option<Music>, sqlx::Error> {
        Ok(self
            .modify(id, Some(artist_id), |music| music.apply_metadata(changes))
            .await)
    }

    async fn set_poster(
        &self,
        id: Uuid,
        artist_id: &str,
        poster_url: &str,
    ) -> Result<Option<Music>, sqlx::Error> {
        Ok(self
            .modify(id, Some(artist_id), |music| music.poster_url = poster_url.to_string())
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(artist: &str) -> Music {
        Music::new(artist, "Title".into(), "Desc".into(), "/media/a.mp3".into())
    }

    #[tokio::test]
    async fn test_in_memory_insert_and_find() {
        let store = InMemoryMusicStore::new();
        let music = sample("artist");
        store.insert(&music).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.find(music.id).await.unwrap(), Some(music));
        assert!(store.find(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_unlike_clamps() {
        let store = InMemoryMusicStore::new();
        let music = sample("artist");
        store.insert(&music).await.unwrap();

        let updated = store.change_likes(music.id, LikeChange::Unlike).await.unwrap().unwrap();
        assert_eq!(updated.likes, 0);

        let updated = store.change_likes(music.id, LikeChange::Like).await.unwrap().unwrap();
        assert_eq!(updated.likes, 1);
    }

    #[tokio::test]
    async fn test_in_memory_owner_scoped_updates() {
        let store = InMemoryMusicStore::new();
        let music = sample("owner");
        store.insert(&music).await.unwrap();

        assert!(store
            .set_poster(music.id, "someone-else", "/media/p.png")
            .await
            .unwrap()
            .is_none());

        let updated = store
            .set_poster(music.id, "owner", "/media/p.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.poster_url, "/media/p.png");
    }
}
