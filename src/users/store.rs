//! User persistence
//!
//! [`UserStore`] is the seam the command and query objects persist through.
//! [`PgUserStore`] uses the `users` table; [`InMemoryUserStore`] backs tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{AccountChanges, FollowAction, FollowOutcome, User, UserRow};

const USER_COLUMNS: &str = "id, full_name, gender, email, hashed_password, followers, followings, \
                            profile_url, is_private, created_at, updated_at";

/// Lookups and mutations on user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), sqlx::Error>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;

    /// Emails are not unique; the oldest account wins
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    async fn update_account(
        &self,
        id: Uuid,
        changes: &AccountChanges,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn set_profile_url(&self, id: Uuid, profile_url: &str) -> Result<Option<User>, sqlx::Error>;

    /// Adjust `followee.followers` and `follower.followings` together.
    ///
    /// Either both counters change or neither does.
    async fn follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        action: FollowAction,
    ) -> Result<FollowOutcome, sqlx::Error>;
}

// =========================================================================
// PgUserStore
// =========================================================================

/// Users in the `users` table
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, full_name, gender, email, hashed_password,
                followers, followings, profile_url, is_private, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.gender)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.followers as i64)
        .bind(user.followings as i64)
        .bind(&user.profile_url)
        .bind(user.is_private)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1 ORDER BY created_at, id LIMIT 1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: &AccountChanges,
    ) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                is_private = COALESCE($4, is_private),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.full_name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.is_private)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn set_profile_url(&self, id: Uuid, profile_url: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET profile_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(profile_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        action: FollowAction,
    ) -> Result<FollowOutcome, sqlx::Error> {
        let delta = action.delta();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE users SET followers = GREATEST(followers + $2, 0), updated_at = NOW() WHERE id = $1",
        )
        .bind(followee)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(FollowOutcome::UserMissing(followee));
        }

        let updated = sqlx::query(
            "UPDATE users SET followings = GREATEST(followings + $2, 0), updated_at = NOW() WHERE id = $1",
        )
        .bind(follower)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(FollowOutcome::UserMissing(follower));
        }

        tx.commit().await?;
        Ok(FollowOutcome::Applied)
    }
}

// =========================================================================
// InMemoryUserStore
// =========================================================================

/// Users keyed by id behind a lock
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), sqlx::Error> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.email == email)
            .min_by_key(|user| (user.created_at, user.id))
            .cloned())
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: &AccountChanges,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            changes.apply_to(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_profile_url(&self, id: Uuid, profile_url: &str) -> Result<Option<User>, sqlx::Error> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.profile_url = profile_url.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        action: FollowAction,
    ) -> Result<FollowOutcome, sqlx::Error> {
        // One write guard for both rows
        let mut users = self.users.write().await;

        for id in [followee, follower] {
            if !users.contains_key(&id) {
                return Ok(FollowOutcome::UserMissing(id));
            }
        }

        let now = Utc::now();
        if let Some(user) = users.get_mut(&followee) {
            user.followers = action.apply(user.followers);
            user.updated_at = now;
        }
        if let Some(user) = users.get_mut(&follower) {
            user.followings = action.apply(user.followings);
            user.updated_at = now;
        }

        Ok(FollowOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(
            Uuid::new_v4(),
            "Name".into(),
            "other".into(),
            email.into(),
            "hash".into(),
            false,
        )
    }

    #[tokio::test]
    async fn test_follow_updates_both_rows() {
        let store = InMemoryUserStore::new();
        let alice = user("alice@example.com");
        let bob = user("bob@example.com");
        store.insert(&alice).await.unwrap();
        store.insert(&bob).await.unwrap();

        let outcome = store.follow(alice.id, bob.id, FollowAction::Follow).await.unwrap();
        assert_eq!(outcome, FollowOutcome::Applied);

        let alice = store.find_by_id(alice.id).await.unwrap().unwrap();
        let bob = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(alice.followings, 1);
        assert_eq!(bob.followers, 1);
    }

    #[tokio::test]
    async fn test_follow_missing_target_writes_nothing() {
        let store = InMemoryUserStore::new();
        let alice = user("alice@example.com");
        store.insert(&alice).await.unwrap();

        let missing = Uuid::new_v4();
        let outcome = store.follow(alice.id, missing, FollowAction::Follow).await.unwrap();
        assert_eq!(outcome, FollowOutcome::UserMissing(missing));

        let alice = store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.followings, 0);
    }

    #[tokio::test]
    async fn test_find_by_email_allows_duplicates() {
        let store = InMemoryUserStore::new();
        let first = user("same@example.com");
        let mut second = user("same@example.com");
        second.created_at = first.created_at + chrono::Duration::seconds(1);
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        let found = store.find_by_email("same@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }
}
