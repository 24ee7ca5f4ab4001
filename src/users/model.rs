//! User accounts

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A user row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub gender: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub followers: u64,
    pub followings: u64,
    pub profile_url: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New account with zeroed counters and no profile image
    pub fn new(
        id: Uuid,
        full_name: String,
        gender: String,
        email: String,
        hashed_password: String,
        is_private: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            full_name,
            gender,
            email,
            hashed_password,
            followers: 0,
            followings: 0,
            profile_url: String::new(),
            is_private,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Database shape of a user; counters are signed in Postgres
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub gender: String,
    pub email: String,
    pub hashed_password: String,
    pub followers: i64,
    pub followings: i64,
    pub profile_url: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            gender: row.gender,
            email: row.email,
            hashed_password: row.hashed_password,
            followers: row.followers.max(0) as u64,
            followings: row.followings.max(0) as u64,
            profile_url: row.profile_url,
            is_private: row.is_private,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Follow or unfollow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    Follow,
    Unfollow,
}

impl FollowAction {
    pub fn delta(self) -> i64 {
        match self {
            FollowAction::Follow => 1,
            FollowAction::Unfollow => -1,
        }
    }

    /// New counter value; unfollow at zero stays at zero
    pub fn apply(self, count: u64) -> u64 {
        match self {
            FollowAction::Follow => count.saturating_add(1),
            FollowAction::Unfollow => count.saturating_sub(1),
        }
    }
}

/// Result of a two-row follow update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Applied,
    /// Nothing was written; this user does not exist
    UserMissing(Uuid),
}

/// Profile fields a user may change on their own account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub is_private: Option<bool>,
}

impl AccountChanges {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(is_private) = self.is_private {
            user.is_private = is_private;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            Uuid::new_v4(),
            "Ada Lovelace".into(),
            "female".into(),
            "ada@example.com".into(),
            "$argon2id$hash".into(),
            false,
        )
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user()).unwrap();

        assert!(json.get("hashedPassword").is_none());
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["followers"], 0);
        assert_eq!(json["isPrivate"], false);
        assert_eq!(json["profileUrl"], "");
    }

    #[test]
    fn test_follow_action_clamps() {
        assert_eq!(FollowAction::Follow.apply(0), 1);
        assert_eq!(FollowAction::Unfollow.apply(1), 0);
        assert_eq!(FollowAction::Unfollow.apply(0), 0);
    }

    #[test]
    fn test_account_changes_partial() {
        let mut user = user();
        AccountChanges {
            is_private: Some(true),
            ..Default::default()
        }
        .apply_to(&mut user);

        assert!(user.is_private);
        assert_eq!(user.full_name, "Ada Lovelace");
    }

    #[test]
    fn test_row_conversion_clamps_negative_counters() {
        let now = Utc::now();
        let user: User = UserRow {
            id: Uuid::new_v4(),
            full_name: "A".into(),
            gender: "x".into(),
            email: "a@b.c".into(),
            hashed_password: "h".into(),
            followers: -3,
            followings: 7,
            profile_url: String::new(),
            is_private: false,
            created_at: now,
            updated_at: now,
        }
        .into();

        assert_eq!(user.followers, 0);
        assert_eq!(user.followings, 7);
    }
}
