use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::auth::error::StoreError;
use crate::auth::repo_types::{User, UserLookup, UserUpdate};

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the single user matching `lookup`, or `StoreError::NotFound`.
    async fn find_user_by(&self, lookup: UserLookup<'_>) -> Result<User, StoreError>;

    /// Insert a new user; the store assigns the id.
    async fn add_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError>;

    /// Apply a sparse update to one user.
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<(), StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by(&self, lookup: UserLookup<'_>) -> Result<User, StoreError> {
        // Column names come from a closed enum, never from input.
        let sql = format!(
            r#"
            SELECT id, email, hashed_password, session_id, reset_token, created_at
            FROM users
            WHERE {} = $1
            "#,
            lookup.column()
        );
        let value = match lookup {
            UserLookup::Email(v) | UserLookup::SessionId(v) | UserLookup::ResetToken(v) => v,
        };
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        user.ok_or(StoreError::NotFound)
    }

    async fn add_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, hashed_password)
            VALUES ($1, $2)
            RETURNING id, email, hashed_password, session_id, reset_token, created_at
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.db)
        .await?;
        debug!(user_id = %user.id, "user row inserted");
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }
        // One statement so every touched column changes together.
        let result = sqlx::query(
            r#"
            UPDATE users SET
                hashed_password = CASE WHEN $2 THEN $3 ELSE hashed_password END,
                session_id      = CASE WHEN $4 THEN $5 ELSE session_id END,
                reset_token     = CASE WHEN $6 THEN $7 ELSE reset_token END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.hashed_password.is_some())
        .bind(update.hashed_password)
        .bind(update.session_id.is_some())
        .bind(update.session_id.flatten())
        .bind(update.reset_token.is_some())
        .bind(update.reset_token.flatten())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// In-process store for tests and local runs without a database.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by(&self, lookup: UserLookup<'_>) -> Result<User, StoreError> {
        let users = self.users.read().await;
        users
            .values()
            .find(|u| lookup.matches(u))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn add_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            session_id: None,
            reset_token: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        update.apply(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_add_and_find() {
        let store = MemoryUserStore::new();
        let user = store.add_user("a@x.com", "hash").await.unwrap();
        assert!(user.session_id.is_none());
        assert!(user.reset_token.is_none());

        let found = store.find_user_by(UserLookup::Email("a@x.com")).await.unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "a@x.com");
        assert_eq!(found.hashed_password, "hash");
    }

    #[tokio::test]
    async fn memory_store_signals_not_found() {
        let store = MemoryUserStore::new();
        let err = store
            .find_user_by(UserLookup::Email("nobody@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let err = store
            .update_user(Uuid::new_v4(), UserUpdate::session(None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.add_user("a@x.com", "h1").await.unwrap();
        let err = store.add_user("a@x.com", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[tokio::test]
    async fn memory_store_empty_update_is_noop() {
        let store = MemoryUserStore::new();
        // same answer as the Postgres store, which never touches the table
        store
            .update_user(Uuid::new_v4(), UserUpdate::default())
            .await
            .unwrap();

        let user = store.add_user("a@x.com", "hash").await.unwrap();
        store.update_user(user.id, UserUpdate::default()).await.unwrap();
        let found = store.find_user_by(UserLookup::Email("a@x.com")).await.unwrap();
        assert_eq!(found.hashed_password, "hash");
        assert!(found.session_id.is_none());
        assert!(found.reset_token.is_none());
    }

    #[tokio::test]
    async fn memory_store_token_lookups_follow_updates() {
        let store = MemoryUserStore::new();
        let user = store.add_user("a@x.com", "hash").await.unwrap();

        store
            .update_user(user.id, UserUpdate::session(Some("s1".into())))
            .await
            .unwrap();
        let found = store.find_user_by(UserLookup::SessionId("s1")).await.unwrap();
        assert_eq!(found.id, user.id);

        store
            .update_user(user.id, UserUpdate::session(None))
            .await
            .unwrap();
        assert!(store.find_user_by(UserLookup::SessionId("s1")).await.is_err());

        store
            .update_user(user.id, UserUpdate::password_reset("r1".into()))
            .await
            .unwrap();
        let found = store.find_user_by(UserLookup::ResetToken("r1")).await.unwrap();
        assert_eq!(found.id, user.id);
    }
}
