//! Session repository
//!
//! Database operations for user sessions.

use crate::db::DbPool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete expired sessions
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DbPool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create session")?;

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, expires_at, created_at
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get session by ID")?;

        match row {
            Some(row) => Ok(Some(Session {
                id: row.get("id"),
                user_id: row.get("user_id"),
                expires_at: row.get("expires_at"),
                created_at: row.get("created_at"),
            })),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete sessions by user")?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<i64> {
        let now = Utc::now();
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use chrono::Duration;

    async fn setup() -> (DbPool, SqlxSessionRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::new(pool.clone());
        let user = user_repo
            .create(&User::new(
                "sess_user".to_string(),
                "sess@example.com".to_string(),
                "hash".to_string(),
                UserRole::Adopter,
            ))
            .await
            .expect("Failed to create user");

        (pool.clone(), SqlxSessionRepository::new(pool), user.id)
    }

    fn make_session(user_id: i64, ttl_days: i64) -> Session {
        let now = Utc::now();
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(ttl_days),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (_pool, repo, user_id) = setup().await;
        let session = make_session(user_id, 7);

        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.user_id, user_id);
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_get_nonexistent_session() {
        let (_pool, repo, _user_id) = setup().await;

        let found = repo
            .get_by_id("no-such-token")
            .await
            .expect("Failed to get session");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (_pool, repo, user_id) = setup().await;
        let session = make_session(user_id, 7);
        repo.create(&session).await.expect("Failed to create session");

        repo.delete(&session.id).await.expect("Failed to delete");

        let found = repo.get_by_id(&session.id).await.expect("Failed to get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let (_pool, repo, user_id) = setup().await;
        let s1 = make_session(user_id, 7);
        let s2 = make_session(user_id, 7);
        repo.create(&s1).await.unwrap();
        repo.create(&s2).await.unwrap();

        repo.delete_by_user(user_id).await.expect("Failed to delete");

        assert!(repo.get_by_id(&s1.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&s2.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (_pool, repo, user_id) = setup().await;
        repo.create(&make_session(user_id, -1)).await.unwrap();
        repo.create(&make_session(user_id, 7)).await.unwrap();

        let deleted = repo.delete_expired().await.expect("Failed to delete");
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_session_requires_existing_user() {
        let (_pool, repo, _user_id) = setup().await;
        let session = make_session(9999, 7);

        let result = repo.create(&session).await;
        assert!(result.is_err(), "FK constraint should reject orphan session");
    }
}
