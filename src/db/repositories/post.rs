//! Forum repository
//!
//! Database operations for community posts, threaded comments and the like
//! membership table. Like counts are denormalized onto posts and comments and
//! maintained atomically alongside membership changes.

use crate::db::DbPool;
use crate::models::{Comment, CommentWithMeta, LikeTargetType, Post};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Forum repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create_post(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;

    /// Update title/content/category of a post
    async fn update_post(&self, post: &Post) -> Result<Post>;

    /// Delete a post, its comments and all related likes
    async fn delete_post(&self, id: i64) -> Result<()>;

    /// List posts, optionally filtered by category, newest first
    async fn list_posts(
        &self,
        category: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Count posts, optionally filtered by category
    async fn count_posts(&self, category: Option<&str>) -> Result<i64>;

    /// Increment the view counter of a post
    async fn increment_view(&self, id: i64) -> Result<()>;

    /// Create a comment and bump the post's comment counter
    async fn create_comment(&self, comment: &Comment) -> Result<Comment>;

    /// Get comment by ID
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;

    /// Update the content of a comment
    async fn update_comment(&self, comment: &Comment) -> Result<Comment>;

    /// Delete a comment (and its replies) and fix the post's comment counter
    async fn delete_comment(&self, id: i64) -> Result<()>;

    /// Comments for a post as a one-level tree with author metadata.
    ///
    /// `viewer_id` controls the per-comment `is_liked` flag.
    async fn list_comments(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentWithMeta>>;

    /// Add a like; no-op when already present. Returns true when added.
    async fn add_like(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool>;

    /// Remove a like; no-op when absent. Returns true when removed.
    async fn remove_like(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool>;

    /// Check like membership
    async fn is_liked(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool>;
}

/// SQLx-based forum repository implementation
pub struct SqlxPostRepository {
    pool: DbPool,
}

impl SqlxPostRepository {
    /// Create a new SQLx forum repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    /// Column the like counter lives on for a target type
    fn counter_table(target_type: LikeTargetType) -> &'static str {
        match target_type {
            LikeTargetType::Post => "posts",
            LikeTargetType::Comment => "comments",
        }
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create_post(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO posts (author_id, title, content, category, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.category)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(Post {
            id: result.last_insert_rowid(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
            ..post.clone()
        })
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, author_id, title, content, category, view_count, like_count,
                   comment_count, created_at, updated_at
            FROM posts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get post by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_post(&row))),
            None => Ok(None),
        }
    }

    async fn update_post(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, content = ?, category = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.category)
        .bind(now)
        .bind(post.id)
        .execute(&self.pool)
        .await
        .context("Failed to update post")?;

        self.get_post(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete_post(&self, id: i64) -> Result<()> {
        // Likes are not FK-linked to their targets, so clean them up first
        sqlx::query(
            r#"
            DELETE FROM likes
            WHERE target_type = 'comment'
              AND target_id IN (SELECT id FROM comments WHERE post_id = ?)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to delete comment likes")?;

        sqlx::query("DELETE FROM likes WHERE target_type = 'post' AND target_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post likes")?;

        // Comments cascade via FK
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(())
    }

    async fn list_posts(
        &self,
        category: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(
                    r#"
                    SELECT id, author_id, title, content, category, view_count, like_count,
                           comment_count, created_at, updated_at
                    FROM posts
                    WHERE category = ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(category)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, author_id, title, content, category, view_count, like_count,
                           comment_count, created_at, updated_at
                    FROM posts
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list posts")?;

        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn count_posts(&self, category: Option<&str>) -> Result<i64> {
        let count: i64 = match category {
            Some(category) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE category = ?")
                    .bind(category)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .context("Failed to count posts")?;

        Ok(count)
    }

    async fn increment_view(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to increment view count")?;

        Ok(())
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Comment> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, author_id, parent_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(&comment.content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create comment")?;

        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?")
            .bind(comment.post_id)
            .execute(&self.pool)
            .await
            .context("Failed to bump comment count")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            like_count: 0,
            created_at: now,
            updated_at: now,
            ..comment.clone()
        })
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            r#"
            SELECT id, post_id, author_id, parent_id, content, like_count, created_at, updated_at
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get comment by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_comment(&row))),
            None => Ok(None),
        }
    }

    async fn update_comment(&self, comment: &Comment) -> Result<Comment> {
        let now = Utc::now();

        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&comment.content)
            .bind(now)
            .bind(comment.id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment")?;

        self.get_comment(comment.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment not found after update"))
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        let comment = match self.get_comment(id).await? {
            Some(c) => c,
            None => return Ok(()),
        };

        // Replies cascade via FK; count them so the post counter stays right
        let reply_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count replies")?;

        sqlx::query(
            r#"
            DELETE FROM likes
            WHERE target_type = 'comment' AND (target_id = ? OR target_id IN
                (SELECT id FROM comments WHERE parent_id = ?))
            "#,
        )
        .bind(id)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to delete comment likes")?;

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;

        sqlx::query("UPDATE posts SET comment_count = MAX(comment_count - ?, 0) WHERE id = ?")
            .bind(reply_count + 1)
            .bind(comment.post_id)
            .execute(&self.pool)
            .await
            .context("Failed to lower comment count")?;

        Ok(())
    }

    async fn list_comments(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentWithMeta>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.parent_id, c.content, c.like_count,
                   c.created_at, u.username AS author_name, u.email AS author_email,
                   CASE WHEN l.id IS NULL THEN 0 ELSE 1 END AS is_liked
            FROM comments c
            JOIN users u ON u.id = c.author_id
            LEFT JOIN likes l ON l.target_type = 'comment' AND l.target_id = c.id AND l.user_id = ?
            WHERE c.post_id = ?
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(viewer_id.unwrap_or(-1))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;

        let mut top_level: Vec<CommentWithMeta> = Vec::new();
        let mut replies: Vec<CommentWithMeta> = Vec::new();

        for row in &rows {
            let email: String = row.get("author_email");
            let is_liked: i64 = row.get("is_liked");
            let comment = CommentWithMeta {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                author_name: row.get("author_name"),
                parent_id: row.get("parent_id"),
                content: row.get("content"),
                like_count: row.get("like_count"),
                is_liked: is_liked != 0,
                avatar_url: CommentWithMeta::gravatar_url(&email),
                created_at: row.get("created_at"),
                replies: Vec::new(),
            };

            if comment.parent_id.is_some() {
                replies.push(comment);
            } else {
                top_level.push(comment);
            }
        }

        for reply in replies {
            if let Some(parent) = top_level
                .iter_mut()
                .find(|c| Some(c.id) == reply.parent_id)
            {
                parent.replies.push(reply);
            }
        }

        Ok(top_level)
    }

    async fn add_like(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO likes (target_type, target_id, user_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(target_type.to_string())
        .bind(target_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to add like")?;

        let added = result.rows_affected() > 0;
        if added {
            let sql = format!(
                "UPDATE {} SET like_count = like_count + 1 WHERE id = ?",
                Self::counter_table(target_type)
            );
            sqlx::query(&sql)
                .bind(target_id)
                .execute(&self.pool)
                .await
                .context("Failed to bump like count")?;
        }

        Ok(added)
    }

    async fn remove_like(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM likes WHERE target_type = ? AND target_id = ? AND user_id = ?",
        )
        .bind(target_type.to_string())
        .bind(target_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to remove like")?;

        let removed = result.rows_affected() > 0;
        if removed {
            let sql = format!(
                "UPDATE {} SET like_count = MAX(like_count - 1, 0) WHERE id = ?",
                Self::counter_table(target_type)
            );
            sqlx::query(&sql)
                .bind(target_id)
                .execute(&self.pool)
                .await
                .context("Failed to lower like count")?;
        }

        Ok(removed)
    }

    async fn is_liked(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM likes WHERE target_type = ? AND target_id = ? AND user_id = ?",
        )
        .bind(target_type.to_string())
        .bind(target_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check like")?;

        Ok(count > 0)
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        title: row.get("title"),
        content: row.get("content"),
        category: row.get("category"),
        view_count: row.get("view_count"),
        like_count: row.get("like_count"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        parent_id: row.get("parent_id"),
        content: row.get("content"),
        like_count: row.get("like_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
