//! Community forum service
//!
//! Posts and threaded comments with author-only edit/delete, idempotent like
//! toggling and view counting. Replying to a comment notifies its author.

use crate::db::repositories::{NotificationRepository, PostRepository};
use crate::models::{
    Comment, CommentWithMeta, CreateCommentInput, CreatePostInput, LikeTargetType, ListParams,
    Notification, NotificationKind, PagedResult, Post, UpdatePostInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for community service operations
#[derive(Debug, thiserror::Error)]
pub enum CommunityServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Post or comment not found
    #[error("{0}")]
    NotFound(String),

    /// Acting user is not the author
    #[error("{0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Result of a like toggle
#[derive(Debug, Clone, serde::Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

/// Community forum service
pub struct CommunityService {
    repo: Arc<dyn PostRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
}

impl CommunityService {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            repo,
            notification_repo,
        }
    }

    /// Create a post
    pub async fn create_post(
        &self,
        author_id: i64,
        input: CreatePostInput,
    ) -> Result<Post, CommunityServiceError> {
        if input.title.trim().is_empty() {
            return Err(CommunityServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(CommunityServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let post = Post {
            id: 0,
            author_id,
            title: input.title.trim().to_string(),
            content: input.content,
            category: input.category,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create_post(&post)
            .await
            .context("Failed to create post")?;

        Ok(created)
    }

    /// Get a post, bumping its view counter when `count_view` is set
    pub async fn get_post(&self, id: i64, count_view: bool) -> Result<Post, CommunityServiceError> {
        let post = self
            .repo
            .get_post(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| CommunityServiceError::NotFound("Post not found".to_string()))?;

        if count_view {
            self.repo
                .increment_view(id)
                .await
                .context("Failed to count view")?;
        }

        Ok(post)
    }

    /// Category-filtered, paginated post listing
    pub async fn list_posts(
        &self,
        category: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, CommunityServiceError> {
        let items = self
            .repo
            .list_posts(category, params.offset(), params.limit())
            .await
            .context("Failed to list posts")?;
        let total = self
            .repo
            .count_posts(category)
            .await
            .context("Failed to count posts")?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Edit a post. Author only.
    pub async fn update_post(
        &self,
        user_id: i64,
        post_id: i64,
        input: UpdatePostInput,
    ) -> Result<Post, CommunityServiceError> {
        let mut post = self.authored_post(user_id, post_id).await?;

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(CommunityServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            post.title = title.trim().to_string();
        }
        if let Some(content) = input.content {
            post.content = content;
        }
        if let Some(category) = input.category {
            post.category = category;
        }

        let updated = self
            .repo
            .update_post(&post)
            .await
            .context("Failed to update post")?;

        Ok(updated)
    }

    /// Delete a post with its comments and likes. Author only.
    pub async fn delete_post(&self, user_id: i64, post_id: i64) -> Result<(), CommunityServiceError> {
        self.authored_post(user_id, post_id).await?;

        self.repo
            .delete_post(post_id)
            .await
            .context("Failed to delete post")?;

        Ok(())
    }

    /// Add a comment (optionally a reply) to a post.
    ///
    /// A reply's parent must be a comment on the same post; the parent's
    /// author is notified unless they are replying to themselves.
    pub async fn add_comment(
        &self,
        author: &crate::models::User,
        post_id: i64,
        input: CreateCommentInput,
    ) -> Result<Comment, CommunityServiceError> {
        if input.content.trim().is_empty() {
            return Err(CommunityServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let post = self
            .repo
            .get_post(post_id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| CommunityServiceError::NotFound("Post not found".to_string()))?;

        let parent = match input.parent_id {
            Some(parent_id) => {
                let parent = self
                    .repo
                    .get_comment(parent_id)
                    .await
                    .context("Failed to get parent comment")?
                    .ok_or_else(|| {
                        CommunityServiceError::NotFound("Parent comment not found".to_string())
                    })?;
                if parent.post_id != post_id {
                    return Err(CommunityServiceError::ValidationError(
                        "Parent comment belongs to another post".to_string(),
                    ));
                }
                Some(parent)
            }
            None => None,
        };

        let now = Utc::now();
        let comment = Comment {
            id: 0,
            post_id,
            author_id: author.id,
            parent_id: input.parent_id,
            content: input.content,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create_comment(&comment)
            .await
            .context("Failed to create comment")?;

        if let Some(parent) = parent {
            if parent.author_id != author.id {
                let notification = Notification {
                    id: 0,
                    user_id: parent.author_id,
                    kind: NotificationKind::CommentReply,
                    message: format!("{} replied to your comment on \"{}\"", author.username, post.title),
                    related_id: Some(created.id),
                    is_read: false,
                    created_at: Utc::now(),
                };
                if let Err(e) = self.notification_repo.create(&notification).await {
                    tracing::warn!("Failed to write reply notification: {}", e);
                }
            }
        }

        Ok(created)
    }

    /// Comments for a post as a one-level tree
    pub async fn list_comments(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentWithMeta>, CommunityServiceError> {
        let comments = self
            .repo
            .list_comments(post_id, viewer_id)
            .await
            .context("Failed to list comments")?;

        Ok(comments)
    }

    /// Edit a comment. Author only.
    pub async fn update_comment(
        &self,
        user_id: i64,
        comment_id: i64,
        content: String,
    ) -> Result<Comment, CommunityServiceError> {
        if content.trim().is_empty() {
            return Err(CommunityServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let mut comment = self.authored_comment(user_id, comment_id).await?;
        comment.content = content;

        let updated = self
            .repo
            .update_comment(&comment)
            .await
            .context("Failed to update comment")?;

        Ok(updated)
    }

    /// Delete a comment. Author only.
    pub async fn delete_comment(
        &self,
        user_id: i64,
        comment_id: i64,
    ) -> Result<(), CommunityServiceError> {
        self.authored_comment(user_id, comment_id).await?;

        self.repo
            .delete_comment(comment_id)
            .await
            .context("Failed to delete comment")?;

        Ok(())
    }

    /// Toggle a like: add when absent, remove when present.
    ///
    /// Toggling twice restores the original state and count.
    pub async fn toggle_like(
        &self,
        user_id: i64,
        target_type: LikeTargetType,
        target_id: i64,
    ) -> Result<LikeState, CommunityServiceError> {
        // The target must exist
        match target_type {
            LikeTargetType::Post => {
                self.repo
                    .get_post(target_id)
                    .await
                    .context("Failed to get post")?
                    .ok_or_else(|| CommunityServiceError::NotFound("Post not found".to_string()))?;
            }
            LikeTargetType::Comment => {
                self.repo
                    .get_comment(target_id)
                    .await
                    .context("Failed to get comment")?
                    .ok_or_else(|| {
                        CommunityServiceError::NotFound("Comment not found".to_string())
                    })?;
            }
        }

        let already_liked = self
            .repo
            .is_liked(target_type, target_id, user_id)
            .await
            .context("Failed to check like")?;

        if already_liked {
            self.repo
                .remove_like(target_type, target_id, user_id)
                .await
                .context("Failed to remove like")?;
        } else {
            self.repo
                .add_like(target_type, target_id, user_id)
                .await
                .context("Failed to add like")?;
        }

        let like_count = match target_type {
            LikeTargetType::Post => {
                self.repo
                    .get_post(target_id)
                    .await
                    .context("Failed to reload post")?
                    .map(|p| p.like_count)
                    .unwrap_or(0)
            }
            LikeTargetType::Comment => {
                self.repo
                    .get_comment(target_id)
                    .await
                    .context("Failed to reload comment")?
                    .map(|c| c.like_count)
                    .unwrap_or(0)
            }
        };

        Ok(LikeState {
            liked: !already_liked,
            like_count,
        })
    }

    async fn authored_post(&self, user_id: i64, post_id: i64) -> Result<Post, CommunityServiceError> {
        let post = self
            .repo
            .get_post(post_id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| CommunityServiceError::NotFound("Post not found".to_string()))?;

        if post.author_id != user_id {
            return Err(CommunityServiceError::Forbidden(
                "Only the author may modify this post".to_string(),
            ));
        }

        Ok(post)
    }

    async fn authored_comment(
        &self,
        user_id: i64,
        comment_id: i64,
    ) -> Result<Comment, CommunityServiceError> {
        let comment = self
            .repo
            .get_comment(comment_id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| CommunityServiceError::NotFound("Comment not found".to_string()))?;

        if comment.author_id != user_id {
            return Err(CommunityServiceError::Forbidden(
                "Only the author may modify this comment".to_string(),
            ));
        }

        Ok(comment)
    }
}
