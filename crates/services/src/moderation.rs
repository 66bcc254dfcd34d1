use std::sync::Arc;

use domains::{AppError, CommentEntry, Page, PageRequest, PostStore, Result};
use uuid::Uuid;

/// The site-wide comment queue and the disable/enable toggle.
pub struct ModerationService {
    posts: Arc<dyn PostStore>,
    comments_per_page: u32,
}

impl ModerationService {
    pub fn new(posts: Arc<dyn PostStore>, comments_per_page: u32) -> Self {
        Self {
            posts,
            comments_per_page,
        }
    }

    /// All comments, newest first. Paging is strict: any page outside
    /// 1..=pages is NotFound, page 1 of an empty queue is fine.
    pub async fn queue(&self, page: i64) -> Result<Page<CommentEntry>> {
        if page < 1 {
            return Err(AppError::not_found("Page", page));
        }

        let comments = self
            .posts
            .recent_comments(PageRequest::new(page, self.comments_per_page))
            .await?;
        if page > comments.pages() {
            return Err(AppError::not_found("Page", page));
        }
        Ok(comments)
    }

    /// Both directions persist; missing comments are NotFound.
    pub async fn set_disabled(&self, comment_id: Uuid, disabled: bool) -> Result<()> {
        if !self.posts.set_comment_disabled(comment_id, disabled).await? {
            return Err(AppError::not_found("Comment", comment_id));
        }
        tracing::info!(comment = %comment_id, disabled, "comment moderation updated");
        Ok(())
    }
}
