use std::sync::Arc;

use domains::{
    last_page, AppError, Comment, CommentEntry, FeedPost, Page, PageRequest, Post, PostStore,
    Result,
};
use uuid::Uuid;

/// Publishing, feeds and comment threads.
pub struct PostService {
    posts: Arc<dyn PostStore>,
    posts_per_page: u32,
    comments_per_page: u32,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, posts_per_page: u32, comments_per_page: u32) -> Self {
        Self {
            posts,
            posts_per_page,
            comments_per_page,
        }
    }

    pub async fn publish(&self, author_id: Uuid, body: &str) -> Result<Post> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("The post body cannot be empty."));
        }

        let post = Post::new(author_id, body.to_string());
        self.posts.create_post(&post).await?;
        tracing::info!(post = %post.id, "post published");
        Ok(post)
    }

    /// The home feed. The followed variant only applies to signed-in
    /// viewers; anonymous viewers always get every post.
    pub async fn timeline(
        &self,
        viewer: Option<Uuid>,
        show_followed: bool,
        page: i64,
    ) -> Result<Page<FeedPost>> {
        let request = PageRequest::new(page, self.posts_per_page);
        match viewer.filter(|_| show_followed) {
            Some(viewer) => self.posts.followed_posts(viewer, request).await,
            None => self.posts.recent_posts(request).await,
        }
    }

    pub async fn find(&self, post_id: Uuid) -> Result<FeedPost> {
        self.posts
            .post_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))
    }

    /// A post plus one page of its comments, oldest first. `page == -1`
    /// resolves to the last page, the one holding the newest comment.
    pub async fn post_with_comments(
        &self,
        post_id: Uuid,
        page: i64,
    ) -> Result<(FeedPost, Page<CommentEntry>)> {
        let post = self.find(post_id).await?;

        let page = if page == -1 {
            last_page(post.comments, self.comments_per_page)
        } else {
            page
        };
        let comments = self
            .posts
            .comments_of_post(post_id, PageRequest::new(page, self.comments_per_page))
            .await?;
        Ok((post, comments))
    }

    pub async fn comment(&self, author_id: Uuid, post_id: Uuid, body: &str) -> Result<Comment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("The comment body cannot be empty."));
        }
        // The post must still exist; comments never dangle.
        self.find(post_id).await?;

        let comment = Comment::new(post_id, author_id, body.to_string());
        self.posts.create_comment(&comment).await?;
        Ok(comment)
    }

    pub async fn edit(&self, post_id: Uuid, body: &str) -> Result<()> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("The post body cannot be empty."));
        }

        if !self.posts.update_post_body(post_id, body).await? {
            return Err(AppError::not_found("Post", post_id));
        }
        tracing::info!(post = %post_id, "post updated");
        Ok(())
    }

    pub async fn author_posts(&self, author_id: Uuid, page: i64) -> Result<Page<FeedPost>> {
        self.posts
            .posts_by_author(author_id, PageRequest::new(page, self.posts_per_page))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{Author, MockPostStore};
    use mockall::predicate::eq;

    fn feed_post(post_id: Uuid, comments: u64) -> FeedPost {
        FeedPost {
            post: Post {
                id: post_id,
                author_id: Uuid::now_v7(),
                body: "hello".into(),
                created_at: Utc::now(),
            },
            author: Author {
                id: Uuid::now_v7(),
                username: "cat".into(),
            },
            comments,
        }
    }

    fn empty_page<T>(request: PageRequest, total: u64) -> Page<T> {
        Page::new(Vec::new(), request, total)
    }

    fn service(posts: MockPostStore) -> PostService {
        PostService::new(Arc::new(posts), 20, 30)
    }

    #[tokio::test]
    async fn publish_rejects_blank_bodies() {
        let err = service(MockPostStore::new())
            .publish(Uuid::now_v7(), "   \n")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn publish_trims_the_body() {
        let mut posts = MockPostStore::new();
        posts
            .expect_create_post()
            .withf(|post| post.body == "hello")
            .returning(|_| Ok(()));

        let post = service(posts).publish(Uuid::now_v7(), "  hello  ").await.unwrap();
        assert_eq!(post.body, "hello");
    }

    #[tokio::test]
    async fn timeline_only_narrows_for_signed_in_viewers() {
        let viewer = Uuid::now_v7();

        // Signed in and opted in: the followed feed.
        let mut posts = MockPostStore::new();
        posts
            .expect_followed_posts()
            .with(eq(viewer), eq(PageRequest::new(1, 20)))
            .returning(|_, request| Ok(empty_page(request, 0)));
        service(posts).timeline(Some(viewer), true, 1).await.unwrap();

        // Signed in without the cookie: everything.
        let mut posts = MockPostStore::new();
        posts
            .expect_recent_posts()
            .returning(|request| Ok(empty_page(request, 0)));
        service(posts).timeline(Some(viewer), false, 1).await.unwrap();

        // Anonymous viewers get everything even with the cookie set.
        let mut posts = MockPostStore::new();
        posts
            .expect_recent_posts()
            .returning(|request| Ok(empty_page(request, 0)));
        service(posts).timeline(None, true, 1).await.unwrap();
    }

    #[tokio::test]
    async fn page_minus_one_resolves_to_the_last_page() {
        let post_id = Uuid::now_v7();

        let mut posts = MockPostStore::new();
        posts
            .expect_post_by_id()
            .with(eq(post_id))
            .returning(move |_| Ok(Some(feed_post(post_id, 61))));
        // 61 comments at 30 per page land on page 3.
        posts
            .expect_comments_of_post()
            .with(eq(post_id), eq(PageRequest::new(3, 30)))
            .returning(|_, request| Ok(empty_page(request, 61)));

        let (post, comments) = service(posts)
            .post_with_comments(post_id, -1)
            .await
            .unwrap();
        assert_eq!(post.comments, 61);
        assert_eq!(comments.page, 3);
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let mut posts = MockPostStore::new();
        posts.expect_post_by_id().returning(|_| Ok(None));

        let err = service(posts)
            .post_with_comments(Uuid::now_v7(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn commenting_requires_an_existing_post() {
        let mut posts = MockPostStore::new();
        posts.expect_post_by_id().returning(|_| Ok(None));

        let err = service(posts)
            .comment(Uuid::now_v7(), Uuid::now_v7(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn editing_a_missing_post_is_not_found() {
        let mut posts = MockPostStore::new();
        posts.expect_update_post_body().returning(|_, _| Ok(false));

        let err = service(posts)
            .edit(Uuid::now_v7(), "new body")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}
