use async_trait::async_trait;
use domains::{
    Author, Comment, CommentEntry, FeedPost, Page, PageRequest, Post, PostStore, Result,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::{blob_to_uuid, map_db, uuid_to_blob};

/// Posts and comments on SQLite. Listing queries join the author's
/// username and carry each post's comment count.
pub struct SqlitePostStore {
    pool: SqlitePool,
}

impl SqlitePostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SELECT_FEED: &str = "SELECT p.id, p.author_id, p.body, p.created_at, \
    u.username AS author_username, \
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments \
    FROM posts p JOIN users u ON u.id = p.author_id";

const SELECT_COMMENTS: &str = "SELECT c.id, c.post_id, c.author_id, c.body, c.disabled, \
    c.created_at, u.username AS author_username \
    FROM comments c JOIN users u ON u.id = c.author_id";

// Newer-first listings break created_at ties on the id so pages never
// reshuffle between requests.
const FEED_ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?";

fn map_feed_post(row: &SqliteRow) -> FeedPost {
    FeedPost {
        post: Post {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
            body: row.get("body"),
            created_at: row.get("created_at"),
        },
        author: Author {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
            username: row.get("author_username"),
        },
        comments: row.get::<i64, _>("comments") as u64,
    }
}

fn map_comment(row: &SqliteRow) -> Comment {
    Comment {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        post_id: blob_to_uuid(row.get::<Vec<u8>, _>("post_id").as_slice()),
        author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
        body: row.get("body"),
        disabled: row.get("disabled"),
        created_at: row.get("created_at"),
    }
}

fn map_comment_entry(row: &SqliteRow) -> CommentEntry {
    CommentEntry {
        comment: map_comment(row),
        author: Author {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
            username: row.get("author_username"),
        },
    }
}

impl SqlitePostStore {
    async fn count(&self, sql: &str, binds: &[Uuid]) -> Result<u64> {
        let mut query = sqlx::query(sql);
        for id in binds {
            query = query.bind(uuid_to_blob(*id));
        }
        let row = query.fetch_one(&self.pool).await.map_err(map_db)?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn create_post(&self, post: &Post) -> Result<()> {
        sqlx::query("INSERT INTO posts (id, author_id, body, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(post.id))
            .bind(uuid_to_blob(post.author_id))
            .bind(&post.body)
            .bind(post.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<FeedPost>> {
        let row = sqlx::query(&format!("{SELECT_FEED} WHERE p.id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.as_ref().map(map_feed_post))
    }

    async fn update_post_body(&self, id: Uuid, body: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET body = ? WHERE id = ?")
            .bind(body)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent_posts(&self, page: PageRequest) -> Result<Page<FeedPost>> {
        let rows = sqlx::query(&format!("{SELECT_FEED} {FEED_ORDER}"))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db)?;

        let total = self.count("SELECT COUNT(*) AS n FROM posts", &[]).await?;
        Ok(Page::new(rows.iter().map(map_feed_post).collect(), page, total))
    }

    async fn followed_posts(&self, viewer_id: Uuid, page: PageRequest) -> Result<Page<FeedPost>> {
        const FILTER: &str = "WHERE p.author_id = ? OR p.author_id IN \
            (SELECT followed_id FROM follows WHERE follower_id = ?)";

        let rows = sqlx::query(&format!("{SELECT_FEED} {FILTER} {FEED_ORDER}"))
            .bind(uuid_to_blob(viewer_id))
            .bind(uuid_to_blob(viewer_id))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db)?;

        let total = self
            .count(
                &format!("SELECT COUNT(*) AS n FROM posts p {FILTER}"),
                &[viewer_id, viewer_id],
            )
            .await?;
        Ok(Page::new(rows.iter().map(map_feed_post).collect(), page, total))
    }

    async fn posts_by_author(&self, author_id: Uuid, page: PageRequest) -> Result<Page<FeedPost>> {
        let rows = sqlx::query(&format!("{SELECT_FEED} WHERE p.author_id = ? {FEED_ORDER}"))
            .bind(uuid_to_blob(author_id))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db)?;

        let total = self
            .count("SELECT COUNT(*) AS n FROM posts WHERE author_id = ?", &[author_id])
            .await?;
        Ok(Page::new(rows.iter().map(map_feed_post).collect(), page, total))
    }

    async fn create_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, body, disabled, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(comment.id))
        .bind(uuid_to_blob(comment.post_id))
        .bind(uuid_to_blob(comment.author_id))
        .bind(&comment.body)
        .bind(comment.disabled)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(())
    }

    async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.as_ref().map(map_comment))
    }

    async fn comments_of_post(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<CommentEntry>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COMMENTS} WHERE c.post_id = ? \
             ORDER BY c.created_at ASC, c.id ASC LIMIT ? OFFSET ?"
        ))
        .bind(uuid_to_blob(post_id))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db)?;

        let total = self.count_comments(post_id).await?;
        Ok(Page::new(rows.iter().map(map_comment_entry).collect(), page, total))
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<u64> {
        self.count("SELECT COUNT(*) AS n FROM comments WHERE post_id = ?", &[post_id])
            .await
    }

    async fn recent_comments(&self, page: PageRequest) -> Result<Page<CommentEntry>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COMMENTS} ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db)?;

        let total = self.count("SELECT COUNT(*) AS n FROM comments", &[]).await?;
        Ok(Page::new(rows.iter().map(map_comment_entry).collect(), page, total))
    }

    async fn set_comment_disabled(&self, id: Uuid, disabled: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET disabled = ? WHERE id = ?")
            .bind(disabled)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(result.rows_affected() > 0)
    }
}
