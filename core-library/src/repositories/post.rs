//! SQLite record store

use async_trait::async_trait;
use sqlx::{query, query_as, FromRow, SqlitePool};
use tracing::debug;

use super::PostRepository;
use crate::error::{LibraryError, Result};
use crate::models::{ArchivedPost, StoredMediaSlot};

/// Row shape of the `posts` table; enums as text, media as JSON.
#[derive(Debug, FromRow)]
struct PostRow {
    id: String,
    source_url: String,
    shortcode: String,
    kind: String,
    account: String,
    caption: String,
    owner_username: Option<String>,
    owner_full_name: Option<String>,
    owner_avatar: Option<String>,
    like_count: Option<i64>,
    comment_count: Option<i64>,
    posted_at: Option<i64>,
    local_date: Option<String>,
    local_time: Option<String>,
    media: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<PostRow> for ArchivedPost {
    type Error = LibraryError;

    fn try_from(row: PostRow) -> Result<Self> {
        let media: Vec<StoredMediaSlot> = serde_json::from_str(&row.media)?;

        Ok(ArchivedPost {
            id: row.id,
            source_url: row.source_url,
            shortcode: row.shortcode,
            kind: row.kind.parse()?,
            account: row.account.parse()?,
            caption: row.caption,
            owner_username: row.owner_username,
            owner_full_name: row.owner_full_name,
            owner_avatar: row.owner_avatar,
            like_count: row.like_count,
            comment_count: row.comment_count,
            posted_at: row.posted_at,
            local_date: row.local_date,
            local_time: row.local_time,
            media,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// SQLite implementation of PostRepository
pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validate(post: &ArchivedPost) -> Result<()> {
        post.validate().map_err(|message| LibraryError::InvalidInput {
            field: "ArchivedPost".to_string(),
            message,
        })
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(&self, post: &ArchivedPost) -> Result<()> {
        Self::validate(post)?;
        let media = serde_json::to_string(&post.media)?;

        query(
            r#"
            INSERT INTO posts (
                id, source_url, shortcode, kind, account, caption,
                owner_username, owner_full_name, owner_avatar, like_count, comment_count,
                posted_at, local_date, local_time, media, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.source_url)
        .bind(&post.shortcode)
        .bind(post.kind.as_str())
        .bind(post.account.as_str())
        .bind(&post.caption)
        .bind(&post.owner_username)
        .bind(&post.owner_full_name)
        .bind(&post.owner_avatar)
        .bind(post.like_count)
        .bind(post.comment_count)
        .bind(post.posted_at)
        .bind(&post.local_date)
        .bind(&post.local_time)
        .bind(media)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(post_id = %post.id, shortcode = %post.shortcode, "Inserted post");
        Ok(())
    }

    async fn update(&self, post: &ArchivedPost) -> Result<()> {
        Self::validate(post)?;
        let media = serde_json::to_string(&post.media)?;

        let result = query(
            r#"
            UPDATE posts
            SET source_url = ?, shortcode = ?, kind = ?, account = ?, caption = ?,
                owner_username = ?, owner_full_name = ?, owner_avatar = ?,
                like_count = ?, comment_count = ?, posted_at = ?,
                local_date = ?, local_time = ?, media = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.source_url)
        .bind(&post.shortcode)
        .bind(post.kind.as_str())
        .bind(post.account.as_str())
        .bind(&post.caption)
        .bind(&post.owner_username)
        .bind(&post.owner_full_name)
        .bind(&post.owner_avatar)
        .bind(post.like_count)
        .bind(post.comment_count)
        .bind(post.posted_at)
        .bind(&post.local_date)
        .bind(&post.local_time)
        .bind(media)
        .bind(post.updated_at)
        .bind(&post.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "ArchivedPost".to_string(),
                id: post.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<ArchivedPost>> {
        let rows = query_as::<_, PostRow>("SELECT * FROM posts ORDER BY created_at ASC, rowid ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ArchivedPost::try_from).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArchivedPost>> {
        let row = query_as::<_, PostRow>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ArchivedPost::try_from).transpose()
    }
}
