use crate::models::{AuthorRef, Comment, NewComment};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.text, cm.created_at, cm.post_id,
           a.id AS author_id, a.username AS author_username
    FROM comments cm
    JOIN profiles a ON a.id = cm.author_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    post_id: i64,
    author_id: i64,
    author_username: String,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            text: row.text,
            created_at: row.created_at,
            post_id: row.post_id,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
            },
        }
    }
}

/// Get a single comment by ID
pub async fn get_comment_by_id(
    pool: &PgPool,
    comment_id: i64,
) -> Result<Option<Comment>, sqlx::Error> {
    let query = format!("{COMMENT_SELECT} WHERE cm.id = $1");
    let row = sqlx::query_as::<_, CommentRow>(&query)
        .bind(comment_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Comment::from))
}

/// Get all comments for a post, oldest first
pub async fn get_comments_by_post(
    pool: &PgPool,
    post_id: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    let query = format!("{COMMENT_SELECT} WHERE cm.post_id = $1 ORDER BY cm.created_at ASC, cm.id ASC");
    let rows = sqlx::query_as::<_, CommentRow>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Comment::from).collect())
}

/// Create a new comment on a post
pub async fn create_comment(pool: &PgPool, comment: &NewComment) -> Result<Comment, sqlx::Error> {
    let comment_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (text, post_id, author_id)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&comment.text)
    .bind(comment.post_id)
    .bind(comment.author_id)
    .fetch_one(pool)
    .await?;

    get_comment_by_id(pool, comment_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Update comment text
pub async fn update_comment(
    pool: &PgPool,
    comment_id: i64,
    text: &str,
) -> Result<Option<Comment>, sqlx::Error> {
    let updated: Option<i64> =
        sqlx::query_scalar("UPDATE comments SET text = $2 WHERE id = $1 RETURNING id")
            .bind(comment_id)
            .bind(text)
            .fetch_optional(pool)
            .await?;

    match updated {
        Some(id) => get_comment_by_id(pool, id).await,
        None => Ok(None),
    }
}

/// Delete a comment
pub async fn delete_comment(pool: &PgPool, comment_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
