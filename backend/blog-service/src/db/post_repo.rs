use crate::db::PostQuery;
use crate::models::{AuthorRef, Category, Location, NewPost, Post, PostForm};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Posts joined with author, category and location
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.image, p.pub_date, p.is_published, p.created_at,
           a.id AS author_id, a.username AS author_username,
           c.id AS category_id, c.title AS category_title,
           c.description AS category_description, c.slug AS category_slug,
           c.is_published AS category_is_published, c.created_at AS category_created_at,
           l.id AS location_id, l.name AS location_name,
           l.is_published AS location_is_published, l.created_at AS location_created_at
    FROM posts p
    JOIN profiles a ON a.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

/// Shared listing filter. `$1` is the visibility instant (NULL disables the
/// public predicate), `$2` the category scope and `$3` the author scope.
const POST_FILTER: &str = r#"
    WHERE ($1::timestamptz IS NULL
           OR (p.is_published
               AND (c.id IS NULL OR c.is_published)
               AND p.pub_date <= $1))
      AND ($2::bigint IS NULL OR p.category_id = $2)
      AND ($3::bigint IS NULL OR p.author_id = $3)
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    text: String,
    image: Option<String>,
    pub_date: DateTime<Utc>,
    is_published: bool,
    created_at: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    category_id: Option<i64>,
    category_title: Option<String>,
    category_description: Option<String>,
    category_slug: Option<String>,
    category_is_published: Option<bool>,
    category_created_at: Option<DateTime<Utc>>,
    location_id: Option<i64>,
    location_name: Option<String>,
    location_is_published: Option<bool>,
    location_created_at: Option<DateTime<Utc>>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let category = match (
            row.category_id,
            row.category_title,
            row.category_slug,
            row.category_is_published,
            row.category_created_at,
        ) {
            (Some(id), Some(title), Some(slug), Some(is_published), Some(created_at)) => {
                Some(Category {
                    id,
                    title,
                    description: row.category_description.unwrap_or_default(),
                    slug,
                    is_published,
                    created_at,
                })
            }
            _ => None,
        };

        let location = match (
            row.location_id,
            row.location_name,
            row.location_is_published,
            row.location_created_at,
        ) {
            (Some(id), Some(name), Some(is_published), Some(created_at)) => Some(Location {
                id,
                name,
                is_published,
                created_at,
            }),
            _ => None,
        };

        Post {
            id: row.id,
            title: row.title,
            text: row.text,
            image: row.image,
            pub_date: row.pub_date,
            is_published: row.is_published,
            created_at: row.created_at,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
            },
            category,
            location,
        }
    }
}

/// Find a post by ID without any visibility filter
pub async fn find_post_by_id(pool: &PgPool, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    let query = format!("{POST_SELECT} WHERE p.id = $1");
    let row = sqlx::query_as::<_, PostRow>(&query)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Post::from))
}

/// Find a post by ID only when it is publicly visible at `now`
pub async fn find_visible_post_by_id(
    pool: &PgPool,
    post_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Post>, sqlx::Error> {
    let query = format!(
        "{POST_SELECT}
         WHERE p.id = $2
           AND p.is_published
           AND (c.id IS NULL OR c.is_published)
           AND p.pub_date <= $1"
    );
    let row = sqlx::query_as::<_, PostRow>(&query)
        .bind(now)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Post::from))
}

/// Count posts matching a listing filter
pub async fn count_posts(pool: &PgPool, filter: &PostQuery) -> Result<i64, sqlx::Error> {
    let query = format!(
        "SELECT COUNT(*)
         FROM posts p
         LEFT JOIN categories c ON c.id = p.category_id
         {POST_FILTER}"
    );
    let count: i64 = sqlx::query_scalar(&query)
        .bind(filter.visible_at)
        .bind(filter.category_id)
        .bind(filter.author_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// List posts matching a listing filter, newest publication first
pub async fn list_posts(
    pool: &PgPool,
    filter: &PostQuery,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    let query = format!(
        "{POST_SELECT}
         {POST_FILTER}
         ORDER BY p.pub_date DESC, p.id DESC
         LIMIT $4 OFFSET $5"
    );
    let rows = sqlx::query_as::<_, PostRow>(&query)
        .bind(filter.visible_at)
        .bind(filter.category_id)
        .bind(filter.author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Post::from).collect())
}

/// Insert a post and return it with its joins
pub async fn create_post(pool: &PgPool, post: &NewPost) -> Result<Post, sqlx::Error> {
    let post_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO posts (title, text, image, pub_date, author_id, category_id, location_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&post.title)
    .bind(&post.text)
    .bind(&post.image)
    .bind(post.pub_date)
    .bind(post.author_id)
    .bind(post.category_id)
    .bind(post.location_id)
    .fetch_one(pool)
    .await?;

    find_post_by_id(pool, post_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Overwrite the editable fields of a post
pub async fn update_post(
    pool: &PgPool,
    post_id: i64,
    form: &PostForm,
) -> Result<Option<Post>, sqlx::Error> {
    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE posts
        SET title = $2, text = $3, image = $4, pub_date = $5, category_id = $6, location_id = $7
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(&form.title)
    .bind(&form.text)
    .bind(&form.image)
    .bind(form.pub_date)
    .bind(form.category)
    .bind(form.location)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(id) => find_post_by_id(pool, id).await,
        None => Ok(None),
    }
}

/// Delete a post; comments go with it through `ON DELETE CASCADE`
pub async fn delete_post(pool: &PgPool, post_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
