use crate::models::{Category, Location};
use sqlx::PgPool;

pub async fn find_category_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, title, description, slug, is_published, created_at
        FROM categories
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn find_category_by_id(
    pool: &PgPool,
    category_id: i64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, title, description, slug, is_published, created_at
        FROM categories
        WHERE id = $1
        "#,
    )
    .bind(category_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_location_by_id(
    pool: &PgPool,
    location_id: i64,
) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "SELECT id, name, is_published, created_at FROM locations WHERE id = $1",
    )
    .bind(location_id)
    .fetch_optional(pool)
    .await
}
