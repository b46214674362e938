/// Postgres persistence backend
use crate::config::DatabaseConfig;
use crate::db::{category_repo, comment_repo, post_repo, profile_repo, BlogStore, PostQuery};
use crate::error::Result;
use crate::models::{
    Category, Comment, CommentForm, Location, NewComment, NewPost, Post, PostForm, Profile,
    ProfileForm,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create the connection pool and apply pending migrations
pub async fn create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    tracing::debug!(
        "Creating database pool: max={}, min={}, acquire_timeout={}s",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout_secs
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database pool created and migrations applied");
    Ok(pool)
}

#[derive(Clone)]
pub struct PgBlogStore {
    pool: PgPool,
}

impl PgBlogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogStore for PgBlogStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    async fn find_visible_post(&self, post_id: i64, now: DateTime<Utc>) -> Result<Option<Post>> {
        Ok(post_repo::find_visible_post_by_id(&self.pool, post_id, now).await?)
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<i64> {
        Ok(post_repo::count_posts(&self.pool, query).await?)
    }

    async fn list_posts(&self, query: &PostQuery, limit: i64, offset: i64) -> Result<Vec<Post>> {
        Ok(post_repo::list_posts(&self.pool, query, limit, offset).await?)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        Ok(post_repo::create_post(&self.pool, &post).await?)
    }

    async fn update_post(&self, post_id: i64, form: &PostForm) -> Result<Option<Post>> {
        Ok(post_repo::update_post(&self.pool, post_id, form).await?)
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        Ok(post_repo::delete_post(&self.pool, post_id).await?)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(category_repo::find_category_by_slug(&self.pool, slug).await?)
    }

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>> {
        Ok(category_repo::find_category_by_id(&self.pool, category_id).await?)
    }

    async fn find_location(&self, location_id: i64) -> Result<Option<Location>> {
        Ok(category_repo::find_location_by_id(&self.pool, location_id).await?)
    }

    async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        Ok(comment_repo::get_comment_by_id(&self.pool, comment_id).await?)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        Ok(comment_repo::get_comments_by_post(&self.pool, post_id).await?)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        Ok(comment_repo::create_comment(&self.pool, &comment).await?)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        form: &CommentForm,
    ) -> Result<Option<Comment>> {
        Ok(comment_repo::update_comment(&self.pool, comment_id, &form.text).await?)
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        Ok(comment_repo::delete_comment(&self.pool, comment_id).await?)
    }

    async fn find_profile(&self, username: &str) -> Result<Option<Profile>> {
        Ok(profile_repo::find_profile_by_username(&self.pool, username).await?)
    }

    async fn update_profile(
        &self,
        username: &str,
        form: &ProfileForm,
    ) -> Result<Option<Profile>> {
        Ok(profile_repo::update_profile(&self.pool, username, form).await?)
    }
}
