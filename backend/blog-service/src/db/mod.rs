/// Database access layer
///
/// This module provides:
/// - `BlogStore`: the persistence backend the policies and handlers query
/// - Repository functions for posts, comments, profiles and categories on Postgres
/// - `PgBlogStore`: the Postgres implementation of `BlogStore`
/// - `MemoryStore`: an in-process implementation for tests and local runs
pub mod category_repo;
pub mod comment_repo;
pub mod memory;
pub mod pg_store;
pub mod post_repo;
pub mod profile_repo;

pub use memory::MemoryStore;
pub use pg_store::{create_pool, PgBlogStore};

use crate::error::Result;
use crate::models::{
    Category, Comment, CommentForm, Location, NewComment, NewPost, Post, PostForm, Profile,
    ProfileForm,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Filter applied to post listings
///
/// `visible_at` switches on the public-visibility predicate evaluated at that
/// instant. The scopes narrow the listing to one category or one author.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub visible_at: Option<DateTime<Utc>>,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl PostQuery {
    /// Posts the public may see at `now`
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            visible_at: Some(now),
            ..Default::default()
        }
    }

    /// Every post regardless of publication state
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

/// Persistence backend for blog records
///
/// Listings are always ordered by `pub_date` descending with `id` descending
/// as the tie-break, so equal queries return equal sequences.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Verify the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Fetch a post by id regardless of visibility
    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    /// Fetch a post by id only if it is publicly visible at `now`
    async fn find_visible_post(&self, post_id: i64, now: DateTime<Utc>) -> Result<Option<Post>>;

    async fn count_posts(&self, query: &PostQuery) -> Result<i64>;

    async fn list_posts(&self, query: &PostQuery, limit: i64, offset: i64) -> Result<Vec<Post>>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    /// Apply an edit; `None` when the post no longer exists
    async fn update_post(&self, post_id: i64, form: &PostForm) -> Result<Option<Post>>;

    /// Delete a post together with its comments
    async fn delete_post(&self, post_id: i64) -> Result<bool>;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>>;

    async fn find_location(&self, location_id: i64) -> Result<Option<Location>>;

    async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>>;

    /// Comments of a post, oldest first
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    async fn update_comment(&self, comment_id: i64, form: &CommentForm)
        -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: i64) -> Result<bool>;

    async fn find_profile(&self, username: &str) -> Result<Option<Profile>>;

    async fn update_profile(&self, username: &str, form: &ProfileForm)
        -> Result<Option<Profile>>;
}
