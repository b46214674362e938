/// In-process persistence backend
///
/// Holds every table in ordered maps behind a tokio `RwLock`. It joins and
/// filters exactly like the Postgres queries do, and it is what the test
/// suites and `STORAGE_BACKEND=memory` local runs use.
use crate::db::{BlogStore, PostQuery};
use crate::error::Result;
use crate::models::{
    AuthorRef, Category, Comment, CommentForm, Location, NewComment, NewPost, Post, PostForm,
    Profile, ProfileForm,
};
use crate::policy::is_publicly_visible;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PostRecord {
    id: i64,
    title: String,
    text: String,
    image: Option<String>,
    pub_date: DateTime<Utc>,
    is_published: bool,
    created_at: DateTime<Utc>,
    author_id: i64,
    category_id: Option<i64>,
    location_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    post_id: i64,
    author_id: i64,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: BTreeMap<i64, Profile>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, PostRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    last_profile_id: i64,
    last_category_id: i64,
    last_location_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl Tables {
    fn author(&self, profile_id: i64) -> Option<AuthorRef> {
        self.profiles.get(&profile_id).map(|profile| AuthorRef {
            id: profile.id,
            username: profile.username.clone(),
        })
    }

    fn join_post(&self, record: &PostRecord) -> Option<Post> {
        Some(Post {
            id: record.id,
            title: record.title.clone(),
            text: record.text.clone(),
            image: record.image.clone(),
            pub_date: record.pub_date,
            is_published: record.is_published,
            created_at: record.created_at,
            author: self.author(record.author_id)?,
            category: record
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            location: record
                .location_id
                .and_then(|id| self.locations.get(&id).cloned()),
        })
    }

    fn join_comment(&self, record: &CommentRecord) -> Option<Comment> {
        Some(Comment {
            id: record.id,
            text: record.text.clone(),
            created_at: record.created_at,
            post_id: record.post_id,
            author: self.author(record.author_id)?,
        })
    }

    /// Matching posts, newest publication first
    fn query_posts(&self, query: &PostQuery) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .values()
            .filter(|record| query.category_id.map_or(true, |id| record.category_id == Some(id)))
            .filter(|record| query.author_id.map_or(true, |id| record.author_id == id))
            .filter_map(|record| self.join_post(record))
            .filter(|post| {
                query
                    .visible_at
                    .map_or(true, |now| is_publicly_visible(post, now))
            })
            .collect();

        posts.sort_by_key(|post| Reverse((post.pub_date, post.id)));
        posts
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_profile(&self, username: &str) -> Profile {
        let mut tables = self.tables.write().await;
        tables.last_profile_id += 1;
        let profile = Profile {
            id: tables.last_profile_id,
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            date_joined: Utc::now(),
        };
        tables.profiles.insert(profile.id, profile.clone());
        profile
    }

    pub async fn add_category(&self, title: &str, slug: &str, is_published: bool) -> Category {
        let mut tables = self.tables.write().await;
        tables.last_category_id += 1;
        let category = Category {
            id: tables.last_category_id,
            title: title.to_string(),
            description: String::new(),
            slug: slug.to_string(),
            is_published,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        category
    }

    pub async fn add_location(&self, name: &str) -> Location {
        let mut tables = self.tables.write().await;
        tables.last_location_id += 1;
        let location = Location {
            id: tables.last_location_id,
            name: name.to_string(),
            is_published: true,
            created_at: Utc::now(),
        };
        tables.locations.insert(location.id, location.clone());
        location
    }

    /// Insert a post with an explicit publication flag
    ///
    /// Returns `None` when the author does not exist.
    pub async fn add_post(&self, post: NewPost, is_published: bool) -> Option<Post> {
        let mut tables = self.tables.write().await;
        let record = PostRecord {
            id: tables.last_post_id + 1,
            title: post.title,
            text: post.text,
            image: post.image,
            pub_date: post.pub_date,
            is_published,
            created_at: Utc::now(),
            author_id: post.author_id,
            category_id: post.category_id,
            location_id: post.location_id,
        };
        let joined = tables.join_post(&record)?;
        tables.last_post_id = record.id;
        tables.posts.insert(record.id, record);
        Some(joined)
    }

    pub async fn set_category_published(&self, category_id: i64, is_published: bool) {
        if let Some(category) = self.tables.write().await.categories.get_mut(&category_id) {
            category.is_published = is_published;
        }
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .get(&post_id)
            .and_then(|record| tables.join_post(record)))
    }

    async fn find_visible_post(&self, post_id: i64, now: DateTime<Utc>) -> Result<Option<Post>> {
        Ok(self
            .find_post(post_id)
            .await?
            .filter(|post| is_publicly_visible(post, now)))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.query_posts(query).len() as i64)
    }

    async fn list_posts(&self, query: &PostQuery, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .query_posts(query)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let author_id = post.author_id;
        self.add_post(post, true).await.ok_or_else(|| {
            crate::error::AppError::Internal(format!("author {} does not exist", author_id))
        })
    }

    async fn update_post(&self, post_id: i64, form: &PostForm) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        record.title = form.title.clone();
        record.text = form.text.clone();
        record.image = form.image.clone();
        record.pub_date = form.pub_date;
        record.category_id = form.category;
        record.location_id = form.location;

        let record = record.clone();
        Ok(tables.join_post(&record))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.posts.remove(&post_id).is_some();
        if removed {
            tables.comments.retain(|_, comment| comment.post_id != post_id);
        }
        Ok(removed)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&category_id).cloned())
    }

    async fn find_location(&self, location_id: i64) -> Result<Option<Location>> {
        Ok(self.tables.read().await.locations.get(&location_id).cloned())
    }

    async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .and_then(|record| tables.join_comment(record)))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|record| record.post_id == post_id)
            .filter_map(|record| tables.join_comment(record))
            .collect();
        comments.sort_by_key(|comment| (comment.created_at, comment.id));
        Ok(comments)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(crate::error::AppError::not_found(format!(
                "post {}",
                comment.post_id
            )));
        }
        let record = CommentRecord {
            id: tables.last_comment_id + 1,
            text: comment.text,
            created_at: Utc::now(),
            post_id: comment.post_id,
            author_id: comment.author_id,
        };
        let joined = tables.join_comment(&record).ok_or_else(|| {
            crate::error::AppError::Internal(format!("author {} does not exist", record.author_id))
        })?;
        tables.last_comment_id = record.id;
        tables.comments.insert(record.id, record);
        Ok(joined)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        form: &CommentForm,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.comments.get_mut(&comment_id) else {
            return Ok(None);
        };
        record.text = form.text.clone();

        let record = record.clone();
        Ok(tables.join_comment(&record))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .await
            .comments
            .remove(&comment_id)
            .is_some())
    }

    async fn find_profile(&self, username: &str) -> Result<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .profiles
            .values()
            .find(|profile| profile.username == username)
            .cloned())
    }

    async fn update_profile(
        &self,
        username: &str,
        form: &ProfileForm,
    ) -> Result<Option<Profile>> {
        let mut tables = self.tables.write().await;
        let Some(profile) = tables
            .profiles
            .values_mut()
            .find(|profile| profile.username == username)
        else {
            return Ok(None);
        };
        profile.first_name = form.first_name.clone();
        profile.last_name = form.last_name.clone();
        profile.email = form.email.clone().unwrap_or_default();
        Ok(Some(profile.clone()))
    }
}
