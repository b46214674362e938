/// Data models for blog-service
///
/// This module defines structures for:
/// - Post: Blog posts with their author, category and location joined in
/// - Category / Location: Out-of-band managed classifiers for posts
/// - Comment: Comments on posts
/// - Profile: Public identity record of an author
/// - Principal: The viewer of a request, possibly anonymous
pub mod forms;

pub use forms::{CommentForm, NewComment, NewPost, PostForm, ProfileForm};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post author as joined from the profiles table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Blog post with author, category and location eagerly joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
    pub category: Option<Category>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub author: AuthorRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

/// Authenticated identity supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
}

/// The viewer of a request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Principal {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(identity) => Some(identity),
        }
    }

    /// True when the viewer is authenticated as the given profile id
    pub fn is(&self, profile_id: i64) -> bool {
        self.identity().is_some_and(|identity| identity.id == profile_id)
    }
}

impl From<Identity> for Principal {
    fn from(identity: Identity) -> Self {
        Principal::Authenticated(identity)
    }
}
