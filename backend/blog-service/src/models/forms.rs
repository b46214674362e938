/// Request forms and insert records
///
/// Forms carry only the fields a client may set. Authorship and the owning
/// post are never read from a form; they are stamped from the principal and
/// the request path when a form becomes a `NewPost` / `NewComment`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1))]
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category: Option<i64>,
    pub location: Option<i64>,
    #[validate(length(max = 255))]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

/// Post ready for insertion, author already stamped
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub image: Option<String>,
}

/// Comment ready for insertion, author and post already stamped
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}
