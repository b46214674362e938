//! Shared fixtures for blog-service integration tests
//!
//! Builds the full actix app over a seeded `MemoryStore` and mints bearer
//! tokens the way the identity provider would.
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use blog_service::db::{BlogStore, MemoryStore};
use blog_service::handlers;
use blog_service::middleware::{Claims, JwtKeys, PrincipalMiddleware};
use blog_service::models::{Category, Location, NewPost, Post, Profile};
use blog_service::render::{JsonRenderer, Renderer};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub alice: Profile,
    pub bob: Profile,
    pub travel: Category,
    pub drafts: Category,
    pub moscow: Location,
}

/// Two authors, a published and an unpublished category, one location
pub async fn seed() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_profile("alice").await;
    let bob = store.add_profile("bob").await;
    let travel = store.add_category("Travel", "travel", true).await;
    let drafts = store.add_category("Drafts", "drafts", false).await;
    let moscow = store.add_location("Moscow").await;

    Fixture {
        store,
        alice,
        bob,
        travel,
        drafts,
        moscow,
    }
}

pub struct PostSpec<'a> {
    pub author: &'a Profile,
    pub title: &'a str,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category: Option<&'a Category>,
}

impl<'a> PostSpec<'a> {
    /// Published, dated an hour ago, in the given category
    pub fn public(author: &'a Profile, title: &'a str, category: &'a Category) -> Self {
        Self {
            author,
            title,
            pub_date: Utc::now() - Duration::hours(1),
            is_published: true,
            category: Some(category),
        }
    }
}

pub async fn add_post(store: &MemoryStore, spec: PostSpec<'_>) -> Post {
    let new_post = NewPost {
        author_id: spec.author.id,
        title: spec.title.to_string(),
        text: format!("{} body", spec.title),
        pub_date: spec.pub_date,
        category_id: spec.category.map(|category| category.id),
        location_id: None,
        image: None,
    };
    store
        .add_post(new_post, spec.is_published)
        .await
        .expect("author exists")
}

/// `Authorization` header value for a profile
pub fn bearer(profile: &Profile) -> String {
    let claims = Claims {
        sub: profile.id.to_string(),
        username: profile.username.clone(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token encodes");
    format!("Bearer {}", token)
}

pub fn blog_app(
    store: Arc<MemoryStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let store: Arc<dyn BlogStore> = store;
    let renderer: Arc<dyn Renderer> = Arc::new(JsonRenderer);

    App::new()
        .app_data(web::Data::from(store))
        .app_data(web::Data::from(renderer))
        .wrap(PrincipalMiddleware::new(JwtKeys::from_secret(SECRET)))
        .configure(handlers::configure)
}
