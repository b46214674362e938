/// HTTP handlers for blog endpoints
///
/// This module contains handlers for:
/// - Posts: Listing, detail, create, edit and delete
/// - Comments: Add, edit and delete under a post
/// - Categories: Public listing of a published category
/// - Profiles: Author page and self-service profile edit
///
/// Handlers resolve the viewer, ask the policy layer, and hand a template plus
/// context to the configured `Renderer`. Denied mutations become redirects.
pub mod categories;
pub mod comments;
pub mod posts;
pub mod profiles;

pub use categories::category_posts;
pub use comments::{
    add_comment, delete_comment, delete_comment_form, edit_comment, edit_comment_form,
};
pub use posts::{
    create_post, create_post_form, delete_post, delete_post_form, edit_post, edit_post_form,
    index, post_detail,
};
pub use profiles::{edit_profile, edit_profile_form, profile};

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::db::BlogStore;
use crate::error::Result;
use crate::models::PostForm;
use crate::policy::RedirectTarget;
use crate::render::{Renderer, Template};

/// `?page=` query of paginated listings, kept raw for lenient parsing
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Register every blog route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_summary))
        .route("/health/live", web::get().to(liveness_check))
        .route("/", web::get().to(index))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("/create/")
                        .route(web::get().to(create_post_form))
                        .route(web::post().to(create_post)),
                )
                .service(web::resource("/{post_id}/").route(web::get().to(post_detail)))
                .service(
                    web::resource("/{post_id}/edit/")
                        .route(web::get().to(edit_post_form))
                        .route(web::post().to(edit_post)),
                )
                .service(
                    web::resource("/{post_id}/delete/")
                        .route(web::get().to(delete_post_form))
                        .route(web::post().to(delete_post)),
                )
                .service(
                    web::resource("/{post_id}/comment/").route(web::post().to(add_comment)),
                )
                .service(
                    web::resource("/{post_id}/edit_comment/{comment_id}/")
                        .route(web::get().to(edit_comment_form))
                        .route(web::post().to(edit_comment)),
                )
                .service(
                    web::resource("/{post_id}/delete_comment/{comment_id}/")
                        .route(web::get().to(delete_comment_form))
                        .route(web::post().to(delete_comment)),
                ),
        )
        .route("/category/{category_slug}/", web::get().to(category_posts))
        .service(web::resource("/profile/{username}/").route(web::get().to(profile)))
        .service(
            web::resource("/profile/{username}/edit/")
                .route(web::get().to(edit_profile_form))
                .route(web::post().to(edit_profile)),
        );
}

/// Outcome of loading a record for mutation
pub(crate) enum Access<T> {
    Granted(T),
    Redirect(RedirectTarget),
}

pub(crate) fn render(
    renderer: &dyn Renderer,
    status: StatusCode,
    template: Template,
    context: Value,
) -> Result<HttpResponse> {
    let body = renderer.render(template, &context)?;
    Ok(HttpResponse::build(status)
        .content_type(renderer.content_type())
        .body(body))
}

pub(crate) fn redirect(target: &RedirectTarget) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, target.path()))
        .finish()
}

/// A request body that is not a decodable form
pub(crate) struct MalformedForm {
    /// Submitted JSON when the body is JSON at all
    pub submitted: Value,
    pub errors: ValidationErrors,
}

/// Decode a form body. Handlers call this only once the viewer may submit.
pub(crate) fn decode_form<F: DeserializeOwned>(body: &[u8]) -> std::result::Result<F, MalformedForm> {
    serde_json::from_slice(body).map_err(|e| {
        let mut error = ValidationError::new("invalid_body");
        error.message = Some(e.to_string().into());
        let mut errors = ValidationErrors::new();
        errors.add("body", error);

        MalformedForm {
            submitted: serde_json::from_slice(body).unwrap_or(Value::Null),
            errors,
        }
    })
}

/// Field errors of a submitted form, if any
pub(crate) fn form_errors<F: Validate>(form: &F) -> Option<ValidationErrors> {
    form.validate().err()
}

/// Field errors of a post form, including category and location references
/// that do not exist
pub(crate) async fn post_form_errors(
    store: &dyn BlogStore,
    form: &PostForm,
) -> Result<Option<ValidationErrors>> {
    let mut errors = form.validate().err().unwrap_or_else(ValidationErrors::new);

    if let Some(category_id) = form.category {
        if store.find_category(category_id).await?.is_none() {
            errors.add("category", ValidationError::new("does_not_exist"));
        }
    }
    if let Some(location_id) = form.location {
        if store.find_location(location_id).await?.is_none() {
            errors.add("location", ValidationError::new("does_not_exist"));
        }
    }

    Ok((!errors.is_empty()).then_some(errors))
}

async fn health_summary(store: web::Data<dyn BlogStore>) -> HttpResponse {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("Storage check failed: {}", e),
            "service": "blog-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}
