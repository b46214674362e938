/// Comment handlers - HTTP endpoints for comment operations
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;

use super::{decode_form, form_errors, redirect, render, Access};
use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentForm, Principal};
use crate::policy::{
    authorize_mutation, require_login, resolve_post_for_viewer, stamp_comment, Decision,
    RedirectTarget,
};
use crate::render::{Renderer, Template};

/// Add a comment to a post the viewer can see
pub async fn add_comment(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    post_id: web::Path<i64>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let author = match require_login(&principal) {
        Ok(identity) => identity,
        Err(target) => return Ok(redirect(&target.with_next(req.path()))),
    };

    let post = resolve_post_for_viewer(store.get_ref(), *post_id, &principal, Utc::now()).await?;

    let form: CommentForm = match decode_form(&body) {
        Ok(form) => form,
        Err(malformed) => {
            return render(
                renderer.get_ref(),
                StatusCode::BAD_REQUEST,
                Template::CommentForm,
                json!({ "form": malformed.submitted, "post": post, "errors": malformed.errors }),
            )
        }
    };
    if let Some(errors) = form_errors(&form) {
        return render(
            renderer.get_ref(),
            StatusCode::BAD_REQUEST,
            Template::CommentForm,
            json!({ "form": form, "post": post, "errors": errors }),
        );
    }

    let comment = store.create_comment(stamp_comment(form, &post, author)).await?;
    tracing::info!(
        comment_id = comment.id,
        post_id = post.id,
        author = %author.username,
        "Comment created"
    );

    Ok(redirect(&RedirectTarget::post_detail(post.id)))
}

/// Prefilled comment form for its author
pub async fn edit_comment_form(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    path: web::Path<(i64, i64)>,
    principal: Principal,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match owned_comment(store.get_ref(), post_id, comment_id, &principal, &req).await? {
        Access::Granted(comment) => comment,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    let form = CommentForm {
        text: comment.text.clone(),
    };
    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::CommentForm,
        json!({ "form": form, "comment": comment }),
    )
}

pub async fn edit_comment(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    path: web::Path<(i64, i64)>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match owned_comment(store.get_ref(), post_id, comment_id, &principal, &req).await? {
        Access::Granted(comment) => comment,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    let form: CommentForm = match decode_form(&body) {
        Ok(form) => form,
        Err(malformed) => {
            return render(
                renderer.get_ref(),
                StatusCode::BAD_REQUEST,
                Template::CommentForm,
                json!({ "form": malformed.submitted, "comment": comment, "errors": malformed.errors }),
            )
        }
    };
    if let Some(errors) = form_errors(&form) {
        return render(
            renderer.get_ref(),
            StatusCode::BAD_REQUEST,
            Template::CommentForm,
            json!({ "form": form, "comment": comment, "errors": errors }),
        );
    }

    let updated = store
        .update_comment(comment.id, &form)
        .await?
        .ok_or_else(|| AppError::not_found(format!("comment {}", comment.id)))?;
    tracing::info!(comment_id = updated.id, "Comment updated");

    Ok(redirect(&RedirectTarget::post_detail(updated.post_id)))
}

/// Delete confirmation page
pub async fn delete_comment_form(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    path: web::Path<(i64, i64)>,
    principal: Principal,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match owned_comment(store.get_ref(), post_id, comment_id, &principal, &req).await? {
        Access::Granted(comment) => comment,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::CommentForm,
        json!({ "comment": comment }),
    )
}

pub async fn delete_comment(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    path: web::Path<(i64, i64)>,
    principal: Principal,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match owned_comment(store.get_ref(), post_id, comment_id, &principal, &req).await? {
        Access::Granted(comment) => comment,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    if !store.delete_comment(comment.id).await? {
        return Err(AppError::not_found(format!("comment {}", comment.id)));
    }
    tracing::info!(comment_id = comment.id, post_id = comment.post_id, "Comment deleted");

    Ok(redirect(&RedirectTarget::post_detail(comment.post_id)))
}

/// Load a comment the viewer is about to change.
///
/// A comment addressed under a post it does not belong to is `NotFound`.
async fn owned_comment(
    store: &dyn BlogStore,
    post_id: i64,
    comment_id: i64,
    principal: &Principal,
    req: &HttpRequest,
) -> Result<Access<Comment>> {
    if let Err(target) = require_login(principal) {
        return Ok(Access::Redirect(target.with_next(req.path())));
    }

    let comment = store
        .find_comment(comment_id)
        .await?
        .filter(|comment| comment.post_id == post_id)
        .ok_or_else(|| AppError::not_found(format!("comment {}", comment_id)))?;

    match authorize_mutation(&comment, principal) {
        Decision::Allow => Ok(Access::Granted(comment)),
        Decision::Deny { redirect } => {
            tracing::debug!(comment_id, post_id, "Comment mutation denied");
            Ok(Access::Redirect(redirect))
        }
    }
}
