/// Post handlers - listing, detail and author-only mutations
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;

use super::{decode_form, post_form_errors, redirect, render, Access, PageQuery};
use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::models::{CommentForm, Identity, Post, PostForm, Principal};
use crate::policy::{
    authorize_mutation, list_post_comments, list_public_posts, require_login,
    resolve_post_for_viewer, stamp_post, Decision, PostScope, RedirectTarget,
};
use crate::render::{Renderer, Template};

/// Public post feed
pub async fn index(
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = list_public_posts(
        store.get_ref(),
        Utc::now(),
        PostScope::default(),
        query.page.as_deref(),
    )
    .await?;

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::Index,
        json!({ "page_obj": page }),
    )
}

/// Single post with its comments
pub async fn post_detail(
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    post_id: web::Path<i64>,
    principal: Principal,
) -> Result<HttpResponse> {
    let post = resolve_post_for_viewer(store.get_ref(), *post_id, &principal, Utc::now()).await?;
    let comments = list_post_comments(store.get_ref(), &post).await?;

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::PostDetail,
        json!({
            "post": post,
            "comments": comments,
            "form": CommentForm { text: String::new() },
        }),
    )
}

/// Empty post form
pub async fn create_post_form(
    req: HttpRequest,
    renderer: web::Data<dyn Renderer>,
    principal: Principal,
) -> Result<HttpResponse> {
    if let Err(target) = require_login(&principal) {
        return Ok(redirect(&target.with_next(req.path())));
    }

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::PostForm,
        json!({ "form": null }),
    )
}

/// Create a post owned by the viewer
pub async fn create_post(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let author = match require_login(&principal) {
        Ok(identity) => identity,
        Err(target) => return Ok(redirect(&target.with_next(req.path()))),
    };

    let form: PostForm = match decode_form(&body) {
        Ok(form) => form,
        Err(malformed) => {
            return render(
                renderer.get_ref(),
                StatusCode::BAD_REQUEST,
                Template::PostForm,
                json!({ "form": malformed.submitted, "errors": malformed.errors }),
            )
        }
    };
    if let Some(errors) = post_form_errors(store.get_ref(), &form).await? {
        return render(
            renderer.get_ref(),
            StatusCode::BAD_REQUEST,
            Template::PostForm,
            json!({ "form": form, "errors": errors }),
        );
    }

    let post = store.create_post(stamp_post(form, author)).await?;
    tracing::info!(post_id = post.id, author = %author.username, "Post created");

    Ok(redirect(&RedirectTarget::profile(&author.username)))
}

/// Prefilled post form for the author
pub async fn edit_post_form(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    post_id: web::Path<i64>,
    principal: Principal,
) -> Result<HttpResponse> {
    let post = match owned_post(store.get_ref(), *post_id, &principal, &req).await? {
        Access::Granted((post, _)) => post,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    let form = PostForm {
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date,
        category: post.category.as_ref().map(|category| category.id),
        location: post.location.as_ref().map(|location| location.id),
        image: post.image.clone(),
    };

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::PostForm,
        json!({ "form": form, "post": post }),
    )
}

pub async fn edit_post(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    post_id: web::Path<i64>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let post = match owned_post(store.get_ref(), *post_id, &principal, &req).await? {
        Access::Granted((post, _)) => post,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    let form: PostForm = match decode_form(&body) {
        Ok(form) => form,
        Err(malformed) => {
            return render(
                renderer.get_ref(),
                StatusCode::BAD_REQUEST,
                Template::PostForm,
                json!({ "form": malformed.submitted, "post": post, "errors": malformed.errors }),
            )
        }
    };
    if let Some(errors) = post_form_errors(store.get_ref(), &form).await? {
        return render(
            renderer.get_ref(),
            StatusCode::BAD_REQUEST,
            Template::PostForm,
            json!({ "form": form, "post": post, "errors": errors }),
        );
    }

    let updated = store
        .update_post(post.id, &form)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post.id)))?;
    tracing::info!(post_id = updated.id, "Post updated");

    Ok(redirect(&RedirectTarget::post_detail(updated.id)))
}

/// Delete confirmation page
pub async fn delete_post_form(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    post_id: web::Path<i64>,
    principal: Principal,
) -> Result<HttpResponse> {
    let post = match owned_post(store.get_ref(), *post_id, &principal, &req).await? {
        Access::Granted((post, _)) => post,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::PostConfirmDelete,
        json!({ "post": post }),
    )
}

/// Delete a post and, with it, its comments
pub async fn delete_post(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    post_id: web::Path<i64>,
    principal: Principal,
) -> Result<HttpResponse> {
    let (post, author) = match owned_post(store.get_ref(), *post_id, &principal, &req).await? {
        Access::Granted(owned) => owned,
        Access::Redirect(target) => return Ok(redirect(&target)),
    };

    if !store.delete_post(post.id).await? {
        return Err(AppError::not_found(format!("post {}", post.id)));
    }
    tracing::info!(post_id = post.id, author = %author.username, "Post deleted");

    Ok(redirect(&RedirectTarget::Index))
}

/// Load a post the viewer is about to change.
///
/// Anonymous viewers are sent to login before the post is looked up. A
/// missing post is `NotFound`; someone else's post redirects to its detail
/// page.
async fn owned_post(
    store: &dyn BlogStore,
    post_id: i64,
    principal: &Principal,
    req: &HttpRequest,
) -> Result<Access<(Post, Identity)>> {
    let identity = match require_login(principal) {
        Ok(identity) => identity.clone(),
        Err(target) => return Ok(Access::Redirect(target.with_next(req.path()))),
    };

    let post = store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

    match authorize_mutation(&post, principal) {
        Decision::Allow => Ok(Access::Granted((post, identity))),
        Decision::Deny { redirect } => {
            tracing::debug!(post_id, viewer = %identity.username, "Post mutation denied");
            Ok(Access::Redirect(redirect))
        }
    }
}
