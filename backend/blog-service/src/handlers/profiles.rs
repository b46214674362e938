/// Profile handlers - author pages and self-service edit
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;

use super::{decode_form, form_errors, redirect, render, PageQuery};
use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::models::{Principal, ProfileForm};
use crate::policy::{authorize_profile_edit, list_profile_posts, Decision, RedirectTarget};
use crate::render::{Renderer, Template};

/// Profile page with the posts the viewer may see
pub async fn profile(
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    username: web::Path<String>,
    principal: Principal,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let profile = store
        .find_profile(&username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("profile {}", username)))?;

    let page = list_profile_posts(
        store.get_ref(),
        &profile,
        &principal,
        Utc::now(),
        query.page.as_deref(),
    )
    .await?;

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::Profile,
        json!({ "profile": profile, "page_obj": page }),
    )
}

pub async fn edit_profile_form(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    username: web::Path<String>,
    principal: Principal,
) -> Result<HttpResponse> {
    if let Decision::Deny { redirect: target } = authorize_profile_edit(&username, &principal) {
        tracing::debug!(profile = %username, "Profile edit denied");
        return Ok(redirect(&target.with_next(req.path())));
    }

    let profile = store
        .find_profile(&username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("profile {}", username)))?;

    let form = ProfileForm {
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        email: (!profile.email.is_empty()).then(|| profile.email.clone()),
    };
    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::ProfileForm,
        json!({ "form": form, "profile": profile }),
    )
}

pub async fn edit_profile(
    req: HttpRequest,
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    username: web::Path<String>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse> {
    if let Decision::Deny { redirect: target } = authorize_profile_edit(&username, &principal) {
        tracing::debug!(profile = %username, "Profile edit denied");
        return Ok(redirect(&target.with_next(req.path())));
    }

    let form: ProfileForm = match decode_form(&body) {
        Ok(form) => form,
        Err(malformed) => {
            return render(
                renderer.get_ref(),
                StatusCode::BAD_REQUEST,
                Template::ProfileForm,
                json!({ "form": malformed.submitted, "errors": malformed.errors }),
            )
        }
    };
    if let Some(errors) = form_errors(&form) {
        return render(
            renderer.get_ref(),
            StatusCode::BAD_REQUEST,
            Template::ProfileForm,
            json!({ "form": form, "errors": errors }),
        );
    }

    let profile = store
        .update_profile(&username, &form)
        .await?
        .ok_or_else(|| AppError::not_found(format!("profile {}", username)))?;
    tracing::info!(profile = %profile.username, "Profile updated");

    Ok(redirect(&RedirectTarget::profile(profile.username)))
}
