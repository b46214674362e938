use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use super::{render, PageQuery};
use crate::db::BlogStore;
use crate::error::Result;
use crate::policy::list_category_posts;
use crate::render::{Renderer, Template};

/// Public posts of one published category
pub async fn category_posts(
    store: web::Data<dyn BlogStore>,
    renderer: web::Data<dyn Renderer>,
    category_slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (category, page) = list_category_posts(
        store.get_ref(),
        &category_slug,
        Utc::now(),
        query.page.as_deref(),
    )
    .await?;

    render(
        renderer.get_ref(),
        StatusCode::OK,
        Template::Category,
        json!({ "category": category, "page_obj": page }),
    )
}
