/// Rendering backend
///
/// Handlers never build markup themselves. They hand a template identifier and
/// a context mapping to a `Renderer`, which returns the response body.
use crate::error::{AppError, Result};
use serde_json::Value;

/// Templates the blog views render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Index,
    PostDetail,
    Category,
    PostForm,
    PostConfirmDelete,
    CommentForm,
    Profile,
    ProfileForm,
    NotFound,
    ServerError,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::Index => "blog/index.html",
            Template::PostDetail => "blog/detail.html",
            Template::Category => "blog/category.html",
            Template::PostForm => "blog/create.html",
            Template::PostConfirmDelete => "blog/post_confirm_delete.html",
            Template::CommentForm => "blog/comment.html",
            Template::Profile => "blog/profile.html",
            Template::ProfileForm => "blog/user_form.html",
            Template::NotFound => "pages/404.html",
            Template::ServerError => "pages/500.html",
        }
    }
}

pub trait Renderer: Send + Sync {
    fn render(&self, template: Template, context: &Value) -> Result<Vec<u8>>;

    fn content_type(&self) -> &'static str;
}

/// Emits `{"template": ..., "context": ...}` as JSON.
///
/// Used when no HTML frontend is attached; API clients consume the context
/// directly.
#[derive(Debug, Default, Clone)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, template: Template, context: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(&serde_json::json!({
            "template": template.name(),
            "context": context,
        }))
        .map_err(|e| AppError::Render(format!("{}: {}", template.name(), e)))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_renderer_wraps_context() {
        let body = JsonRenderer
            .render(Template::Index, &serde_json::json!({"page_obj": []}))
            .unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["template"], "blog/index.html");
        assert_eq!(value["context"]["page_obj"], serde_json::json!([]));
    }

    #[test]
    fn test_error_page_names() {
        assert_eq!(Template::NotFound.name(), "pages/404.html");
        assert_eq!(Template::ServerError.name(), "pages/500.html");
    }
}
