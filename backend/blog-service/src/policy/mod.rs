/// Access policies for blog records
///
/// - `visibility`: which posts, comments and listings a viewer may read
/// - `ownership`: who may change a record and where everyone else is sent
///
/// Both take the viewer as an explicit `Principal`; handlers compose them.
pub mod ownership;
pub mod visibility;

pub use ownership::{
    authorize_mutation, authorize_profile_edit, require_login, stamp_comment, stamp_post,
    Authored, Decision, RedirectTarget,
};
pub use visibility::{
    is_publicly_visible, list_category_posts, list_post_comments, list_profile_posts,
    list_public_posts, resolve_post_for_viewer, PostScope,
};
