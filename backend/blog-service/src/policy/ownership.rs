/// Ownership policy
///
/// Decides whether a viewer may mutate a record. Denial is never an HTTP
/// error: the viewer is sent to a safe page that exists, either the login
/// page or the public view of the record.
use crate::models::{
    Comment, CommentForm, Identity, NewComment, NewPost, Post, PostForm, Principal,
};
use serde::Serialize;

/// Named pages a denied or finished request is sent to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RedirectTarget {
    Index,
    PostDetail { post_id: i64 },
    Profile { username: String },
    Login { next: Option<String> },
}

impl RedirectTarget {
    pub fn post_detail(post_id: i64) -> Self {
        RedirectTarget::PostDetail { post_id }
    }

    pub fn profile(username: impl Into<String>) -> Self {
        RedirectTarget::Profile {
            username: username.into(),
        }
    }

    pub fn login() -> Self {
        RedirectTarget::Login { next: None }
    }

    /// Remember where a login redirect should come back to
    pub fn with_next(self, path: &str) -> Self {
        match self {
            RedirectTarget::Login { .. } => RedirectTarget::Login {
                next: Some(path.to_string()),
            },
            other => other,
        }
    }

    pub fn path(&self) -> String {
        match self {
            RedirectTarget::Index => "/".to_string(),
            RedirectTarget::PostDetail { post_id } => format!("/posts/{}/", post_id),
            RedirectTarget::Profile { username } => {
                format!("/profile/{}/", urlencoding::encode(username))
            }
            RedirectTarget::Login { next: None } => "/auth/login/".to_string(),
            RedirectTarget::Login { next: Some(next) } => {
                format!("/auth/login/?next={}", urlencoding::encode(next))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { redirect: RedirectTarget },
}

/// Records with a single owning author
pub trait Authored {
    fn author_id(&self) -> i64;

    /// Public page a non-owner is sent back to
    fn public_view(&self) -> RedirectTarget;
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.author.id
    }

    fn public_view(&self) -> RedirectTarget {
        RedirectTarget::post_detail(self.id)
    }
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author.id
    }

    fn public_view(&self) -> RedirectTarget {
        RedirectTarget::post_detail(self.post_id)
    }
}

/// The authenticated identity, or a redirect to login
pub fn require_login(viewer: &Principal) -> Result<&Identity, RedirectTarget> {
    viewer.identity().ok_or_else(RedirectTarget::login)
}

pub fn authorize_mutation<R: Authored + ?Sized>(record: &R, viewer: &Principal) -> Decision {
    let identity = match require_login(viewer) {
        Ok(identity) => identity,
        Err(redirect) => return Decision::Deny { redirect },
    };

    if identity.id == record.author_id() {
        Decision::Allow
    } else {
        Decision::Deny {
            redirect: record.public_view(),
        }
    }
}

/// Profile edits match on username against the path, and a mismatch goes to
/// the requested profile rather than the viewer's own.
pub fn authorize_profile_edit(target_username: &str, viewer: &Principal) -> Decision {
    let identity = match require_login(viewer) {
        Ok(identity) => identity,
        Err(redirect) => return Decision::Deny { redirect },
    };

    if identity.username == target_username {
        Decision::Allow
    } else {
        Decision::Deny {
            redirect: RedirectTarget::profile(target_username),
        }
    }
}

/// Build a post owned by the current principal
pub fn stamp_post(form: PostForm, author: &Identity) -> NewPost {
    NewPost {
        author_id: author.id,
        title: form.title,
        text: form.text,
        pub_date: form.pub_date,
        category_id: form.category,
        location_id: form.location,
        image: form.image,
    }
}

/// Build a comment owned by the current principal on the given post
pub fn stamp_comment(form: CommentForm, post: &Post, author: &Identity) -> NewComment {
    NewComment {
        post_id: post.id,
        author_id: author.id,
        text: form.text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorRef;
    use chrono::Utc;

    fn identity(id: i64, username: &str) -> Identity {
        Identity {
            id,
            username: username.to_string(),
        }
    }

    fn post(id: i64, author: &Identity) -> Post {
        Post {
            id,
            title: "title".into(),
            text: "text".into(),
            image: None,
            pub_date: Utc::now(),
            is_published: true,
            created_at: Utc::now(),
            author: AuthorRef {
                id: author.id,
                username: author.username.clone(),
            },
            category: None,
            location: None,
        }
    }

    fn comment(id: i64, post_id: i64, author: &Identity) -> Comment {
        Comment {
            id,
            text: "nice".into(),
            created_at: Utc::now(),
            post_id,
            author: AuthorRef {
                id: author.id,
                username: author.username.clone(),
            },
        }
    }

    #[test]
    fn test_anonymous_is_sent_to_login() {
        let alice = identity(1, "alice");
        let decision = authorize_mutation(&post(3, &alice), &Principal::Anonymous);
        assert_eq!(
            decision,
            Decision::Deny {
                redirect: RedirectTarget::login()
            }
        );
    }

    #[test]
    fn test_author_is_allowed() {
        let alice = identity(1, "alice");
        let viewer = Principal::from(alice.clone());
        assert_eq!(authorize_mutation(&post(3, &alice), &viewer), Decision::Allow);
        assert_eq!(
            authorize_mutation(&comment(5, 3, &alice), &viewer),
            Decision::Allow
        );
    }

    #[test]
    fn test_non_author_post_edit_goes_to_detail() {
        let alice = identity(1, "alice");
        let bob = Principal::from(identity(2, "bob"));
        assert_eq!(
            authorize_mutation(&post(3, &alice), &bob),
            Decision::Deny {
                redirect: RedirectTarget::post_detail(3)
            }
        );
    }

    #[test]
    fn test_non_author_comment_delete_goes_to_post_detail() {
        let u1 = identity(1, "u1");
        let u2 = Principal::from(identity(2, "u2"));
        let decision = authorize_mutation(&comment(10, 3, &u1), &u2);
        assert_eq!(
            decision,
            Decision::Deny {
                redirect: RedirectTarget::post_detail(3)
            }
        );
    }

    #[test]
    fn test_profile_edit_by_other_user_goes_to_target_profile() {
        let bob = Principal::from(identity(2, "bob"));
        assert_eq!(
            authorize_profile_edit("alice", &bob),
            Decision::Deny {
                redirect: RedirectTarget::profile("alice")
            }
        );
    }

    #[test]
    fn test_profile_edit_rules() {
        let alice = Principal::from(identity(1, "alice"));
        assert_eq!(authorize_profile_edit("alice", &alice), Decision::Allow);
        assert_eq!(
            authorize_profile_edit("alice", &Principal::Anonymous),
            Decision::Deny {
                redirect: RedirectTarget::login()
            }
        );
        // Exact match only
        assert_ne!(authorize_profile_edit("Alice", &alice), Decision::Allow);
    }

    #[test]
    fn test_redirect_paths() {
        assert_eq!(RedirectTarget::Index.path(), "/");
        assert_eq!(RedirectTarget::post_detail(3).path(), "/posts/3/");
        assert_eq!(RedirectTarget::profile("alice").path(), "/profile/alice/");
        assert_eq!(RedirectTarget::login().path(), "/auth/login/");
        assert_eq!(
            RedirectTarget::login().with_next("/posts/3/edit/").path(),
            "/auth/login/?next=%2Fposts%2F3%2Fedit%2F"
        );
        assert_eq!(
            RedirectTarget::Index.with_next("/ignored/"),
            RedirectTarget::Index
        );
    }

    #[test]
    fn test_stamping_uses_principal() {
        let alice = identity(1, "alice");
        let form = PostForm {
            title: "t".into(),
            text: "x".into(),
            pub_date: Utc::now(),
            category: Some(4),
            location: None,
            image: None,
        };
        let new_post = stamp_post(form, &alice);
        assert_eq!(new_post.author_id, 1);
        assert_eq!(new_post.category_id, Some(4));

        let target = post(9, &identity(2, "bob"));
        let new_comment = stamp_comment(CommentForm { text: "hi".into() }, &target, &alice);
        assert_eq!(new_comment.author_id, 1);
        assert_eq!(new_comment.post_id, 9);
    }
}
