/// Visibility policy
///
/// Decides which posts a viewer may read. The public predicate is: published,
/// in a published category (or none), and `pub_date` not in the future.
/// Authors see their own posts regardless.
use crate::db::{BlogStore, PostQuery};
use crate::error::{AppError, Result};
use crate::models::{Category, Comment, Post, Principal, Profile};
use crate::pagination::{Page, PageWindow, POSTS_PER_PAGE};
use chrono::{DateTime, Utc};

pub fn is_publicly_visible(post: &Post, now: DateTime<Utc>) -> bool {
    post.is_published
        && post
            .category
            .as_ref()
            .map_or(true, |category| category.is_published)
        && post.pub_date <= now
}

/// Resolve a post for one viewer.
///
/// The author gets the post whatever its state. Everyone else goes through a
/// second lookup with the public predicate, and a hidden post fails exactly
/// like a missing one.
pub async fn resolve_post_for_viewer(
    store: &dyn BlogStore,
    post_id: i64,
    viewer: &Principal,
    now: DateTime<Utc>,
) -> Result<Post> {
    let post = store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

    if viewer.is(post.author.id) {
        return Ok(post);
    }

    store
        .find_visible_post(post_id, now)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
}

/// Optional narrowing of the public listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostScope {
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
}

pub async fn list_public_posts(
    store: &dyn BlogStore,
    now: DateTime<Utc>,
    scope: PostScope,
    page: Option<&str>,
) -> Result<Page<Post>> {
    let query = PostQuery {
        visible_at: Some(now),
        category_id: scope.category_id,
        author_id: scope.author_id,
    };
    paginate(store, &query, page).await
}

/// Posts on a profile page: everything for the owner, public posts for others
pub async fn list_profile_posts(
    store: &dyn BlogStore,
    profile: &Profile,
    viewer: &Principal,
    now: DateTime<Utc>,
    page: Option<&str>,
) -> Result<Page<Post>> {
    if viewer.is(profile.id) {
        let query = PostQuery::all().by_author(profile.id);
        return paginate(store, &query, page).await;
    }

    let scope = PostScope {
        author_id: Some(profile.id),
        ..Default::default()
    };
    list_public_posts(store, now, scope, page).await
}

/// Public posts of a published category
pub async fn list_category_posts(
    store: &dyn BlogStore,
    category_slug: &str,
    now: DateTime<Utc>,
    page: Option<&str>,
) -> Result<(Category, Page<Post>)> {
    let category = store
        .find_category_by_slug(category_slug)
        .await?
        .filter(|category| category.is_published)
        .ok_or_else(|| AppError::not_found(format!("category {}", category_slug)))?;

    let scope = PostScope {
        category_id: Some(category.id),
        ..Default::default()
    };
    let posts = list_public_posts(store, now, scope, page).await?;
    Ok((category, posts))
}

/// Comments of a post the viewer has already been allowed to see.
///
/// Comments have no visibility of their own.
pub async fn list_post_comments(store: &dyn BlogStore, post: &Post) -> Result<Vec<Comment>> {
    store.list_comments(post.id).await
}

async fn paginate(
    store: &dyn BlogStore,
    query: &PostQuery,
    page: Option<&str>,
) -> Result<Page<Post>> {
    let count = store.count_posts(query).await?;
    let window = PageWindow::resolve(page, count, POSTS_PER_PAGE);
    let posts = store
        .list_posts(query, window.limit(), window.offset())
        .await?;

    Ok(Page::new(posts, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Identity, NewPost};
    use chrono::{Duration, TimeZone};

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    fn viewer(profile: &Profile) -> Principal {
        Identity {
            id: profile.id,
            username: profile.username.clone(),
        }
        .into()
    }

    fn new_post(author_id: i64, pub_date: DateTime<Utc>, category_id: Option<i64>) -> NewPost {
        NewPost {
            author_id,
            title: "title".into(),
            text: "text".into(),
            pub_date,
            category_id,
            location_id: None,
            image: None,
        }
    }

    async fn seeded() -> (MemoryStore, Profile, Profile) {
        let store = MemoryStore::new();
        let author = store.add_profile("author").await;
        let other = store.add_profile("other").await;
        (store, author, other)
    }

    #[tokio::test]
    async fn test_unpublished_post_never_publicly_visible() {
        let (store, author, _) = seeded().await;
        let post = store
            .add_post(new_post(author.id, at(2020), None), false)
            .await
            .unwrap();

        for year in [1990, 2020, 2024, 2100] {
            assert!(!is_publicly_visible(&post, at(year)));
        }
    }

    #[tokio::test]
    async fn test_unpublished_category_hides_post() {
        let (store, author, _) = seeded().await;
        let hidden = store.add_category("Hidden", "hidden", false).await;
        let post = store
            .add_post(new_post(author.id, at(2020), Some(hidden.id)), true)
            .await
            .unwrap();

        assert!(!is_publicly_visible(&post, at(2024)));
    }

    #[tokio::test]
    async fn test_public_post_visible_to_anonymous() {
        let (store, author, _) = seeded().await;
        let post = store
            .add_post(new_post(author.id, at(2020), None), true)
            .await
            .unwrap();

        let resolved = resolve_post_for_viewer(&store, post.id, &Principal::Anonymous, at(2024))
            .await
            .unwrap();
        assert_eq!(resolved.id, post.id);

        let page = list_public_posts(&store, at(2024), PostScope::default(), None)
            .await
            .unwrap();
        assert_eq!(page.object_list, vec![post]);
    }

    #[tokio::test]
    async fn test_future_post_hidden_from_non_authors() {
        let (store, author, other) = seeded().await;
        let post = store
            .add_post(new_post(author.id, at(2030), None), true)
            .await
            .unwrap();

        for viewer in [Principal::Anonymous, viewer(&other)] {
            let result = resolve_post_for_viewer(&store, post.id, &viewer, at(2024)).await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }

        let page = list_public_posts(&store, at(2024), PostScope::default(), None)
            .await
            .unwrap();
        assert!(page.object_list.is_empty());
    }

    #[tokio::test]
    async fn test_author_resolves_own_hidden_posts() {
        let (store, author, _) = seeded().await;
        let hidden = store.add_category("Hidden", "hidden", false).await;
        let drafts = [
            store.add_post(new_post(author.id, at(2030), None), true).await,
            store.add_post(new_post(author.id, at(2020), None), false).await,
            store
                .add_post(new_post(author.id, at(2020), Some(hidden.id)), true)
                .await,
        ];

        for draft in drafts {
            let draft = draft.unwrap();
            let resolved = resolve_post_for_viewer(&store, draft.id, &viewer(&author), at(2024))
                .await
                .unwrap();
            assert_eq!(resolved, draft);
        }
    }

    #[tokio::test]
    async fn test_missing_and_hidden_posts_fail_alike() {
        let (store, author, _) = seeded().await;
        let hidden = store
            .add_post(new_post(author.id, at(2020), None), false)
            .await
            .unwrap();

        let missing = resolve_post_for_viewer(&store, 999, &Principal::Anonymous, at(2024))
            .await
            .unwrap_err();
        let not_visible = resolve_post_for_viewer(&store, hidden.id, &Principal::Anonymous, at(2024))
            .await
            .unwrap_err();

        assert!(matches!(missing, AppError::NotFound(_)));
        assert!(matches!(not_visible, AppError::NotFound(_)));
        assert_eq!(missing.template(), not_visible.template());
    }

    #[tokio::test]
    async fn test_unpublished_category_listing_not_found() {
        let (store, author, _) = seeded().await;
        let category = store.add_category("News", "news", false).await;
        store
            .add_post(new_post(author.id, at(2020), Some(category.id)), true)
            .await
            .unwrap();

        let result = list_category_posts(&store, "news", at(2024), None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = list_category_posts(&store, "no-such-slug", at(2024), None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_category_listing_scopes_posts() {
        let (store, author, _) = seeded().await;
        let news = store.add_category("News", "news", true).await;
        let sport = store.add_category("Sport", "sport", true).await;
        let in_news = store
            .add_post(new_post(author.id, at(2020), Some(news.id)), true)
            .await
            .unwrap();
        store
            .add_post(new_post(author.id, at(2020), Some(sport.id)), true)
            .await
            .unwrap();
        store
            .add_post(new_post(author.id, at(2021), Some(news.id)), false)
            .await
            .unwrap();

        let (category, page) = list_category_posts(&store, "news", at(2024), None)
            .await
            .unwrap();
        assert_eq!(category, news);
        assert_eq!(page.object_list, vec![in_news]);
    }

    #[tokio::test]
    async fn test_profile_owner_sees_all_own_posts() {
        let (store, author, other) = seeded().await;
        store
            .add_post(new_post(author.id, at(2020), None), true)
            .await
            .unwrap();
        store
            .add_post(new_post(author.id, at(2020), None), false)
            .await
            .unwrap();
        store
            .add_post(new_post(author.id, at(2030), None), true)
            .await
            .unwrap();
        store
            .add_post(new_post(other.id, at(2020), None), true)
            .await
            .unwrap();

        let own = list_profile_posts(&store, &author, &viewer(&author), at(2024), None)
            .await
            .unwrap();
        assert_eq!(own.count, 3);
        assert_eq!(own.object_list[0].pub_date, at(2030));

        let public = list_profile_posts(&store, &author, &viewer(&other), at(2024), None)
            .await
            .unwrap();
        assert_eq!(public.count, 1);

        let anonymous = list_profile_posts(&store, &author, &Principal::Anonymous, at(2024), None)
            .await
            .unwrap();
        assert_eq!(anonymous.object_list, public.object_list);
    }

    #[tokio::test]
    async fn test_public_listing_pages_of_ten() {
        let (store, author, _) = seeded().await;
        for day in 0..25 {
            store
                .add_post(new_post(author.id, at(2020) + Duration::days(day), None), true)
                .await
                .unwrap();
        }

        let first = list_public_posts(&store, at(2024), PostScope::default(), None)
            .await
            .unwrap();
        assert_eq!(first.object_list.len(), 10);
        assert_eq!(first.num_pages, 3);
        assert_eq!(first.object_list[0].pub_date, at(2020) + Duration::days(24));

        let last = list_public_posts(&store, at(2024), PostScope::default(), Some("3"))
            .await
            .unwrap();
        assert_eq!(last.object_list.len(), 5);
        assert!(!last.has_next);
    }

    #[tokio::test]
    async fn test_public_listing_is_idempotent() {
        let (store, author, other) = seeded().await;
        for (profile, year) in [(&author, 2020), (&other, 2021), (&author, 2021), (&other, 2019)] {
            store
                .add_post(new_post(profile.id, at(year), None), true)
                .await
                .unwrap();
        }

        let first = list_public_posts(&store, at(2024), PostScope::default(), None)
            .await
            .unwrap();
        let second = list_public_posts(&store, at(2024), PostScope::default(), None)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_comments_follow_post_access() {
        let (store, author, other) = seeded().await;
        let post = store
            .add_post(new_post(author.id, at(2020), None), true)
            .await
            .unwrap();
        store
            .create_comment(crate::models::NewComment {
                post_id: post.id,
                author_id: other.id,
                text: "first".into(),
            })
            .await
            .unwrap();

        let visible = resolve_post_for_viewer(&store, post.id, &Principal::Anonymous, at(2024))
            .await
            .unwrap();
        let comments = list_post_comments(&store, &visible).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author.username, "other");
    }
}
