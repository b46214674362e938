use crate::models::{Profile, ProfileForm};
use sqlx::PgPool;

/// Find a profile by its public username
pub async fn find_profile_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, username, first_name, last_name, email, date_joined
        FROM profiles
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Update the display fields of a profile
pub async fn update_profile(
    pool: &PgPool,
    username: &str,
    form: &ProfileForm,
) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles
        SET first_name = $2, last_name = $3, email = $4
        WHERE username = $1
        RETURNING id, username, first_name, last_name, email, date_joined
        "#,
    )
    .bind(username)
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(form.email.as_deref().unwrap_or_default())
    .fetch_optional(pool)
    .await
}
