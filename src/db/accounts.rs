// src/db/accounts.rs
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::forms::ProfileUpdate;
use crate::models::{DownloadEntry, FavoriteEntry, Profile, Quality, Subscription, User};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, created_at";

pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Looks a user up by email or username, ignoring case.
pub async fn get_user_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($1) \
         ORDER BY created_at LIMIT 1"
    ))
    .bind(login.trim())
    .fetch_optional(pool)
    .await
}

pub async fn email_taken(
    pool: &PgPool,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users \
         WHERE (LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($1)) \
         AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(exclude)
    .fetch_one(pool)
    .await
}

/// Inserts the user together with its default profile and inactive
/// subscription.
pub async fn create_account(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, username, email, first_name, last_name, password_hash, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO subscriptions (user_id) VALUES ($1)")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Returns the user's profile, creating the default row when missing.
pub async fn ensure_profile(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = profiles.user_id \
         RETURNING *",
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Returns the user's subscription, creating the inactive row when missing.
pub async fn ensure_subscription(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "INSERT INTO subscriptions (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = subscriptions.user_id \
         RETURNING *",
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Saves identity and profile fields; plan state goes through
/// `db::billing::write_billing_state`.
pub async fn update_profile(
    conn: &mut PgConnection,
    user_id: Uuid,
    update: &ProfileUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET first_name = $2, last_name = $3, email = $4, username = $4 WHERE id = $1",
    )
    .bind(user_id)
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.email)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "UPDATE profiles SET phone_number = $2, bio = $3, email_notifications = $4, \
         sms_notifications = $5, promo_notifications = $6, updated_at = NOW() \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(&update.phone_number)
    .bind(&update.bio)
    .bind(update.email_notifications)
    .bind(update.sms_notifications)
    .bind(update.promo_notifications)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Removes the user; owned rows go with it through `ON DELETE CASCADE`.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_downloads(pool: &PgPool, user_id: Uuid) -> Result<Vec<DownloadEntry>, sqlx::Error> {
    sqlx::query_as::<_, DownloadEntry>(
        "SELECT d.id, d.movie_id, m.title, m.slug, m.poster_url, d.quality, d.downloaded_at \
         FROM download_history d JOIN movies m ON m.id = d.movie_id \
         WHERE d.user_id = $1 ORDER BY d.downloaded_at DESC, d.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn record_download(
    pool: &PgPool,
    user_id: Uuid,
    movie_id: i64,
    quality: Option<Quality>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO download_history (user_id, movie_id, quality) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(movie_id)
        .bind(quality)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_favorites(pool: &PgPool, user_id: Uuid) -> Result<Vec<FavoriteEntry>, sqlx::Error> {
    sqlx::query_as::<_, FavoriteEntry>(
        "SELECT f.id, f.movie_id, m.title, m.slug, m.poster_url, m.release_year, f.created_at \
         FROM favorite_movies f JOIN movies m ON m.id = f.movie_id \
         WHERE f.user_id = $1 ORDER BY f.created_at DESC, f.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Returns whether a new favorite was stored.
pub async fn add_favorite(pool: &PgPool, user_id: Uuid, movie_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO favorite_movies (user_id, movie_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, movie_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(movie_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns whether a favorite was removed; a missing pair is not an error.
pub async fn remove_favorite(
    pool: &PgPool,
    user_id: Uuid,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorite_movies WHERE user_id = $1 AND movie_id = $2")
        .bind(user_id)
        .bind(movie_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
