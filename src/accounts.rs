// src/accounts.rs
use actix_web::{HttpResponse, get, post, web};
use bcrypt::{DEFAULT_COST, hash};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::auth::{self, AuthUser};
use crate::billing::{self, BillingState, PlanChange};
use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::forms::{
    FavoriteRemoveForm, ProfileForm, SettingsAction, SettingsForm, SubscriptionAction,
    SubscriptionForm, invalid_choice,
};
use crate::http::{redirect, redirect_with_cookie};
use crate::models::{Profile, Subscription, User};

const SETTINGS_PATH: &str = "/account/settings";
const SUBSCRIPTION_PATH: &str = "/account/subscription";
const FAVORITES_PATH: &str = "/account/favorites";

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/account")
            .service(profile_page)
            .service(update_profile)
            .service(settings_page)
            .service(update_settings)
            .service(subscription_page)
            .service(update_subscription)
            .service(download_history)
            .service(favorites)
            .service(remove_favorite),
    );
}

/// Loads the user with its profile and subscription, creating the latter
/// two for accounts that predate them.
async fn load_account(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(User, Profile, Subscription), AppError> {
    // A valid token for a deleted account is treated as signed out.
    let user = db::accounts::get_user_by_id(pool, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let profile = db::accounts::ensure_profile(pool, user_id).await?;
    let subscription = db::accounts::ensure_subscription(pool, user_id).await?;

    if !BillingState::from_subscription(&subscription).matches_profile(&profile) {
        tracing::warn!("Profile and subscription plan state differ for user {}", user_id);
    }
    Ok((user, profile, subscription))
}

/// Applies `change` to the user's plan state and writes the result to both
/// the profile and the subscription. Runs on the caller's transaction.
pub async fn apply_plan_change(
    conn: &mut PgConnection,
    user_id: Uuid,
    change: PlanChange,
    today: NaiveDate,
) -> Result<BillingState, AppError> {
    db::accounts::ensure_profile(&mut *conn, user_id).await?;
    let subscription = db::accounts::ensure_subscription(&mut *conn, user_id).await?;

    let current = BillingState::from_subscription(&subscription);
    let next = current.apply(change, today)?;
    db::billing::write_billing_state(conn, user_id, &next).await?;
    Ok(next)
}

async fn require_active_plan(
    pool: &PgPool,
    field: &'static str,
    plan_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(plan_id) = plan_id {
        if db::billing::get_active_plan(pool, plan_id).await?.is_none() {
            return Err(AppError::field(field, invalid_choice()));
        }
    }
    Ok(())
}

#[get("/profile")]
pub async fn profile_page(
    pool: web::Data<PgPool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let (user, profile, subscription) = load_account(&pool, user.id).await?;
    let plans = db::billing::list_active_plans(&pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "active_page": "profile",
        "user": user,
        "profile": profile,
        "subscription": subscription,
        "plans": plans,
    })))
}

#[post("/profile")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    user: AuthUser,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse, AppError> {
    let update = form.validate()?;

    if db::accounts::email_taken(&pool, &update.email, Some(user.id)).await? {
        return Err(AppError::field(
            "email",
            "Another user with this email already exists.",
        ));
    }
    require_active_plan(&pool, "current_plan", update.current_plan).await?;

    let mut tx = pool.begin().await?;
    db::accounts::ensure_profile(&mut *tx, user.id).await?;
    if let Err(e) = db::accounts::update_profile(&mut tx, user.id, &update).await {
        if db::is_unique_violation(&e) {
            return Err(AppError::field(
                "email",
                "Another user with this email already exists.",
            ));
        }
        return Err(e.into());
    }
    let state = apply_plan_change(
        &mut tx,
        user.id,
        PlanChange::from_selection(update.current_plan),
        Utc::now().date_naive(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "Profile updated for user {} (plan {:?}, status {:?})",
        user.id,
        state.plan_id,
        state.status
    );
    Ok(redirect(auth::PROFILE_PATH))
}

#[get("/settings")]
pub async fn settings_page(
    pool: web::Data<PgPool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let user = db::accounts::get_user_by_id(&pool, user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(json!({
        "active_page": "settings",
        "user": user,
        "actions": ["change_password", "delete_account"],
    })))
}

#[post("/settings")]
pub async fn update_settings(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: AuthUser,
    form: web::Form<SettingsForm>,
) -> Result<HttpResponse, AppError> {
    match form.action()? {
        SettingsAction::ChangePassword => {
            let new_password = form.validate_password_change()?;
            let account = db::accounts::get_user_by_id(&pool, user.id)
                .await?
                .ok_or(AppError::Unauthorized)?;

            if !auth::check_password(&form.old_password, &account.password_hash)? {
                return Err(AppError::field(
                    "old_password",
                    "Your old password was entered incorrectly. Please enter it again.",
                ));
            }

            let password_hash = hash(&new_password, DEFAULT_COST)?;
            db::accounts::update_password(&pool, user.id, &password_hash).await?;
            tracing::info!("Password changed for user {}", user.id);
            auth::sign_in(&config, user.id, SETTINGS_PATH)
        }
        SettingsAction::DeleteAccount => {
            form.validate_account_delete()?;
            if db::accounts::delete_user(&pool, user.id).await? {
                tracing::info!("Account {} deleted", user.id);
            } else {
                tracing::warn!("Account {} was already gone", user.id);
            }
            Ok(redirect_with_cookie("/", auth::removal_cookie()))
        }
    }
}

#[get("/subscription")]
pub async fn subscription_page(
    pool: web::Data<PgPool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let (_, _, subscription) = load_account(&pool, user.id).await?;
    let plan = match subscription.plan_id {
        Some(plan_id) => db::billing::get_plan(pool.get_ref(), plan_id).await?,
        None => None,
    };
    let price = billing::effective_price(&subscription, plan.as_ref());
    let plans = db::billing::list_active_plans(&pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "active_page": "subscription",
        "subscription": subscription,
        "plan": plan,
        "price": price,
        "plans": plans,
    })))
}

#[post("/subscription")]
pub async fn update_subscription(
    pool: web::Data<PgPool>,
    user: AuthUser,
    form: web::Form<SubscriptionForm>,
) -> Result<HttpResponse, AppError> {
    let change = match form.validate()? {
        SubscriptionAction::Change(plan_id) => {
            require_active_plan(&pool, "plan", plan_id).await?;
            PlanChange::from_selection(plan_id)
        }
        SubscriptionAction::Cancel => PlanChange::Cancel,
    };

    let mut tx = pool.begin().await?;
    let state = apply_plan_change(&mut tx, user.id, change, Utc::now().date_naive()).await?;
    tx.commit().await?;

    tracing::info!(
        "Subscription {:?} for user {} -> plan {:?}, status {:?}, renews {:?}",
        change,
        user.id,
        state.plan_id,
        state.status,
        state.renewal_date
    );
    Ok(redirect(SUBSCRIPTION_PATH))
}

#[get("/downloads")]
pub async fn download_history(
    pool: web::Data<PgPool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let downloads = db::accounts::list_downloads(&pool, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "active_page": "download_history",
        "downloads": downloads,
    })))
}

#[get("/favorites")]
pub async fn favorites(
    pool: web::Data<PgPool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let favorites = db::accounts::list_favorites(&pool, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "active_page": "favorites",
        "favorites": favorites,
    })))
}

#[post("/favorites/remove")]
pub async fn remove_favorite(
    pool: web::Data<PgPool>,
    user: AuthUser,
    form: web::Form<FavoriteRemoveForm>,
) -> Result<HttpResponse, AppError> {
    let movie_id = form.movie_id()?;
    if db::accounts::remove_favorite(&pool, user.id, movie_id).await? {
        tracing::info!("User {} removed movie {} from favorites", user.id, movie_id);
    }
    Ok(redirect(FAVORITES_PATH))
}
