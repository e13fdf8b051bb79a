// src/auth.rs
use std::future::{Ready, ready};

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponse, get, post, web};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::forms::{LoginForm, SignUpForm};
use crate::http::{redirect, redirect_with_cookie};
use crate::models::{Claims, User};

pub const SESSION_COOKIE: &str = "cinehub_session";
pub const PROFILE_PATH: &str = "/account/profile";
pub const LOGIN_PATH: &str = "/login";

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(signup_page);
    cfg.service(signup);
    cfg.service(login_page);
    cfg.service(login);
    cfg.service(logout);
}

/// The signed-in user, taken from the session cookie or a bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(get_user_id_from_request(req).map(|id| AuthUser { id }).ok_or(AppError::Unauthorized))
    }
}

pub fn get_user_id_from_request(req: &HttpRequest) -> Option<Uuid> {
    let config = req.app_data::<web::Data<Config>>()?;
    let token = session_token(req)?;
    decode_token(&config.jwt_secret, &token)
}

fn session_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    bearer.or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
}

pub fn issue_token(config: &Config, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(config.session_ttl_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
}

pub fn decode_token(secret: &str, token: &str) -> Option<Uuid> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .ok()?;
    Uuid::parse_str(&data.claims.sub).ok()
}

pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(config.session_ttl_hours))
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Checks `password` against a stored bcrypt hash. A hash that cannot be
/// parsed is an error, not a mismatch.
pub fn check_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    Ok(verify(password, password_hash)?)
}

/// Starts a session for `user_id` and sends the browser to `location`.
pub fn sign_in(config: &Config, user_id: Uuid, location: &str) -> Result<HttpResponse, AppError> {
    let token = issue_token(config, user_id)?;
    Ok(redirect_with_cookie(location, session_cookie(config, token)))
}

#[get("/signup")]
pub async fn signup_page(user: Option<AuthUser>) -> HttpResponse {
    if user.is_some() {
        return redirect(PROFILE_PATH);
    }
    HttpResponse::Ok().json(json!({
        "active_page": "signup",
        "fields": ["full_name", "email", "password1", "password2", "accept_terms"],
    }))
}

#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    form: web::Form<SignUpForm>,
) -> Result<HttpResponse, AppError> {
    let account = form.validate()?;

    if db::accounts::email_taken(&pool, &account.email, None).await? {
        return Err(AppError::field("email", "A user with this email already exists."));
    }

    let new_user = User {
        id: Uuid::new_v4(),
        username: account.email.clone(),
        email: account.email,
        first_name: account.first_name,
        last_name: account.last_name,
        password_hash: hash(&account.password, DEFAULT_COST)?,
        created_at: Utc::now(),
    };

    match db::accounts::create_account(&pool, &new_user).await {
        Ok(()) => {}
        Err(e) if db::is_unique_violation(&e) => {
            return Err(AppError::field("email", "A user with this email already exists."));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!("User {} signed up", new_user.id);
    sign_in(&config, new_user.id, PROFILE_PATH)
}

#[get("/login")]
pub async fn login_page(user: Option<AuthUser>) -> HttpResponse {
    if user.is_some() {
        return redirect(PROFILE_PATH);
    }
    HttpResponse::Ok().json(json!({
        "active_page": "login",
        "fields": ["username", "password"],
        "labels": {"username": "Email or Username"},
    }))
}

#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;

    let Some(user) = db::accounts::get_user_by_login(&pool, &form.username).await? else {
        return Err(invalid_credentials());
    };
    if !check_password(&form.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    tracing::info!("User {} logged in", user.id);
    sign_in(&config, user.id, form.safe_next().unwrap_or(PROFILE_PATH))
}

fn invalid_credentials() -> AppError {
    AppError::field(
        "__all__",
        "Please enter a correct email and password. Note that both fields may be case-sensitive.",
    )
}

#[post("/logout")]
pub async fn logout() -> HttpResponse {
    redirect_with_cookie(LOGIN_PATH, removal_cookie())
}
