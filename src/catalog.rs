// src/catalog.rs
use actix_web::{HttpResponse, get, post, web};
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::forms::{CommentForm, DownloadForm};
use crate::http::redirect;
use crate::models::{Movie, Quality};
use crate::search::{SearchQuery, SortKey};

const TRENDING_LIMIT: i64 = 8;
const LATEST_LIMIT: i64 = 12;
const RELATED_LIMIT: i64 = 8;
const FACETS_CACHE_KEY: &str = "search_facets";

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);
    cfg.service(search);
    cfg.service(movie_detail);
    cfg.service(post_comment);
    cfg.service(download_page);
    cfg.service(record_download);
    cfg.service(add_favorite);
}

async fn find_movie(pool: &PgPool, slug: &str) -> Result<Movie, AppError> {
    db::catalog::get_movie_by_slug(pool, slug)
        .await?
        .ok_or(AppError::NotFound("Movie"))
}

#[get("/")]
pub async fn home(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let languages = db::catalog::list_languages(&pool).await?;
    let trending = db::catalog::trending_movies(&pool, TRENDING_LIMIT).await?;
    let latest = db::catalog::latest_movies(&pool, LATEST_LIMIT).await?;

    Ok(HttpResponse::Ok().json(json!({
        "active_page": "home",
        "languages": languages,
        "trending_movies": db::catalog::attach_tags(&pool, trending).await?,
        "latest_movies": db::catalog::attach_tags(&pool, latest).await?,
    })))
}

/// Categories, languages, qualities, years and sort options for the
/// search sidebar. They change only when the catalog is edited.
async fn search_facets(
    pool: &PgPool,
    cache: &Cache<String, serde_json::Value>,
) -> Result<serde_json::Value, AppError> {
    if let Some(cached) = cache.get(FACETS_CACHE_KEY).await {
        tracing::debug!("Cache hit for key: {}", FACETS_CACHE_KEY);
        return Ok(cached);
    }

    let categories = db::catalog::list_categories(pool).await?;
    let languages = db::catalog::list_languages(pool).await?;
    let years = db::catalog::year_choices(pool).await?;
    let qualities: Vec<_> = Quality::ALL
        .iter()
        .map(|q| json!({"code": q.code(), "label": q.label()}))
        .collect();
    let sort_options: Vec<_> = SortKey::ALL
        .iter()
        .map(|s| json!({"key": s.as_str(), "label": s.label()}))
        .collect();

    let facets = json!({
        "categories": categories,
        "languages": languages,
        "quality_choices": qualities,
        "year_choices": years,
        "sort_options": sort_options,
    });
    cache.insert(FACETS_CACHE_KEY.to_string(), facets.clone()).await;
    Ok(facets)
}

#[get("/search")]
pub async fn search(
    pool: web::Data<PgPool>,
    cache: web::Data<Cache<String, serde_json::Value>>,
    params: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let query = SearchQuery::from_pairs(&params);
    let movies = db::catalog::search_movies(&pool, &query).await?;
    let movies = db::catalog::attach_tags(&pool, movies).await?;
    let facets = search_facets(&pool, &cache).await?;

    Ok(HttpResponse::Ok().json(json!({
        "active_page": "search",
        "active": query,
        "count": movies.len(),
        "movies": movies,
        "facets": facets,
    })))
}

#[get("/movies/{slug}")]
pub async fn movie_detail(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let movie = find_movie(&pool, &path).await?;
    let related = db::catalog::related_movies(&pool, movie.id, RELATED_LIMIT).await?;
    let comments = db::catalog::approved_comments(&pool, movie.id).await?;

    let mut cards = db::catalog::attach_tags(&pool, vec![movie]).await?;
    let movie = cards.pop().ok_or(AppError::NotFound("Movie"))?;

    Ok(HttpResponse::Ok().json(json!({
        "active_page": "details",
        "movie": movie,
        "related_movies": db::catalog::attach_tags(&pool, related).await?,
        "comments": comments,
    })))
}

#[post("/movies/{slug}")]
pub async fn post_comment(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, AppError> {
    let movie = find_movie(&pool, &path).await?;
    let comment = form.validate()?;

    let comment_id = db::catalog::insert_comment(&pool, movie.id, &comment).await?;
    tracing::info!("Comment {} posted on {}", comment_id, movie.slug);
    Ok(redirect(&format!("{}#comments", movie.absolute_url())))
}

#[get("/movies/{slug}/download")]
pub async fn download_page(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let movie = find_movie(&pool, &path).await?;
    let quality_options = movie.resolved_download_options();
    let server_options = movie.resolved_server_options();
    let download_url = movie.resolved_download_url();

    let mut cards = db::catalog::attach_tags(&pool, vec![movie]).await?;
    let movie = cards.pop().ok_or(AppError::NotFound("Movie"))?;

    Ok(HttpResponse::Ok().json(json!({
        "active_page": "download",
        "movie": movie,
        "download_url": download_url,
        "quality_options": quality_options,
        "server_options": server_options,
    })))
}

#[post("/movies/{slug}/download")]
pub async fn record_download(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<String>,
    form: web::Form<DownloadForm>,
) -> Result<HttpResponse, AppError> {
    let quality = match form.quality.trim() {
        "" => None,
        code => Some(
            Quality::from_code(code)
                .ok_or_else(|| AppError::field("quality", crate::forms::invalid_choice()))?,
        ),
    };
    let movie = find_movie(&pool, &path).await?;

    db::accounts::record_download(&pool, user.id, movie.id, quality.or(movie.quality)).await?;
    tracing::info!("User {} downloaded {}", user.id, movie.slug);
    Ok(redirect(&movie.resolved_download_url()))
}

#[post("/movies/{slug}/favorite")]
pub async fn add_favorite(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let movie = find_movie(&pool, &path).await?;
    if db::accounts::add_favorite(&pool, user.id, movie.id).await? {
        tracing::info!("User {} added {} to favorites", user.id, movie.slug);
    }
    Ok(redirect("/account/favorites"))
}
