// src/db/catalog.rs
use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgPool};

use crate::forms::NewComment;
use crate::models::{Category, Comment, Language, Movie, MovieCard, Tag};
use crate::search::SearchQuery;
use crate::slug::{slugify, slugify_or, unique_slug};

pub async fn trending_movies(pool: &PgPool, limit: i64) -> Result<Vec<Movie>, sqlx::Error> {
    sqlx::query_as::<_, Movie>(
        "SELECT m.* FROM movies m WHERE m.is_trending = TRUE \
         ORDER BY m.release_date DESC NULLS LAST, m.created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn latest_movies(pool: &PgPool, limit: i64) -> Result<Vec<Movie>, sqlx::Error> {
    sqlx::query_as::<_, Movie>(
        "SELECT m.* FROM movies m \
         ORDER BY m.release_date DESC NULLS LAST, m.created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn search_movies(pool: &PgPool, search: &SearchQuery) -> Result<Vec<Movie>, sqlx::Error> {
    let mut qb = search.to_sql();
    qb.build_query_as::<Movie>().fetch_all(pool).await
}

pub async fn get_movie_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Movie>, sqlx::Error> {
    sqlx::query_as::<_, Movie>("SELECT m.* FROM movies m WHERE m.slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// Other movies sharing at least one category with `movie_id`.
pub async fn related_movies(
    pool: &PgPool,
    movie_id: i64,
    limit: i64,
) -> Result<Vec<Movie>, sqlx::Error> {
    sqlx::query_as::<_, Movie>(
        "SELECT m.* FROM movies m \
         WHERE m.id <> $1 AND EXISTS ( \
             SELECT 1 FROM movie_categories mc \
             JOIN movie_categories own ON own.category_id = mc.category_id \
             WHERE mc.movie_id = m.id AND own.movie_id = $1) \
         ORDER BY m.release_date DESC NULLS LAST, m.created_at DESC LIMIT $2",
    )
    .bind(movie_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn list_languages(pool: &PgPool) -> Result<Vec<Language>, sqlx::Error> {
    sqlx::query_as::<_, Language>("SELECT * FROM languages ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Distinct release years, newest first.
pub async fn year_choices(pool: &PgPool) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT DISTINCT release_year FROM movies ORDER BY release_year DESC")
        .fetch_all(pool)
        .await
}

#[derive(FromRow)]
struct TagRow {
    movie_id: i64,
    id: i64,
    name: String,
    slug: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

fn group_tags(rows: Vec<TagRow>) -> HashMap<i64, Vec<Tag>> {
    let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        grouped.entry(row.movie_id).or_default().push(row.into());
    }
    grouped
}

/// Loads categories and languages for every movie in two queries.
pub async fn attach_tags(pool: &PgPool, movies: Vec<Movie>) -> Result<Vec<MovieCard>, sqlx::Error> {
    if movies.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();

    let category_rows = sqlx::query_as::<_, TagRow>(
        "SELECT mc.movie_id, c.id, c.name, c.slug FROM movie_categories mc \
         JOIN categories c ON c.id = mc.category_id \
         WHERE mc.movie_id = ANY($1) ORDER BY c.name",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let language_rows = sqlx::query_as::<_, TagRow>(
        "SELECT ml.movie_id, l.id, l.name, l.slug FROM movie_languages ml \
         JOIN languages l ON l.id = ml.language_id \
         WHERE ml.movie_id = ANY($1) ORDER BY l.name",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut categories = group_tags(category_rows);
    let mut languages = group_tags(language_rows);

    Ok(movies
        .into_iter()
        .map(|movie| MovieCard {
            categories: categories.remove(&movie.id).unwrap_or_default(),
            languages: languages.remove(&movie.id).unwrap_or_default(),
            movie,
        })
        .collect())
}

/// Publicly listed comments, newest first.
pub async fn approved_comments(pool: &PgPool, movie_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE movie_id = $1 AND is_approved = TRUE \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await
}

pub async fn insert_comment(
    pool: &PgPool,
    movie_id: i64,
    comment: &NewComment,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO comments (movie_id, name, body) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(movie_id)
    .bind(&comment.name)
    .bind(&comment.body)
    .fetch_one(pool)
    .await
}

/// Slugs in `table` equal to `base` or of the form `base-N`.
async fn taken_slugs(
    conn: &mut PgConnection,
    table: &'static str,
    base: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT slug FROM {table} WHERE slug = $1 OR slug LIKE $1 || '-%'"
    ))
    .bind(base)
    .fetch_all(&mut *conn)
    .await
}

async fn free_slug(
    conn: &mut PgConnection,
    table: &'static str,
    base: &str,
) -> Result<String, sqlx::Error> {
    let taken = taken_slugs(conn, table, base).await?;
    let slug = unique_slug(base, &taken);
    if slug != base {
        tracing::warn!("Slug {:?} is taken in {}, using {:?}", base, table, slug);
    }
    Ok(slug)
}

/// Returns the id of the category named `name`, inserting it with a
/// derived slug when missing. Names that slugify alike get suffixed slugs.
pub async fn upsert_category(
    conn: &mut PgConnection,
    name: &str,
    description: &str,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let slug = free_slug(conn, "categories", &slugify_or(name, "category")).await?;
    sqlx::query_scalar(
        "INSERT INTO categories (name, slug, description) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .bind(description)
    .fetch_one(&mut *conn)
    .await
}

pub async fn upsert_language(conn: &mut PgConnection, name: &str) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM languages WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let slug = free_slug(conn, "languages", &slugify_or(name, "language")).await?;
    sqlx::query_scalar("INSERT INTO languages (name, slug) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(slug)
        .fetch_one(&mut *conn)
        .await
}

/// Inserts the movie unless one with the same title and release year
/// exists. Returns the new id. A slug already used by another movie gets a
/// numeric suffix.
pub async fn insert_movie(
    conn: &mut PgConnection,
    movie: &crate::seed::MovieSeed,
) -> Result<Option<i64>, sqlx::Error> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM movies WHERE title = $1 AND release_year = $2")
            .bind(&movie.title)
            .bind(movie.release_year)
            .fetch_optional(&mut *conn)
            .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let base = match movie.slug.as_deref().map(slugify) {
        Some(slug) if !slug.is_empty() => slug,
        _ => slugify_or(&movie.title, "movie"),
    };
    let slug = free_slug(conn, "movies", &base).await?;

    sqlx::query_scalar(
        "INSERT INTO movies (title, slug, tagline, description, poster_url, banner_url, \
         release_year, release_date, duration_minutes, rating, imdb_rating, download_url, \
         download_options, server_options, trailer_url, is_trending, is_featured, screenshots, \
         quality) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
         RETURNING id",
    )
    .bind(&movie.title)
    .bind(slug)
    .bind(&movie.tagline)
    .bind(&movie.description)
    .bind(&movie.poster_url)
    .bind(&movie.banner_url)
    .bind(movie.release_year)
    .bind(movie.release_date)
    .bind(movie.duration_minutes)
    .bind(movie.rating)
    .bind(movie.imdb_rating)
    .bind(&movie.download_url)
    .bind(movie.download_options.clone().map(sqlx::types::Json))
    .bind(movie.server_options.clone().map(sqlx::types::Json))
    .bind(&movie.trailer_url)
    .bind(movie.is_trending)
    .bind(movie.is_featured)
    .bind(sqlx::types::Json(movie.screenshots.clone()))
    .bind(movie.quality)
    .fetch_one(&mut *conn)
    .await
    .map(Some)
}

pub async fn link_category(
    conn: &mut PgConnection,
    movie_id: i64,
    category_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO movie_categories (movie_id, category_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(movie_id)
    .bind(category_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn link_language(
    conn: &mut PgConnection,
    movie_id: i64,
    language_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO movie_languages (movie_id, language_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(movie_id)
    .bind(language_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
