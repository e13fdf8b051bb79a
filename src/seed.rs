// src/seed.rs
//! Startup loader for a JSON catalog document.
//!
//! Loading is idempotent: rows that already exist (by name, title, slug or
//! question) are left alone, so the same file can be applied on every boot.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use crate::db;
use crate::models::{DownloadOption, Quality, ServerOption};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("database error while seeding: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
    pub languages: Vec<String>,
    pub movies: Vec<MovieSeed>,
    pub plans: Vec<PlanSeed>,
    pub faqs: Vec<FaqSeed>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CategorySeed {
    pub name: String,
    pub description: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct MovieSeed {
    pub title: String,
    pub slug: Option<String>,
    pub tagline: String,
    pub description: String,
    pub poster_url: String,
    pub banner_url: String,
    pub release_year: i32,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: i32,
    pub rating: Option<Decimal>,
    pub imdb_rating: Option<Decimal>,
    pub download_url: String,
    pub download_options: Option<Vec<DownloadOption>>,
    pub server_options: Option<Vec<ServerOption>>,
    pub trailer_url: String,
    pub is_trending: bool,
    pub is_featured: bool,
    pub screenshots: Vec<String>,
    pub quality: Option<Quality>,
    /// Category names.
    pub categories: Vec<String>,
    /// Language names.
    pub languages: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct PlanSeed {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub price: Decimal,
    #[serde(default = "default_billing_period")]
    pub billing_period: String,
    #[serde(default)]
    pub badge_text: String,
    #[serde(default = "default_button_text")]
    pub button_text: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub features: Vec<FeatureSeed>,
}

#[derive(Deserialize, Debug)]
pub struct FeatureSeed {
    pub name: String,
    #[serde(default = "default_true")]
    pub included: bool,
}

#[derive(Deserialize, Debug)]
pub struct FaqSeed {
    pub question: String,
    pub answer: String,
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_billing_period() -> String {
    "/month".to_string()
}

fn default_button_text() -> String {
    "Choose Plan".to_string()
}

fn default_true() -> bool {
    true
}

pub fn parse(document: &str) -> Result<CatalogSeed, SeedError> {
    Ok(serde_json::from_str(document)?)
}

pub async fn load(pool: &PgPool, path: impl AsRef<Path>) -> Result<(), SeedError> {
    let path = path.as_ref();
    let document = tokio::fs::read_to_string(path).await?;
    let seed = parse(&document)?;
    apply(pool, &seed).await?;
    tracing::info!(
        "Applied seed file {}: {} movies, {} plans",
        path.display(),
        seed.movies.len(),
        seed.plans.len()
    );
    Ok(())
}

pub async fn apply(pool: &PgPool, seed: &CatalogSeed) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for category in &seed.categories {
        db::catalog::upsert_category(&mut tx, &category.name, &category.description).await?;
    }
    for language in &seed.languages {
        db::catalog::upsert_language(&mut tx, language).await?;
    }

    for movie in &seed.movies {
        let Some(movie_id) = db::catalog::insert_movie(&mut tx, movie).await? else {
            tracing::debug!("Movie {:?} already present, skipping", movie.title);
            continue;
        };
        for name in &movie.categories {
            let category_id = db::catalog::upsert_category(&mut tx, name, "").await?;
            db::catalog::link_category(&mut tx, movie_id, category_id).await?;
        }
        for name in &movie.languages {
            let language_id = db::catalog::upsert_language(&mut tx, name).await?;
            db::catalog::link_language(&mut tx, movie_id, language_id).await?;
        }
    }

    for plan in &seed.plans {
        let plan_id = db::billing::upsert_plan(&mut tx, plan).await?;
        for (order, feature) in plan.features.iter().enumerate() {
            db::billing::assign_feature(&mut tx, plan_id, &feature.name, feature.included, order as i32)
                .await?;
        }
    }

    for (order, faq) in seed.faqs.iter().enumerate() {
        db::billing::insert_faq(&mut tx, &faq.question, &faq.answer, order as i32).await?;
    }

    tx.commit().await
}
