// src/lib.rs
use std::time::Duration;

use actix_web::web;
use moka::future::Cache;

pub mod accounts;
pub mod auth;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod http;
pub mod models;
pub mod plans;
pub mod search;
pub mod seed;
pub mod slug;

/// Shared cache for read-mostly public pages.
pub type PageCache = Cache<String, serde_json::Value>;

pub fn build_cache(config: &config::Config) -> PageCache {
    Cache::builder()
        .max_capacity(config.cache_capacity)
        .time_to_live(Duration::from_secs(config.cache_ttl_secs))
        .build()
}

/// Registers every route of the application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::init_routes)
        .configure(accounts::init_routes)
        .configure(plans::init_routes)
        .configure(catalog::init_routes);
}
