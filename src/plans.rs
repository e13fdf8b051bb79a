// src/plans.rs
use std::collections::HashMap;

use actix_web::{HttpResponse, get, web};
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;

use crate::db;
use crate::error::AppError;
use crate::models::PlanFeatureLine;

const PLANS_CACHE_KEY: &str = "pricing_page";

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(pricing);
}

#[get("/plans")]
pub async fn pricing(
    pool: web::Data<PgPool>,
    cache: web::Data<Cache<String, serde_json::Value>>,
) -> Result<HttpResponse, AppError> {
    if let Some(cached) = cache.get(PLANS_CACHE_KEY).await {
        tracing::debug!("Cache hit for key: {}", PLANS_CACHE_KEY);
        return Ok(HttpResponse::Ok().json(cached));
    }

    let plans = db::billing::list_active_plans(&pool).await?;
    let plan_ids: Vec<i64> = plans.iter().map(|p| p.id).collect();
    let mut features: HashMap<i64, Vec<PlanFeatureLine>> = HashMap::new();
    for line in db::billing::feature_lines(&pool, &plan_ids).await? {
        features.entry(line.plan_id).or_default().push(line);
    }
    let faqs = db::billing::list_faqs(&pool).await?;

    let plans: Vec<_> = plans
        .into_iter()
        .map(|plan| {
            let lines = features.remove(&plan.id).unwrap_or_default();
            json!({
                "plan": plan,
                "features": lines,
            })
        })
        .collect();

    let response = json!({
        "active_page": "plan",
        "plans": plans,
        "faqs": faqs,
    });
    cache.insert(PLANS_CACHE_KEY.to_string(), response.clone()).await;
    Ok(HttpResponse::Ok().json(response))
}
