// src/db/billing.rs
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::billing::BillingState;
use crate::models::{Faq, Plan, PlanFeatureLine};

/// Plans offered for selection, in display order.
pub async fn list_active_plans(pool: &PgPool) -> Result<Vec<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE is_active = TRUE ORDER BY display_order, price, id",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_plan(db: impl PgExecutor<'_>, plan_id: i64) -> Result<Option<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(plan_id)
        .fetch_optional(db)
        .await
}

pub async fn get_active_plan(
    db: impl PgExecutor<'_>,
    plan_id: i64,
) -> Result<Option<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 AND is_active = TRUE")
        .bind(plan_id)
        .fetch_optional(db)
        .await
}

pub async fn feature_lines(
    pool: &PgPool,
    plan_ids: &[i64],
) -> Result<Vec<PlanFeatureLine>, sqlx::Error> {
    sqlx::query_as::<_, PlanFeatureLine>(
        "SELECT a.plan_id, a.feature_id, f.name, a.is_included, a.display_order \
         FROM plan_feature_assignments a JOIN plan_features f ON f.id = a.feature_id \
         WHERE a.plan_id = ANY($1) ORDER BY a.plan_id, a.display_order, a.id",
    )
    .bind(plan_ids)
    .fetch_all(pool)
    .await
}

pub async fn list_faqs(pool: &PgPool) -> Result<Vec<Faq>, sqlx::Error> {
    sqlx::query_as::<_, Faq>("SELECT * FROM faqs ORDER BY display_order, id")
        .fetch_all(pool)
        .await
}

/// Writes one plan state to both the profile and the subscription row.
/// Callers run this inside the transaction that touched either record.
pub async fn write_billing_state(
    conn: &mut PgConnection,
    user_id: Uuid,
    state: &BillingState,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE profiles SET current_plan_id = $2, plan_status = $3, plan_renewal_date = $4, \
         updated_at = NOW() WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(state.plan_id)
    .bind(state.status)
    .bind(state.renewal_date)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "UPDATE subscriptions SET plan_id = $2, status = $3, renewal_date = $4, \
         updated_at = NOW() WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(state.plan_id)
    .bind(state.status)
    .bind(state.renewal_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn upsert_plan(
    conn: &mut PgConnection,
    plan: &crate::seed::PlanSeed,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM plans WHERE title = $1")
        .bind(&plan.title)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    sqlx::query_scalar(
        "INSERT INTO plans (title, subtitle, currency, price, billing_period, badge_text, \
         button_text, is_active, is_recommended, display_order) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(&plan.title)
    .bind(&plan.subtitle)
    .bind(&plan.currency)
    .bind(plan.price)
    .bind(&plan.billing_period)
    .bind(&plan.badge_text)
    .bind(&plan.button_text)
    .bind(plan.is_active)
    .bind(plan.is_recommended)
    .bind(plan.display_order)
    .fetch_one(&mut *conn)
    .await
}

pub async fn assign_feature(
    conn: &mut PgConnection,
    plan_id: i64,
    feature_name: &str,
    is_included: bool,
    display_order: i32,
) -> Result<(), sqlx::Error> {
    let feature_id: i64 = sqlx::query_scalar(
        "INSERT INTO plan_features (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(feature_name)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO plan_feature_assignments (plan_id, feature_id, is_included, display_order) \
         VALUES ($1, $2, $3, $4) ON CONFLICT (plan_id, feature_id) DO NOTHING",
    )
    .bind(plan_id)
    .bind(feature_id)
    .bind(is_included)
    .bind(display_order)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn insert_faq(
    conn: &mut PgConnection,
    question: &str,
    answer: &str,
    display_order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO faqs (question, answer, display_order) VALUES ($1, $2, $3) \
         ON CONFLICT (question) DO NOTHING",
    )
    .bind(question)
    .bind(answer)
    .bind(display_order)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
