// src/billing.rs
//! Plan state shared by a user's profile and subscription records.
//!
//! Both records carry the same plan status and renewal date. Every write
//! path computes one [`BillingState`] here and persists it to both rows in
//! the same transaction (see `db::billing::write_billing_state`).

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{Plan, PlanStatus, Profile, Subscription};

pub const RENEWAL_PERIOD_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanChange {
    Select(i64),
    Clear,
    Cancel,
}

impl PlanChange {
    /// A submitted plan field: a plan id selects it, nothing clears.
    pub fn from_selection(plan_id: Option<i64>) -> Self {
        match plan_id {
            Some(id) => PlanChange::Select(id),
            None => PlanChange::Clear,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BillingState {
    pub plan_id: Option<i64>,
    pub status: PlanStatus,
    pub renewal_date: Option<NaiveDate>,
}

impl Default for BillingState {
    fn default() -> Self {
        Self {
            plan_id: None,
            status: PlanStatus::Inactive,
            renewal_date: None,
        }
    }
}

impl BillingState {
    pub fn from_subscription(subscription: &Subscription) -> Self {
        Self {
            plan_id: subscription.plan_id,
            status: subscription.status,
            renewal_date: subscription.renewal_date,
        }
    }

    /// True when the profile row carries the same state.
    pub fn matches_profile(&self, profile: &Profile) -> bool {
        profile.current_plan_id == self.plan_id
            && profile.plan_status == self.status
            && profile.plan_renewal_date == self.renewal_date
    }

    /// The state after `change` on `today`.
    ///
    /// Selecting a plan activates it until `today` plus
    /// [`RENEWAL_PERIOD_DAYS`]. Selecting the plan that is already active
    /// changes nothing, so the existing renewal date is kept rather than
    /// pushed out; a cancelled plan selected again starts a new period.
    /// Cancelling keeps the plan reference and drops the renewal date.
    pub fn apply(&self, change: PlanChange, today: NaiveDate) -> Result<BillingState, AppError> {
        match change {
            PlanChange::Select(plan_id) => {
                if self.status == PlanStatus::Active && self.plan_id == Some(plan_id) {
                    return Ok(*self);
                }
                Ok(BillingState {
                    plan_id: Some(plan_id),
                    status: PlanStatus::Active,
                    renewal_date: Some(today + Duration::days(RENEWAL_PERIOD_DAYS)),
                })
            }
            PlanChange::Clear => Ok(BillingState::default()),
            PlanChange::Cancel => match self.status {
                PlanStatus::Active => Ok(BillingState {
                    plan_id: self.plan_id,
                    status: PlanStatus::Cancelled,
                    renewal_date: None,
                }),
                PlanStatus::Cancelled => Ok(*self),
                PlanStatus::Inactive => Err(AppError::BadRequest(
                    "There is no active subscription to cancel.".to_string(),
                )),
            },
        }
    }
}

/// Promotional override first, then the plan's list price.
pub fn effective_price(subscription: &Subscription, plan: Option<&Plan>) -> Option<Decimal> {
    subscription
        .price_override
        .or_else(|| plan.map(|p| p.price))
}
