use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::PlanInterval;
use crate::error::PaywallError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan_id: String,
    pub plan_name: String,
    pub price: f64,
    pub currency: String,
    pub interval: PlanInterval,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_method: String,
    pub auto_renew: bool,
}

/// Free-tier usage of one feature inside the current rolling window.
/// A counter whose window has elapsed reads as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounter {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEntry {
    pub feature: String,
    pub remind_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub subscription: Option<Subscription>,
    #[serde(default)]
    pub usage: HashMap<String, UsageCounter>,
    #[serde(default)]
    pub reminders: Vec<ReminderEntry>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub premium_since: Option<DateTime<Utc>>,
    /// Optimistic-concurrency token; bumped by every successful save.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserPayload {
    pub email: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, payload: CreateUserPayload) -> Result<UserRecord, PaywallError>;
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, PaywallError>;
    /// Conditional write keyed on `user.version`. Fails with `Conflict` when
    /// the stored record has moved on since the read; returns the record with
    /// the bumped version on success.
    async fn save_user(&self, user: &UserRecord) -> Result<UserRecord, PaywallError>;
}
