use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::{Catalogs, GatedFeature, Plan};
use crate::error::PaywallError;
use crate::users::{ReminderEntry, Subscription, UserRecord};

pub const DEFAULT_REMIND_HOURS: i64 = 24;
pub const MAX_REMIND_HOURS: i64 = 168;

#[derive(Debug, Clone)]
pub struct EvaluatorPolicy {
    /// Rolling window after which a free-tier usage counter reads as zero.
    pub usage_window_hours: i64,
}

impl Default for EvaluatorPolicy {
    fn default() -> Self {
        Self {
            usage_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResult {
    pub has_access: bool,
    pub reason: String,
    pub feature: GatedFeature,
    pub is_premium: bool,
    pub current_usage: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureLimitRow {
    pub feature: String,
    pub name: String,
    pub description: String,
    pub free_limit: u32,
    pub premium_benefit: String,
    pub current_usage: u32,
    pub has_access: bool,
    pub is_premium: bool,
}

#[derive(Debug, Clone)]
pub enum UpgradeOptions {
    AlreadyPremium {
        subscription: Subscription,
    },
    Available {
        plans: Vec<Plan>,
        features: Vec<GatedFeature>,
        usage: HashMap<String, u32>,
    },
}

/// Decides whether a user may use a gated feature right now, and applies the
/// few paywall state transitions (upgrade, remind-later, usage increment).
///
/// Catalogs and policy are injected; the evaluator itself keeps no state and
/// performs no I/O. Callers read the user record, call in, and persist.
#[derive(Debug, Clone)]
pub struct Evaluator {
    catalogs: Catalogs,
    policy: EvaluatorPolicy,
}

impl Evaluator {
    pub fn new(catalogs: Catalogs, policy: EvaluatorPolicy) -> Self {
        Self { catalogs, policy }
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Premium means an active subscription that has not yet run out.
    /// The upstream app never compared `end_date` to now, so a lapsed
    /// subscription kept granting access until some external job flipped
    /// `is_active`; here the end date is authoritative.
    pub fn is_premium(&self, user: &UserRecord, now: DateTime<Utc>) -> bool {
        user.subscription
            .as_ref()
            .is_some_and(|s| s.is_active && now < s.end_date)
    }

    /// Free-tier usage inside the current window. An elapsed window reads
    /// as zero ("5 Likes pro Tag" actually resets daily here).
    pub fn usage_count(&self, user: &UserRecord, feature_id: &str, now: DateTime<Utc>) -> u32 {
        let window = Duration::hours(self.policy.usage_window_hours);
        match user.usage.get(feature_id) {
            Some(counter) if now - counter.window_start < window => counter.count,
            _ => 0,
        }
    }

    pub fn check_access(
        &self,
        user: &UserRecord,
        feature_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessResult, PaywallError> {
        let feature = self
            .catalogs
            .features
            .get(feature_id)
            .ok_or_else(|| PaywallError::UnknownFeature(feature_id.to_string()))?;

        let is_premium = self.is_premium(user, now);
        let current_usage = self.usage_count(user, feature_id, now);

        let (has_access, reason) = if is_premium {
            (true, "premium active".to_string())
        } else if current_usage < feature.free_limit {
            (
                true,
                format!(
                    "within free allowance ({}/{})",
                    current_usage, feature.free_limit
                ),
            )
        } else {
            (
                false,
                format!(
                    "free allowance exhausted ({}/{})",
                    feature.free_limit, feature.free_limit
                ),
            )
        };

        Ok(AccessResult {
            has_access,
            reason,
            feature: feature.clone(),
            is_premium,
            current_usage,
        })
    }

    pub fn upgrade_options(&self, user: &UserRecord, now: DateTime<Utc>) -> UpgradeOptions {
        if self.is_premium(user, now) {
            // is_premium implies the subscription is present
            if let Some(subscription) = user.subscription.clone() {
                return UpgradeOptions::AlreadyPremium { subscription };
            }
        }

        let usage = self
            .catalogs
            .features
            .iter()
            .map(|f| (f.id.clone(), self.usage_count(user, &f.id, now)))
            .collect();

        UpgradeOptions::Available {
            plans: self.catalogs.plans.iter().cloned().collect(),
            features: self.catalogs.features.iter().cloned().collect(),
            usage,
        }
    }

    /// Simulated purchase: validates the plan, then assigns the subscription
    /// directly. No payment provider is involved; the payment method string
    /// is stored verbatim.
    pub fn apply_upgrade(
        &self,
        user: &mut UserRecord,
        plan_id: &str,
        payment_method: &str,
        now: DateTime<Utc>,
    ) -> Result<Subscription, PaywallError> {
        let plan = self
            .catalogs
            .plans
            .get(plan_id)
            .ok_or_else(|| PaywallError::InvalidPlan(plan_id.to_string()))?;

        let subscription = Subscription {
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            price: plan.price,
            currency: plan.currency.clone(),
            interval: plan.interval,
            is_active: true,
            start_date: now,
            end_date: now + Duration::days(plan.interval.days()),
            payment_method: payment_method.to_string(),
            auto_renew: true,
        };

        user.subscription = Some(subscription.clone());
        user.is_premium = true;
        user.premium_since = Some(now);

        Ok(subscription)
    }

    /// Appends a "remind me later" entry. The list is append-only; nothing
    /// in this slice consumes or prunes it.
    pub fn schedule_reminder(
        &self,
        user: &mut UserRecord,
        feature_id: &str,
        remind_in_hours: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<ReminderEntry, PaywallError> {
        if self.catalogs.features.get(feature_id).is_none() {
            return Err(PaywallError::UnknownFeature(feature_id.to_string()));
        }

        let hours = remind_in_hours.unwrap_or(DEFAULT_REMIND_HOURS);
        if !(1..=MAX_REMIND_HOURS).contains(&hours) {
            return Err(PaywallError::Validation(format!(
                "remindInHours must be between 1 and {}, got {}",
                MAX_REMIND_HOURS, hours
            )));
        }

        let entry = ReminderEntry {
            feature: feature_id.to_string(),
            remind_at: now + Duration::hours(hours),
            created_at: now,
        };
        user.reminders.push(entry.clone());

        Ok(entry)
    }

    /// One row per catalog entry, same access rule as `check_access`.
    pub fn feature_limits(&self, user: &UserRecord, now: DateTime<Utc>) -> Vec<FeatureLimitRow> {
        let is_premium = self.is_premium(user, now);
        self.catalogs
            .features
            .iter()
            .map(|f| {
                let current_usage = self.usage_count(user, &f.id, now);
                FeatureLimitRow {
                    feature: f.id.clone(),
                    name: f.name.clone(),
                    description: f.description.clone(),
                    free_limit: f.free_limit,
                    premium_benefit: f.premium_benefit.clone(),
                    current_usage,
                    has_access: is_premium || current_usage < f.free_limit,
                    is_premium,
                }
            })
            .collect()
    }

    /// Records one use of a feature against the current window, restarting
    /// the window when it has elapsed. Returns the new count.
    pub fn record_usage(
        &self,
        user: &mut UserRecord,
        feature_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, PaywallError> {
        if self.catalogs.features.get(feature_id).is_none() {
            return Err(PaywallError::UnknownFeature(feature_id.to_string()));
        }

        let window = Duration::hours(self.policy.usage_window_hours);
        let counter = user
            .usage
            .entry(feature_id.to_string())
            .or_insert(crate::users::UsageCounter {
                count: 0,
                window_start: now,
            });
        if now - counter.window_start >= window {
            counter.count = 0;
            counter.window_start = now;
        }
        counter.count += 1;

        Ok(counter.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlanInterval;
    use crate::users::UsageCounter;

    fn evaluator() -> Evaluator {
        Evaluator::new(Catalogs::builtin(), EvaluatorPolicy::default())
    }

    fn free_user() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: "u1".into(),
            email: "anna@example.de".into(),
            subscription: None,
            usage: HashMap::new(),
            reminders: Vec::new(),
            is_premium: false,
            premium_since: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn with_usage(mut user: UserRecord, feature: &str, count: u32, now: DateTime<Utc>) -> UserRecord {
        user.usage.insert(
            feature.into(),
            UsageCounter {
                count,
                window_start: now,
            },
        );
        user
    }

    #[test]
    fn free_user_within_allowance_has_access() {
        let ev = evaluator();
        let now = Utc::now();
        let user = with_usage(free_user(), "unlimited_likes", 4, now);

        let res = ev.check_access(&user, "unlimited_likes", now).unwrap();
        assert!(res.has_access);
        assert!(!res.is_premium);
        assert_eq!(res.current_usage, 4);
        assert_eq!(res.reason, "within free allowance (4/5)");
    }

    #[test]
    fn free_user_at_limit_is_denied() {
        let ev = evaluator();
        let now = Utc::now();
        let user = with_usage(free_user(), "unlimited_likes", 5, now);

        let res = ev.check_access(&user, "unlimited_likes", now).unwrap();
        assert!(!res.has_access);
        assert_eq!(res.current_usage, 5);
        assert_eq!(res.reason, "free allowance exhausted (5/5)");
    }

    #[test]
    fn zero_limit_feature_never_accessible_for_free_users() {
        let ev = evaluator();
        let now = Utc::now();

        let res = ev.check_access(&free_user(), "see_who_liked_you", now).unwrap();
        assert!(!res.has_access);
        assert_eq!(res.current_usage, 0);
    }

    #[test]
    fn premium_bypasses_all_limits() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = with_usage(free_user(), "unlimited_likes", 999, now);
        ev.apply_upgrade(&mut user, "premium_monthly", "card", now)
            .unwrap();

        for f in ["unlimited_likes", "see_who_liked_you", "read_receipts"] {
            let res = ev.check_access(&user, f, now).unwrap();
            assert!(res.has_access, "premium should unlock {}", f);
            assert_eq!(res.reason, "premium active");
        }
    }

    #[test]
    fn unknown_feature_is_a_client_error() {
        let ev = evaluator();
        let err = ev
            .check_access(&free_user(), "not_a_real_feature", Utc::now())
            .unwrap_err();
        assert!(matches!(err, PaywallError::UnknownFeature(_)));
    }

    #[test]
    fn lapsed_subscription_no_longer_grants_access() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = with_usage(free_user(), "unlimited_likes", 5, now);
        ev.apply_upgrade(&mut user, "premium_monthly", "card", now)
            .unwrap();

        let after_expiry = now + Duration::days(31);
        assert!(!ev.is_premium(&user, after_expiry));
        // the window elapsed too, so the counter reads as zero again
        let res = ev.check_access(&user, "unlimited_likes", after_expiry).unwrap();
        assert!(res.has_access);
        assert_eq!(res.current_usage, 0);
    }

    #[test]
    fn usage_window_resets_counters_on_read() {
        let ev = evaluator();
        let now = Utc::now();
        let user = with_usage(free_user(), "unlimited_likes", 5, now);

        assert_eq!(ev.usage_count(&user, "unlimited_likes", now), 5);
        let next_day = now + Duration::hours(25);
        assert_eq!(ev.usage_count(&user, "unlimited_likes", next_day), 0);
        assert!(
            ev.check_access(&user, "unlimited_likes", next_day)
                .unwrap()
                .has_access
        );
    }

    #[test]
    fn upgrade_sets_interval_accurate_end_dates() {
        let ev = evaluator();
        let now = Utc::now();
        for (plan, days) in [
            ("premium_monthly", 30),
            ("premium_quarterly", 90),
            ("premium_yearly", 365),
        ] {
            let mut user = free_user();
            let sub = ev.apply_upgrade(&mut user, plan, "paypal", now).unwrap();
            assert_eq!(sub.end_date - sub.start_date, Duration::days(days));
            assert!(sub.is_active);
            assert!(sub.auto_renew);
            assert_eq!(sub.payment_method, "paypal");
            assert!(user.is_premium);
            assert_eq!(user.premium_since, Some(now));
        }
    }

    #[test]
    fn invalid_plan_fails_without_mutating() {
        let ev = evaluator();
        let mut user = free_user();
        let err = ev
            .apply_upgrade(&mut user, "premium_weekly", "card", Utc::now())
            .unwrap_err();
        assert!(matches!(err, PaywallError::InvalidPlan(_)));
        assert!(user.subscription.is_none());
        assert!(!user.is_premium);
    }

    #[test]
    fn upgrade_flips_exhausted_feature_to_accessible() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = with_usage(free_user(), "unlimited_likes", 5, now);

        assert!(!ev.check_access(&user, "unlimited_likes", now).unwrap().has_access);
        ev.apply_upgrade(&mut user, "premium_monthly", "card", now)
            .unwrap();
        assert!(ev.check_access(&user, "unlimited_likes", now).unwrap().has_access);
    }

    #[test]
    fn reminder_appends_exactly_one_entry() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = free_user();

        let first = ev
            .schedule_reminder(&mut user, "profile_boost", None, now)
            .unwrap();
        assert_eq!(user.reminders.len(), 1);
        assert_eq!(first.remind_at - now, Duration::hours(24));

        let second = ev
            .schedule_reminder(&mut user, "profile_boost", Some(48), now)
            .unwrap();
        assert_eq!(user.reminders.len(), 2);
        assert_eq!(second.remind_at - now, Duration::hours(48));
        // existing entries untouched
        assert_eq!(user.reminders[0].remind_at, first.remind_at);
    }

    #[test]
    fn reminder_hours_are_validated() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = free_user();

        for bad in [0, -5, 169] {
            let err = ev
                .schedule_reminder(&mut user, "profile_boost", Some(bad), now)
                .unwrap_err();
            assert!(matches!(err, PaywallError::Validation(_)));
        }
        assert!(user.reminders.is_empty());

        let err = ev
            .schedule_reminder(&mut user, "nope", Some(24), now)
            .unwrap_err();
        assert!(matches!(err, PaywallError::UnknownFeature(_)));
    }

    #[test]
    fn feature_limits_match_check_access_row_by_row() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = with_usage(free_user(), "unlimited_likes", 5, now);
        user = with_usage(user, "advanced_filters", 1, now);

        let rows = ev.feature_limits(&user, now);
        assert_eq!(rows.len(), ev.catalogs().features.len());
        for row in rows {
            let single = ev.check_access(&user, &row.feature, now).unwrap();
            assert_eq!(row.has_access, single.has_access, "row {}", row.feature);
            assert_eq!(row.current_usage, single.current_usage);
            assert_eq!(row.free_limit, single.feature.free_limit);
        }
    }

    #[test]
    fn upgrade_options_switch_on_premium_state() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = with_usage(free_user(), "unlimited_likes", 2, now);

        match ev.upgrade_options(&user, now) {
            UpgradeOptions::Available { plans, features, usage } => {
                assert_eq!(plans.len(), 3);
                assert_eq!(features.len(), 5);
                assert_eq!(usage.get("unlimited_likes"), Some(&2));
                assert_eq!(usage.get("read_receipts"), Some(&0));
            }
            UpgradeOptions::AlreadyPremium { .. } => panic!("free user offered no plans"),
        }

        ev.apply_upgrade(&mut user, "premium_yearly", "sepa", now)
            .unwrap();
        match ev.upgrade_options(&user, now) {
            UpgradeOptions::AlreadyPremium { subscription } => {
                assert_eq!(subscription.plan_id, "premium_yearly");
                assert_eq!(subscription.interval, PlanInterval::Year);
            }
            UpgradeOptions::Available { .. } => panic!("premium user offered plans"),
        }
    }

    #[test]
    fn record_usage_counts_within_window_and_restarts_after() {
        let ev = evaluator();
        let now = Utc::now();
        let mut user = free_user();

        assert_eq!(ev.record_usage(&mut user, "advanced_filters", now).unwrap(), 1);
        assert_eq!(ev.record_usage(&mut user, "advanced_filters", now).unwrap(), 2);

        let next_day = now + Duration::hours(30);
        assert_eq!(
            ev.record_usage(&mut user, "advanced_filters", next_day).unwrap(),
            1
        );
        assert_eq!(ev.usage_count(&user, "advanced_filters", next_day), 1);

        let err = ev.record_usage(&mut user, "nope", now).unwrap_err();
        assert!(matches!(err, PaywallError::UnknownFeature(_)));
    }
}
