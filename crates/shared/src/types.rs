//! Profile and plan types shared by the billing and API crates

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// VIP billing cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Annual,
}

impl PlanType {
    /// Value stored in the `profiles.plan` column
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Annual => "annual",
        }
    }

    /// Code used by the checkout form (`MONTHLY` / `ANNUAL`)
    pub fn checkout_code(&self) -> &'static str {
        match self {
            PlanType::Monthly => "MONTHLY",
            PlanType::Annual => "ANNUAL",
        }
    }

    /// Parse a checkout form code. Codes are exact and case-sensitive.
    pub fn from_checkout_code(code: &str) -> Option<Self> {
        match code {
            "MONTHLY" => Some(PlanType::Monthly),
            "ANNUAL" => Some(PlanType::Annual),
            _ => None,
        }
    }

    /// Parse the stored column value
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "monthly" => Some(PlanType::Monthly),
            "annual" => Some(PlanType::Annual),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted per-user VIP and billing state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub is_vip: bool,
    pub plan: Option<PlanType>,
    pub period_start: Option<OffsetDateTime>,
    pub period_end: Option<OffsetDateTime>,
    pub payment_customer_id: Option<String>,
    pub payment_subscription_id: Option<String>,
    pub updated_at: OffsetDateTime,
}

impl Profile {
    /// A fresh, non-VIP profile as created at signup
    pub fn new(id: Uuid, email: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            id,
            email: email.into(),
            is_vip: false,
            plan: None,
            period_start: None,
            period_end: None,
            payment_customer_id: None,
            payment_subscription_id: None,
            updated_at: now,
        }
    }

    /// Whether VIP access is currently granted.
    ///
    /// The stored flag is not enough on its own: expiry is enforced here, at read
    /// time, by comparing `period_end` with `now`.
    pub fn has_active_vip(&self, now: OffsetDateTime) -> bool {
        if !self.is_vip {
            return false;
        }
        match self.period_end {
            Some(end) => end > now,
            None => true,
        }
    }

    /// Apply a partial write in memory, with the same semantics as the SQL store
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(is_vip) = update.is_vip {
            self.is_vip = is_vip;
        }
        update.plan.apply_to(&mut self.plan);
        update.period_start.apply_to(&mut self.period_start);
        update.period_end.apply_to(&mut self.period_end);
        update
            .payment_customer_id
            .apply_to(&mut self.payment_customer_id);
        update
            .payment_subscription_id
            .apply_to(&mut self.payment_subscription_id);
        self.updated_at = update.updated_at;
    }
}

/// Write intent for a nullable column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// Leave the column as it is
    #[default]
    Keep,
    /// Write a value
    Set(T),
    /// Write NULL
    Clear,
}

impl<T> Field<T> {
    /// `Set(v)` when `Some(v)`, `Clear` otherwise
    pub fn set_or_clear(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Set(value),
            None => Field::Clear,
        }
    }

    /// `None` for `Keep`, otherwise the nullable value to bind
    pub fn into_column(self) -> Option<Option<T>> {
        match self {
            Field::Keep => None,
            Field::Set(value) => Some(Some(value)),
            Field::Clear => Some(None),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Keep => Field::Keep,
            Field::Set(value) => Field::Set(f(value)),
            Field::Clear => Field::Clear,
        }
    }
}

impl<T: Clone> Field<T> {
    fn apply_to(&self, slot: &mut Option<T>) {
        match self {
            Field::Keep => {}
            Field::Set(value) => *slot = Some(value.clone()),
            Field::Clear => *slot = None,
        }
    }
}

/// Partial profile write keyed by user id. `updated_at` is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub is_vip: Option<bool>,
    pub plan: Field<PlanType>,
    pub period_start: Field<OffsetDateTime>,
    pub period_end: Field<OffsetDateTime>,
    pub payment_customer_id: Field<String>,
    pub payment_subscription_id: Field<String>,
    pub updated_at: OffsetDateTime,
}

impl ProfileUpdate {
    /// An update that only bumps `updated_at`
    pub fn at(updated_at: OffsetDateTime) -> Self {
        Self {
            is_vip: None,
            plan: Field::Keep,
            period_start: Field::Keep,
            period_end: Field::Keep,
            payment_customer_id: Field::Keep,
            payment_subscription_id: Field::Keep,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_checkout_codes() {
        assert_eq!(
            PlanType::from_checkout_code("MONTHLY"),
            Some(PlanType::Monthly)
        );
        assert_eq!(PlanType::from_checkout_code("ANNUAL"), Some(PlanType::Annual));
        assert_eq!(PlanType::from_checkout_code("monthly"), None);
        assert_eq!(PlanType::from_checkout_code(""), None);
        assert_eq!(PlanType::Annual.checkout_code(), "ANNUAL");
    }

    #[test]
    fn test_plan_db_roundtrip_values() {
        assert_eq!(PlanType::from_db("monthly"), Some(PlanType::Monthly));
        assert_eq!(PlanType::from_db("annual"), Some(PlanType::Annual));
        assert_eq!(PlanType::from_db("mensal"), None);
        assert_eq!(PlanType::Monthly.to_string(), "monthly");
    }

    #[test]
    fn test_plan_serializes_lowercase() {
        let json = serde_json::to_string(&PlanType::Annual).unwrap();
        assert_eq!(json, "\"annual\"");
    }

    #[test]
    fn test_active_vip_respects_expiry() {
        let now = OffsetDateTime::now_utc();
        let mut profile = Profile::new(Uuid::new_v4(), "a@example.com", now);
        assert!(!profile.has_active_vip(now));

        profile.is_vip = true;
        profile.period_end = Some(now + Duration::days(3));
        assert!(profile.has_active_vip(now));

        profile.period_end = Some(now - Duration::seconds(1));
        assert!(!profile.has_active_vip(now));

        // Flag without a window counts as active
        profile.period_end = None;
        assert!(profile.has_active_vip(now));
    }

    #[test]
    fn test_apply_keep_set_clear() {
        let now = OffsetDateTime::now_utc();
        let mut profile = Profile::new(Uuid::new_v4(), "b@example.com", now);
        profile.payment_customer_id = Some("cus_1".to_string());

        let later = now + Duration::minutes(5);
        let update = ProfileUpdate {
            is_vip: Some(true),
            plan: Field::Set(PlanType::Annual),
            period_end: Field::Set(later),
            ..ProfileUpdate::at(later)
        };
        profile.apply(&update);

        assert!(profile.is_vip);
        assert_eq!(profile.plan, Some(PlanType::Annual));
        assert_eq!(profile.period_end, Some(later));
        // Kept columns are untouched
        assert_eq!(profile.payment_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(profile.updated_at, later);

        let revoke = ProfileUpdate {
            is_vip: Some(false),
            plan: Field::Clear,
            period_end: Field::Clear,
            ..ProfileUpdate::at(later)
        };
        profile.apply(&revoke);
        assert!(!profile.is_vip);
        assert_eq!(profile.plan, None);
        assert_eq!(profile.period_end, None);
    }

    #[test]
    fn test_field_helpers() {
        assert_eq!(Field::<u8>::default(), Field::Keep);
        assert_eq!(Field::set_or_clear(Some(1)), Field::Set(1));
        assert_eq!(Field::<u8>::set_or_clear(None), Field::Clear);
        assert_eq!(Field::Set(2).map(|v| v * 2).into_column(), Some(Some(4)));
        assert_eq!(Field::<u8>::Clear.into_column(), Some(None));
        assert_eq!(Field::<u8>::Keep.into_column(), None);
    }
}
