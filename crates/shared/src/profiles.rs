//! Profile persistence
//!
//! Billing only ever writes profiles by id; the single read is the VIP status
//! lookup. Rows are created at signup, outside this service.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::types::{PlanType, Profile, ProfileUpdate};

/// Storage seam for profile rows
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Write the given columns of profile `id`. Last write wins.
    async fn update(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<()>;

    /// Load a profile by id
    async fn find(&self, id: Uuid) -> StoreResult<Option<Profile>>;
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    is_vip: bool,
    plan: Option<String>,
    period_start: Option<OffsetDateTime>,
    period_end: Option<OffsetDateTime>,
    payment_customer_id: Option<String>,
    payment_subscription_id: Option<String>,
    updated_at: OffsetDateTime,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let plan = match row.plan.as_deref() {
            None => None,
            Some(value) => Some(PlanType::from_db(value).ok_or_else(|| {
                StoreError::CorruptRow {
                    id: row.id,
                    reason: format!("unknown plan '{}'", value),
                }
            })?),
        };

        Ok(Profile {
            id: row.id,
            email: row.email,
            is_vip: row.is_vip,
            plan,
            period_start: row.period_start,
            period_end: row.period_end,
            payment_customer_id: row.payment_customer_id,
            payment_subscription_id: row.payment_subscription_id,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed profile store
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Build `UPDATE profiles SET ... WHERE id = $n` touching only the requested columns
fn build_update_query(id: Uuid, update: &ProfileUpdate) -> QueryBuilder<'static, Postgres> {
    let update = update.clone();
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE profiles SET updated_at = ");
    qb.push_bind(update.updated_at);

    if let Some(is_vip) = update.is_vip {
        qb.push(", is_vip = ").push_bind(is_vip);
    }
    if let Some(plan) = update.plan.map(|p| p.as_str()).into_column() {
        qb.push(", plan = ").push_bind(plan);
    }
    if let Some(start) = update.period_start.into_column() {
        qb.push(", period_start = ").push_bind(start);
    }
    if let Some(end) = update.period_end.into_column() {
        qb.push(", period_end = ").push_bind(end);
    }
    if let Some(customer) = update.payment_customer_id.into_column() {
        qb.push(", payment_customer_id = ").push_bind(customer);
    }
    if let Some(subscription) = update.payment_subscription_id.into_column() {
        qb.push(", payment_subscription_id = ").push_bind(subscription);
    }

    qb.push(" WHERE id = ").push_bind(id);
    qb
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn update(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<()> {
        let mut qb = build_update_query(id, update);
        let result = qb.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            tracing::warn!(user_id = %id, "Profile update matched no row");
        }

        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, email, is_vip, plan, period_start, period_end,
                   payment_customer_id, payment_subscription_id, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }
}
