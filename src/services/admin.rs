use crate::{
    common::money,
    db::DbPool,
    entities::{order, product, user},
    errors::ServiceError,
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Months covered by the dashboard chart, current month included
pub const STATS_MONTHS: u32 = 6;

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    /// Short month name for chart axes
    pub label: String,
    pub orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub sales: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_sales: Decimal,
    pub orders: u64,
    pub products: u64,
    /// Every registered account, admins included
    pub customers: u64,
    pub monthly: Vec<MonthlyBucket>,
}

/// First instant of the month `back` months before `now`'s month
fn month_start(now: DateTime<Utc>, back: u32) -> DateTime<Utc> {
    let total = now.year() * 12 + now.month0() as i32 - back as i32;
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12) as u32);
    Utc.with_ymd_and_hms(year, month0 + 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Buckets `(created_at, total, is_paid)` rows by calendar month, oldest first.
/// Every order counts toward `orders`; only paid ones toward `sales`.
pub fn monthly_buckets(
    now: DateTime<Utc>,
    rows: &[(DateTime<Utc>, Decimal, bool)],
) -> Vec<MonthlyBucket> {
    let mut buckets: Vec<MonthlyBucket> = (0..STATS_MONTHS)
        .rev()
        .map(|back| {
            let start = month_start(now, back);
            MonthlyBucket {
                month: start.format("%Y-%m").to_string(),
                label: start.format("%b").to_string(),
                orders: 0,
                sales: Decimal::ZERO,
            }
        })
        .collect();

    for (created_at, total, is_paid) in rows {
        let key = created_at.format("%Y-%m").to_string();
        if let Some(bucket) = buckets.iter_mut().find(|b| b.month == key) {
            bucket.orders += 1;
            if *is_paid {
                bucket.sales += *total;
            }
        }
    }
    for bucket in &mut buckets {
        bucket.sales = money(bucket.sales);
    }
    buckets
}

/// Dashboard aggregates
#[derive(Clone)]
pub struct AdminService {
    db_pool: Arc<DbPool>,
}

impl AdminService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn stats(&self) -> Result<AdminStats, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let paid_totals: Vec<Decimal> = order::Entity::find()
            .select_only()
            .column(order::Column::TotalPrice)
            .filter(order::Column::IsPaid.eq(true))
            .into_tuple()
            .all(db)
            .await?;
        let orders = order::Entity::find().count(db).await?;
        let products = product::Entity::find().count(db).await?;
        let customers = user::Entity::find().count(db).await?;

        let recent: Vec<(DateTime<Utc>, Decimal, bool)> = order::Entity::find()
            .select_only()
            .column(order::Column::CreatedAt)
            .column(order::Column::TotalPrice)
            .column(order::Column::IsPaid)
            .filter(order::Column::CreatedAt.gte(month_start(now, STATS_MONTHS - 1)))
            .into_tuple()
            .all(db)
            .await?;

        Ok(AdminStats {
            total_sales: money(paid_totals.into_iter().sum()),
            orders,
            products,
            customers,
            monthly: monthly_buckets(now, &recent),
        })
    }
}
