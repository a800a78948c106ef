use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lease_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    Terminated,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lease {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub status: LeaseStatus,
    pub terminated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaseResponse {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub unit_number: Option<String>,
    pub tenant_id: Uuid,
    pub tenant_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub status: LeaseStatus,
    pub terminated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Lease> for LeaseResponse {
    fn from(lease: Lease) -> Self {
        Self {
            id: lease.id,
            unit_id: lease.unit_id,
            unit_number: None,
            tenant_id: lease.tenant_id,
            tenant_name: None,
            start_date: lease.start_date,
            end_date: lease.end_date,
            monthly_rent: lease.monthly_rent,
            status: lease.status,
            terminated_at: lease.terminated_at,
            created_at: lease.created_at,
        }
    }
}

/// Период аренды корректен, если конец строго позже начала
pub fn period_is_valid(start_date: NaiveDate, end_date: NaiveDate) -> bool {
    end_date > start_date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_requires_end_after_start() {
        assert!(period_is_valid(d(2025, 1, 1), d(2025, 12, 31)));
        assert!(!period_is_valid(d(2025, 1, 1), d(2025, 1, 1)));
        assert!(!period_is_valid(d(2025, 12, 31), d(2025, 1, 1)));
    }
}
