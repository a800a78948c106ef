use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "unit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    Occupied,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Unit {
    pub id: Uuid,
    pub number: String,
    pub building: Option<String>,
    pub floor: Option<i32>,
    pub area: Option<Decimal>,
    pub rooms_count: Option<i32>,
    pub rent_amount: Decimal,
    pub status: UnitStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnitResponse {
    pub id: Uuid,
    pub number: String,
    pub building: Option<String>,
    pub floor: Option<i32>,
    pub area: Option<Decimal>,
    pub rooms_count: Option<i32>,
    pub rent_amount: Decimal,
    pub status: UnitStatus,
    pub description: Option<String>,
}

impl From<Unit> for UnitResponse {
    fn from(unit: Unit) -> Self {
        Self {
            id: unit.id,
            number: unit.number,
            building: unit.building,
            floor: unit.floor,
            area: unit.area,
            rooms_count: unit.rooms_count,
            rent_amount: unit.rent_amount,
            status: unit.status,
            description: unit.description,
        }
    }
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUnitRequest {
    pub number: String,
    pub building: Option<String>,
    pub floor: Option<i32>,
    pub area: Option<Decimal>,
    pub rooms_count: Option<i32>,
    pub rent_amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUnitRequest {
    pub number: Option<String>,
    pub building: Option<String>,
    pub floor: Option<i32>,
    pub area: Option<Decimal>,
    pub rooms_count: Option<i32>,
    pub rent_amount: Option<Decimal>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUnitStatusRequest {
    pub status: UnitStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnitsQuery {
    pub status: Option<String>,
    pub building: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
