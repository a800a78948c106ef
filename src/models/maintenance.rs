use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "maintenance_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceCategory {
    Plumbing,
    Electrical,
    Heating,
    Appliances,
    Doors,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Open,
    InProgress,
    Resolved,
    Cancelled,
}

impl Default for MaintenanceStatus {
    fn default() -> Self {
        Self::Open
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceTicket {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub requester_id: Uuid,
    pub category: MaintenanceCategory,
    pub title: String,
    pub description: Option<String>,
    pub status: MaintenanceStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceTicketResponse {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub unit_number: Option<String>,
    pub category: MaintenanceCategory,
    pub title: String,
    pub description: Option<String>,
    pub status: MaintenanceStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MaintenanceTicket> for MaintenanceTicketResponse {
    fn from(ticket: MaintenanceTicket) -> Self {
        Self {
            id: ticket.id,
            unit_id: ticket.unit_id,
            unit_number: None,
            category: ticket.category,
            title: ticket.title,
            description: ticket.description,
            status: ticket.status,
            resolved_at: ticket.resolved_at,
            resolution_notes: ticket.resolution_notes,
            created_at: ticket.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMaintenanceTicket {
    pub unit_id: Uuid,
    pub category: MaintenanceCategory,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMaintenanceStatusRequest {
    pub status: MaintenanceStatus,
    pub resolution_notes: Option<String>,
}
