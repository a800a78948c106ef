use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, AppState, AuthUser};
use crate::models::{
    CreateMaintenanceTicket, MaintenanceStatus, MaintenanceTicket, MaintenanceTicketResponse,
    UpdateMaintenanceStatusRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets))
        .route("/", post(create_ticket))
        .route("/:id", get(get_ticket))
        .route("/:id/status", put(update_status))
}

#[derive(Debug, Deserialize)]
pub struct TicketsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Список заявок на обслуживание: жилец видит свои, администратор видит все
#[utoipa::path(
    get,
    path = "/api/v1/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список заявок", body = Vec<MaintenanceTicketResponse>)
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<TicketsQuery>,
) -> AppResult<Json<Vec<MaintenanceTicketResponse>>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.page.unwrap_or(0) * limit;
    let requester_filter = if is_admin(&auth_user.role) {
        None
    } else {
        Some(auth_user.user_id)
    };

    let tickets = sqlx::query_as::<_, MaintenanceTicket>(
        r#"
        SELECT * FROM maintenance_tickets
        WHERE ($1::uuid IS NULL OR requester_id = $1)
          AND ($2::varchar IS NULL OR status::text = $2)
          AND ($3::varchar IS NULL OR category::text = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(requester_filter)
    .bind(&query.status)
    .bind(&query.category)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for ticket in tickets {
        response.push(build_ticket_response(&state, ticket).await?);
    }

    Ok(Json(response))
}

/// Создание заявки на обслуживание. Заявку может подать жилец с
/// активным договором на эту квартиру.
#[utoipa::path(
    post,
    path = "/api/v1/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    request_body = CreateMaintenanceTicket,
    responses(
        (status = 200, description = "Заявка создана", body = MaintenanceTicketResponse),
        (status = 403, description = "Нет активного договора на квартиру"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateMaintenanceTicket>,
) -> AppResult<Json<MaintenanceTicketResponse>> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation(
            "Заголовок заявки обязателен".to_string(),
        ));
    }

    if !is_admin(&auth_user.role) {
        let active_lease: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM leases
            WHERE unit_id = $1 AND tenant_id = $2 AND status = 'active'
            "#,
        )
        .bind(payload.unit_id)
        .bind(auth_user.user_id)
        .fetch_optional(&state.pool)
        .await?;

        if active_lease.is_none() {
            return Err(AppError::Forbidden);
        }
    }

    let ticket = sqlx::query_as::<_, MaintenanceTicket>(
        r#"
        INSERT INTO maintenance_tickets
            (unit_id, requester_id, category, title, description, status)
        VALUES ($1, $2, $3, $4, $5, 'open')
        RETURNING *
        "#,
    )
    .bind(payload.unit_id)
    .bind(auth_user.user_id)
    .bind(payload.category)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .fetch_one(&state.pool)
    .await?;

    let response = build_ticket_response(&state, ticket).await?;
    Ok(Json(response))
}

/// Карточка заявки на обслуживание
#[utoipa::path(
    get,
    path = "/api/v1/maintenance/{id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID заявки")),
    responses(
        (status = 200, description = "Заявка", body = MaintenanceTicketResponse),
        (status = 404, description = "Заявка не найдена")
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<MaintenanceTicketResponse>> {
    let ticket = sqlx::query_as::<_, MaintenanceTicket>(
        "SELECT * FROM maintenance_tickets WHERE id = $1",
    )
    .bind(ticket_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Заявка не найдена".to_string()))?;

    if ticket.requester_id != auth_user.user_id && !is_admin(&auth_user.role) {
        return Err(AppError::NotFound("Заявка не найдена".to_string()));
    }

    let response = build_ticket_response(&state, ticket).await?;
    Ok(Json(response))
}

/// Смена статуса заявки (только для администратора)
#[utoipa::path(
    put,
    path = "/api/v1/maintenance/{id}/status",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID заявки")),
    request_body = UpdateMaintenanceStatusRequest,
    responses(
        (status = 200, description = "Статус обновлён", body = MaintenanceTicketResponse),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Заявка не найдена")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(ticket_id): Path<Uuid>,
    Json(payload): Json<UpdateMaintenanceStatusRequest>,
) -> AppResult<Json<MaintenanceTicketResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let resolved = payload.status == MaintenanceStatus::Resolved;
    let ticket = sqlx::query_as::<_, MaintenanceTicket>(
        r#"
        UPDATE maintenance_tickets
        SET status = $2,
            resolution_notes = COALESCE($3, resolution_notes),
            resolved_at = CASE WHEN $4 THEN NOW() ELSE resolved_at END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(ticket_id)
    .bind(payload.status)
    .bind(&payload.resolution_notes)
    .bind(resolved)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Заявка не найдена".to_string()))?;

    let response = build_ticket_response(&state, ticket).await?;
    Ok(Json(response))
}

async fn build_ticket_response(
    state: &AppState,
    ticket: MaintenanceTicket,
) -> AppResult<MaintenanceTicketResponse> {
    let unit_number: Option<(String,)> = sqlx::query_as("SELECT number FROM units WHERE id = $1")
        .bind(ticket.unit_id)
        .fetch_optional(&state.pool)
        .await?;

    let mut response = MaintenanceTicketResponse::from(ticket);
    response.unit_number = unit_number.map(|(number,)| number);
    Ok(response)
}
