use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, AppState, AuthUser};
use crate::models::{Lease, LeaseResponse};
use crate::services::RentalService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_leases))
        .route("/my", get(my_leases))
        .route("/:id", get(get_lease))
        .route("/:id/terminate", post(terminate_lease))
}

#[derive(Debug, Deserialize)]
pub struct LeasesQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Список договоров (только для администратора)
#[utoipa::path(
    get,
    path = "/api/v1/leases",
    tag = "leases",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список договоров", body = Vec<LeaseResponse>),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn list_leases(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<LeasesQuery>,
) -> AppResult<Json<Vec<LeaseResponse>>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.page.unwrap_or(0) * limit;

    let leases = sqlx::query_as::<_, Lease>(
        r#"
        SELECT * FROM leases
        WHERE ($1::varchar IS NULL OR status::text = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for lease in leases {
        response.push(build_lease_response(&state, lease).await?);
    }

    Ok(Json(response))
}

/// Договоры текущего пользователя
#[utoipa::path(
    get,
    path = "/api/v1/leases/my",
    tag = "leases",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Мои договоры", body = Vec<LeaseResponse>)
    )
)]
pub async fn my_leases(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<LeaseResponse>>> {
    let leases = sqlx::query_as::<_, Lease>(
        r#"
        SELECT * FROM leases
        WHERE tenant_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for lease in leases {
        response.push(build_lease_response(&state, lease).await?);
    }

    Ok(Json(response))
}

/// Карточка договора: доступна администратору и самому жильцу
#[utoipa::path(
    get,
    path = "/api/v1/leases/{id}",
    tag = "leases",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID договора")),
    responses(
        (status = 200, description = "Договор", body = LeaseResponse),
        (status = 404, description = "Договор не найден")
    )
)]
pub async fn get_lease(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(lease_id): Path<Uuid>,
) -> AppResult<Json<LeaseResponse>> {
    let lease = sqlx::query_as::<_, Lease>("SELECT * FROM leases WHERE id = $1")
        .bind(lease_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Договор не найден".to_string()))?;

    if lease.tenant_id != auth_user.user_id && !is_admin(&auth_user.role) {
        return Err(AppError::NotFound("Договор не найден".to_string()));
    }

    let response = build_lease_response(&state, lease).await?;
    Ok(Json(response))
}

/// Досрочное расторжение договора (только для администратора).
/// Квартира освобождается, роль жильца понижается, если других
/// активных договоров у него нет.
#[utoipa::path(
    post,
    path = "/api/v1/leases/{id}/terminate",
    tag = "leases",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID договора")),
    responses(
        (status = 200, description = "Договор расторгнут", body = LeaseResponse),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Договор не найден"),
        (status = 409, description = "LEASE_NOT_ACTIVE")
    )
)]
pub async fn terminate_lease(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(lease_id): Path<Uuid>,
) -> AppResult<Json<LeaseResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let lease = RentalService::terminate_lease(&state.pool, lease_id).await?;
    let response = build_lease_response(&state, lease).await?;
    Ok(Json(response))
}

async fn build_lease_response(state: &AppState, lease: Lease) -> AppResult<LeaseResponse> {
    let unit_number: Option<(String,)> = sqlx::query_as("SELECT number FROM units WHERE id = $1")
        .bind(lease.unit_id)
        .fetch_optional(&state.pool)
        .await?;

    let tenant_name: Option<(String,)> =
        sqlx::query_as("SELECT full_name FROM users WHERE id = $1")
            .bind(lease.tenant_id)
            .fetch_optional(&state.pool)
            .await?;

    let mut response = LeaseResponse::from(lease);
    response.unit_number = unit_number.map(|(number,)| number);
    response.tenant_name = tenant_name.map(|(name,)| name);
    Ok(response)
}
