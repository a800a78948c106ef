use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, AppState, AuthUser};
use crate::models::{
    ApproveRentalRequest, BookingEligibility, RejectRentalRequest, RentalRequest,
    RentalRequestResponse, SubmitRentalRequest,
};
use crate::services::RentalService;
use crate::utils::validators::validate_phone;

/// Ответ на одобрение заявки
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ApproveResponse {
    pub success: bool,
    pub lease_id: Uuid,
    pub request: RentalRequestResponse,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_request))
        .route("/", get(list_requests))
        .route("/my-status", get(my_status))
        .route("/my", get(my_requests))
        .route("/:id/approve", post(approve_request))
        .route("/:id/reject", post(reject_request))
        .route("/:id/acknowledge", post(acknowledge_rejection))
}

#[derive(Debug, Deserialize)]
pub struct RequestsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Подача заявки на аренду
#[utoipa::path(
    post,
    path = "/api/v1/rental-requests",
    tag = "rental-requests",
    security(("bearer_auth" = [])),
    request_body = SubmitRentalRequest,
    responses(
        (status = 200, description = "Заявка создана", body = RentalRequestResponse),
        (status = 404, description = "Квартира не найдена"),
        (status = 409, description = "ALREADY_VILLAGER | PENDING_EXISTS | UNACKNOWLEDGED_REJECTION"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn submit_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<SubmitRentalRequest>,
) -> AppResult<Json<RentalRequestResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if !validate_phone(&payload.phone) {
        return Err(AppError::Validation(
            "Неверный формат номера телефона".to_string(),
        ));
    }

    let request = RentalService::submit_request(&state.pool, auth_user.user_id, &payload).await?;

    Ok(Json(RentalRequestResponse::from(request)))
}

/// Проекция доступности бронирования для опрашивающего клиента
#[utoipa::path(
    get,
    path = "/api/v1/rental-requests/my-status",
    tag = "rental-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Статус бронирования", body = BookingEligibility),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn my_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<BookingEligibility>> {
    let view = RentalService::latest_request_status(&state.pool, auth_user.user_id).await?;
    Ok(Json(view))
}

/// История заявок текущего пользователя
#[utoipa::path(
    get,
    path = "/api/v1/rental-requests/my",
    tag = "rental-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Мои заявки", body = Vec<RentalRequestResponse>)
    )
)]
pub async fn my_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<RentalRequestResponse>>> {
    let requests = sqlx::query_as::<_, RentalRequest>(
        r#"
        SELECT * FROM rental_requests
        WHERE user_id = $1
        ORDER BY request_date DESC
        "#,
    )
    .bind(auth_user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for req in requests {
        response.push(build_request_response(&state, req).await?);
    }

    Ok(Json(response))
}

/// Список заявок (только для администратора)
#[utoipa::path(
    get,
    path = "/api/v1/rental-requests",
    tag = "rental-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список заявок", body = Vec<RentalRequestResponse>),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<RequestsQuery>,
) -> AppResult<Json<Vec<RentalRequestResponse>>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.page.unwrap_or(0) * limit;
    // По умолчанию администратору показываются заявки на рассмотрении
    let status = query.status.clone().unwrap_or_else(|| "pending".to_string());

    let requests = sqlx::query_as::<_, RentalRequest>(
        r#"
        SELECT * FROM rental_requests
        WHERE status::text = $1
        ORDER BY request_date ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for req in requests {
        response.push(build_request_response(&state, req).await?);
    }

    Ok(Json(response))
}

/// Одобрение заявки (только для администратора)
#[utoipa::path(
    post,
    path = "/api/v1/rental-requests/{id}/approve",
    tag = "rental-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID заявки")),
    request_body = ApproveRentalRequest,
    responses(
        (status = 200, description = "Заявка одобрена, договор создан", body = ApproveResponse),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Заявка не найдена"),
        (status = 409, description = "ALREADY_DECIDED | UNIT_UNAVAILABLE"),
        (status = 422, description = "INVALID_PERIOD")
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ApproveRentalRequest>,
) -> AppResult<Json<ApproveResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let (request, lease) = RentalService::approve_request(
        &state.pool,
        request_id,
        auth_user.user_id,
        payload.start_date,
        payload.end_date,
    )
    .await?;

    Ok(Json(ApproveResponse {
        success: true,
        lease_id: lease.id,
        request: RentalRequestResponse::from(request),
    }))
}

/// Отклонение заявки (только для администратора)
#[utoipa::path(
    post,
    path = "/api/v1/rental-requests/{id}/reject",
    tag = "rental-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID заявки")),
    request_body = RejectRentalRequest,
    responses(
        (status = 200, description = "Заявка отклонена", body = RentalRequestResponse),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Заявка не найдена"),
        (status = 409, description = "ALREADY_DECIDED"),
        (status = 422, description = "Причина отказа обязательна")
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RejectRentalRequest>,
) -> AppResult<Json<RentalRequestResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let request =
        RentalService::reject_request(&state.pool, request_id, auth_user.user_id, &payload.reason)
            .await?;

    Ok(Json(RentalRequestResponse::from(request)))
}

/// Подтверждение ознакомления с отказом. Идемпотентно: повторный вызов
/// возвращает тот же успех.
#[utoipa::path(
    post,
    path = "/api/v1/rental-requests/{id}/acknowledge",
    tag = "rental-requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID заявки")),
    responses(
        (status = 200, description = "Отказ подтверждён"),
        (status = 400, description = "Заявка не отклонена"),
        (status = 404, description = "Заявка не найдена")
    )
)]
pub async fn acknowledge_rejection(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let request =
        RentalService::acknowledge_rejection(&state.pool, request_id, auth_user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "request": RentalRequestResponse::from(request)
    })))
}

async fn build_request_response(
    state: &AppState,
    req: RentalRequest,
) -> AppResult<RentalRequestResponse> {
    let unit_number: Option<(String,)> = sqlx::query_as("SELECT number FROM units WHERE id = $1")
        .bind(req.unit_id)
        .fetch_optional(&state.pool)
        .await?;

    let mut response = RentalRequestResponse::from(req);
    response.unit_number = unit_number.map(|(number,)| number);
    Ok(response)
}
