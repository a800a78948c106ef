use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, AppState, AuthUser};
use crate::models::{
    CreateUnitRequest, Unit, UnitResponse, UnitStatus, UnitsQuery, UpdateUnitRequest,
    UpdateUnitStatusRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_units))
        .route("/", post(create_unit))
        .route("/:id", get(get_unit))
        .route("/:id", put(update_unit))
        .route("/:id/status", put(update_unit_status))
}

/// Список квартир
#[utoipa::path(
    get,
    path = "/api/v1/units",
    tag = "units",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список квартир", body = Vec<UnitResponse>)
    )
)]
pub async fn list_units(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<UnitsQuery>,
) -> AppResult<Json<Vec<UnitResponse>>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.page.unwrap_or(0) * limit;

    let units = sqlx::query_as::<_, Unit>(
        r#"
        SELECT * FROM units
        WHERE ($1::varchar IS NULL OR status::text = $1)
          AND ($2::varchar IS NULL OR building = $2)
        ORDER BY number
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&query.status)
    .bind(&query.building)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(units.into_iter().map(UnitResponse::from).collect()))
}

/// Карточка квартиры
#[utoipa::path(
    get,
    path = "/api/v1/units/{id}",
    tag = "units",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    responses(
        (status = 200, description = "Квартира", body = UnitResponse),
        (status = 404, description = "Квартира не найдена")
    )
)]
pub async fn get_unit(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(unit_id): Path<Uuid>,
) -> AppResult<Json<UnitResponse>> {
    let unit = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE id = $1")
        .bind(unit_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Квартира не найдена".to_string()))?;

    Ok(Json(UnitResponse::from(unit)))
}

/// Добавление квартиры (только для администратора)
#[utoipa::path(
    post,
    path = "/api/v1/units",
    tag = "units",
    security(("bearer_auth" = [])),
    request_body = CreateUnitRequest,
    responses(
        (status = 200, description = "Квартира добавлена", body = UnitResponse),
        (status = 403, description = "Нет прав"),
        (status = 409, description = "Номер квартиры уже занят")
    )
)]
pub async fn create_unit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUnitRequest>,
) -> AppResult<Json<UnitResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if payload.number.trim().is_empty() {
        return Err(AppError::Validation(
            "Номер квартиры обязателен".to_string(),
        ));
    }
    if payload.rent_amount.is_sign_negative() || payload.rent_amount.is_zero() {
        return Err(AppError::Validation(
            "Арендная плата должна быть положительной".to_string(),
        ));
    }

    let unit = sqlx::query_as::<_, Unit>(
        r#"
        INSERT INTO units (number, building, floor, area, rooms_count, rent_amount, status, description)
        VALUES ($1, $2, $3, $4, $5, $6, 'available', $7)
        RETURNING *
        "#,
    )
    .bind(payload.number.trim())
    .bind(&payload.building)
    .bind(payload.floor)
    .bind(payload.area)
    .bind(payload.rooms_count)
    .bind(payload.rent_amount)
    .bind(&payload.description)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("units_number_building_key") => {
            AppError::Conflict("Квартира с таким номером уже существует".to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(Json(UnitResponse::from(unit)))
}

/// Редактирование квартиры (только для администратора)
#[utoipa::path(
    put,
    path = "/api/v1/units/{id}",
    tag = "units",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    request_body = UpdateUnitRequest,
    responses(
        (status = 200, description = "Квартира обновлена", body = UnitResponse),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Квартира не найдена")
    )
)]
pub async fn update_unit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(unit_id): Path<Uuid>,
    Json(payload): Json<UpdateUnitRequest>,
) -> AppResult<Json<UnitResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if let Some(rent) = payload.rent_amount {
        if rent.is_sign_negative() || rent.is_zero() {
            return Err(AppError::Validation(
                "Арендная плата должна быть положительной".to_string(),
            ));
        }
    }

    let unit = sqlx::query_as::<_, Unit>(
        r#"
        UPDATE units
        SET number = COALESCE($2, number),
            building = COALESCE($3, building),
            floor = COALESCE($4, floor),
            area = COALESCE($5, area),
            rooms_count = COALESCE($6, rooms_count),
            rent_amount = COALESCE($7, rent_amount),
            description = COALESCE($8, description),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(unit_id)
    .bind(payload.number.as_deref().map(str::trim))
    .bind(&payload.building)
    .bind(payload.floor)
    .bind(payload.area)
    .bind(payload.rooms_count)
    .bind(payload.rent_amount)
    .bind(&payload.description)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Квартира не найдена".to_string()))?;

    Ok(Json(UnitResponse::from(unit)))
}

/// Смена статуса квартиры (только для администратора).
/// Статус occupied выставляется и снимается только жизненным циклом
/// договора; вручную доступны available и maintenance.
#[utoipa::path(
    put,
    path = "/api/v1/units/{id}/status",
    tag = "units",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    request_body = UpdateUnitStatusRequest,
    responses(
        (status = 200, description = "Статус обновлён", body = UnitResponse),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Квартира не найдена"),
        (status = 409, description = "Статус занят жизненным циклом договора")
    )
)]
pub async fn update_unit_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(unit_id): Path<Uuid>,
    Json(payload): Json<UpdateUnitStatusRequest>,
) -> AppResult<Json<UnitResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if payload.status == UnitStatus::Occupied {
        return Err(AppError::Conflict(
            "Статус occupied выставляется только одобрением заявки".to_string(),
        ));
    }

    let unit = sqlx::query_as::<_, Unit>(
        r#"
        UPDATE units SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status <> 'occupied'
        RETURNING *
        "#,
    )
    .bind(unit_id)
    .bind(payload.status)
    .fetch_optional(&state.pool)
    .await?;

    match unit {
        Some(unit) => Ok(Json(UnitResponse::from(unit))),
        None => {
            let exists: Option<(UnitStatus,)> =
                sqlx::query_as("SELECT status FROM units WHERE id = $1")
                    .bind(unit_id)
                    .fetch_optional(&state.pool)
                    .await?;
            Err(match exists {
                None => AppError::NotFound("Квартира не найдена".to_string()),
                Some(_) => AppError::Conflict(
                    "Нельзя менять статус занятой квартиры, сначала расторгните договор".to_string(),
                ),
            })
        }
    }
}
