use axum::{
    extract::{Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, AppState, AuthUser};
use crate::models::{UpdateUserRequest, User, UserPublic};
use crate::services::AuthService;
use crate::utils::validators::validate_phone;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me", put(update_me))
        .route("/", get(list_users))
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Профиль текущего пользователя
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Профиль", body = UserPublic),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<UserPublic>> {
    let user = AuthService::get_user_by_id(&state.pool, auth_user.user_id).await?;
    Ok(Json(UserPublic::from(user)))
}

/// Обновление профиля. Уже поданные заявки хранят свой снимок анкеты
/// и правок профиля не видят.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Профиль обновлён", body = UserPublic),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserPublic>> {
    if let Some(phone) = payload.phone.as_deref() {
        if !validate_phone(phone) {
            return Err(AppError::Validation(
                "Неверный формат номера телефона".to_string(),
            ));
        }
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            occupation = COALESCE($4, occupation),
            emergency_contact = COALESCE($5, emergency_contact),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.user_id)
    .bind(payload.full_name.as_deref().map(str::trim))
    .bind(payload.phone.as_deref())
    .bind(payload.occupation.as_deref())
    .bind(payload.emergency_contact.as_deref())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    Ok(Json(UserPublic::from(user)))
}

/// Список пользователей (только для администратора)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список пользователей", body = Vec<UserPublic>),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<UsersQuery>,
) -> AppResult<Json<Vec<UserPublic>>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.page.unwrap_or(0) * limit;

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE ($1::varchar IS NULL OR role::text = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&query.role)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}
