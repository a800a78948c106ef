use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AppState;
use crate::models::{
    AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest, TokenResponse, UserPublic,
};
use crate::services::AuthService;
use crate::utils::validators::validate_phone;

/// Успешный ответ на выход
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
}

/// Регистрация по email и паролю
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Пользователь зарегистрирован", body = AuthResponse),
        (status = 409, description = "Email уже занят"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if let Some(phone) = payload.phone.as_deref() {
        if !validate_phone(phone) {
            return Err(AppError::Validation(
                "Неверный формат номера телефона".to_string(),
            ));
        }
    }

    let email = payload.email.trim().to_lowercase();

    if AuthService::get_user_by_email(&state.pool, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email уже занят".to_string()));
    }

    let password_hash = AuthService::hash_password(&payload.password)?;
    let user = AuthService::create_user(
        &state.pool,
        &email,
        &password_hash,
        payload.full_name.trim(),
        payload.phone.as_deref(),
    )
    .await?;

    let auth_service = AuthService::new(state.config.clone());
    let access_token = auth_service.generate_access_token(&user)?;
    let refresh_token = auth_service.generate_refresh_token(&user)?;

    let expires_at = Utc::now() + Duration::seconds(state.config.jwt_refresh_expiry);
    AuthService::save_refresh_token(
        &state.pool,
        user.id,
        &AuthService::hash_token(&refresh_token),
        None,
        expires_at,
    )
    .await?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: UserPublic::from(user),
    }))
}

/// Вход по email и паролю
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Успешный вход", body = AuthResponse),
        (status = 401, description = "Неверный email или пароль")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();

    let user = AuthService::get_user_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !AuthService::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    AuthService::update_last_login(&state.pool, user.id).await?;

    let auth_service = AuthService::new(state.config.clone());
    let access_token = auth_service.generate_access_token(&user)?;
    let refresh_token = auth_service.generate_refresh_token(&user)?;

    let expires_at = Utc::now() + Duration::seconds(state.config.jwt_refresh_expiry);
    AuthService::save_refresh_token(
        &state.pool,
        user.id,
        &AuthService::hash_token(&refresh_token),
        payload.device_info.as_deref(),
        expires_at,
    )
    .await?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: UserPublic::from(user),
    }))
}

/// Обновление пары токенов по refresh-токену
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Токены обновлены", body = TokenResponse),
        (status = 401, description = "Неверный или истёкший refresh-токен")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let auth_service = AuthService::new(state.config.clone());
    let claims = auth_service
        .verify_token(&payload.refresh_token)
        .map_err(|_| AppError::Unauthorized)?;

    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized);
    }

    let token_hash = AuthService::hash_token(&payload.refresh_token);
    let stored: Option<(uuid::Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM refresh_tokens
        WHERE token_hash = $1 AND expires_at > NOW()
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?;

    if stored.is_none() {
        return Err(AppError::Unauthorized);
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let user = AuthService::get_user_by_id(&state.pool, user_id).await?;

    // Ротация: старый refresh-токен гасим, выдаём новую пару
    AuthService::delete_refresh_token(&state.pool, &token_hash).await?;

    let access_token = auth_service.generate_access_token(&user)?;
    let new_refresh_token = auth_service.generate_refresh_token(&user)?;

    let expires_at = Utc::now() + Duration::seconds(state.config.jwt_refresh_expiry);
    AuthService::save_refresh_token(
        &state.pool,
        user.id,
        &AuthService::hash_token(&new_refresh_token),
        None,
        expires_at,
    )
    .await?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: new_refresh_token,
    }))
}

/// Выход: отзыв refresh-токена
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Выход выполнен", body = LogoutResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<Json<Value>> {
    let token_hash = AuthService::hash_token(&payload.refresh_token);
    AuthService::delete_refresh_token(&state.pool, &token_hash).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Выход выполнен"
    })))
}
