use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Не авторизован")]
    Unauthorized,

    #[error("Доступ запрещён")]
    Forbidden,

    #[error("Не найдено: {0}")]
    NotFound(String),

    #[error("Неверный запрос: {0}")]
    BadRequest(String),

    #[error("Конфликт: {0}")]
    Conflict(String),

    #[error("Ошибка валидации: {0}")]
    Validation(String),

    #[error("У вас уже есть активный договор аренды")]
    AlreadyVillager,

    #[error("У вас уже есть заявка на рассмотрении")]
    PendingExists,

    #[error("Сначала подтвердите ознакомление с отказом по предыдущей заявке")]
    UnacknowledgedRejection,

    #[error("Заявка уже рассмотрена")]
    AlreadyDecided,

    #[error("Квартира недоступна для аренды")]
    UnitUnavailable,

    #[error("Неверный период аренды")]
    InvalidPeriod,

    #[error("Договор аренды не активен")]
    LeaseNotActive,

    #[error("Неверный email или пароль")]
    InvalidCredentials,

    #[error("Ошибка базы данных: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ошибка JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl AppError {
    /// Стабильный машиночитаемый код ошибки; клиент ветвится по нему
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::AlreadyVillager => "ALREADY_VILLAGER",
            AppError::PendingExists => "PENDING_EXISTS",
            AppError::UnacknowledgedRejection => "UNACKNOWLEDGED_REJECTION",
            AppError::AlreadyDecided => "ALREADY_DECIDED",
            AppError::UnitUnavailable => "UNIT_UNAVAILABLE",
            AppError::InvalidPeriod => "INVALID_PERIOD",
            AppError::LeaseNotActive => "LEASE_NOT_ACTIVE",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Jwt(_) => "INVALID_TOKEN",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            // Нарушения бизнес-правил: клиент не должен повторять запрос как есть
            AppError::AlreadyVillager
            | AppError::PendingExists
            | AppError::UnacknowledgedRejection
            | AppError::AlreadyDecided
            | AppError::UnitUnavailable
            | AppError::LeaseNotActive => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidPeriod => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ошибка базы данных".to_string(),
                )
            }
            AppError::Jwt(_) => (StatusCode::UNAUTHORIZED, "Неверный токен".to_string()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Внутренняя ошибка".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_violation_codes_are_stable() {
        assert_eq!(AppError::AlreadyVillager.code(), "ALREADY_VILLAGER");
        assert_eq!(AppError::PendingExists.code(), "PENDING_EXISTS");
        assert_eq!(
            AppError::UnacknowledgedRejection.code(),
            "UNACKNOWLEDGED_REJECTION"
        );
        assert_eq!(AppError::AlreadyDecided.code(), "ALREADY_DECIDED");
        assert_eq!(AppError::UnitUnavailable.code(), "UNIT_UNAVAILABLE");
        assert_eq!(AppError::InvalidPeriod.code(), "INVALID_PERIOD");
    }

    #[test]
    fn not_found_is_not_a_guard_violation() {
        assert_eq!(AppError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_ne!(AppError::NotFound("x".into()).code(), "CONFLICT");
    }
}
