use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    period_is_valid, BookingEligibility, Lease, LeaseStatus, RentalRequest, RentalRequestStatus,
    RequestState, SubmitRentalRequest, Unit, UnitStatus, User, UserRole,
};
use crate::services::AuthService;

/// Движок жизненного цикла заявок на аренду.
///
/// Все переходы выполняются в одной транзакции: заявка, договор,
/// роль пользователя и статус квартиры меняются вместе или никак.
pub struct RentalService;

impl RentalService {
    /// Подача заявки. Проверки и вставка сериализуются блокировкой строки
    /// пользователя; частичный уникальный индекс по PENDING страхует от
    /// гонки двух параллельных подач.
    pub async fn submit_request(
        pool: &PgPool,
        user_id: Uuid,
        payload: &SubmitRentalRequest,
    ) -> AppResult<RentalRequest> {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

        if user.role == UserRole::Villager {
            return Err(AppError::AlreadyVillager);
        }

        let unit_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM units WHERE id = $1")
            .bind(payload.unit_id)
            .fetch_optional(&mut *tx)
            .await?;
        if unit_exists.is_none() {
            return Err(AppError::NotFound("Квартира не найдена".to_string()));
        }

        if let Some(latest) = Self::latest_request_tx(&mut tx, user_id).await? {
            match latest.status {
                RentalRequestStatus::Pending => return Err(AppError::PendingExists),
                RentalRequestStatus::Rejected if !latest.rejection_acknowledged => {
                    return Err(AppError::UnacknowledgedRejection);
                }
                _ => {}
            }
        }

        let request = sqlx::query_as::<_, RentalRequest>(
            r#"
            INSERT INTO rental_requests
                (user_id, unit_id, full_name, email, phone, occupation,
                 emergency_contact, lease_duration_months, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(payload.unit_id)
        .bind(&payload.full_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.occupation)
        .bind(&payload.emergency_contact)
        .bind(payload.lease_duration_months)
        .fetch_one(&mut *tx)
        .await
        .map_err(Self::map_pending_conflict)?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request.id,
            user_id = %user_id,
            unit_id = %payload.unit_id,
            "rental request submitted"
        );

        Ok(request)
    }

    /// Проекция доступности бронирования. Считается заново на каждый
    /// вызов: кэш здесь приводит либо к двойной подаче, либо к
    /// «застрявшему» пользователю.
    pub async fn latest_request_status(
        pool: &PgPool,
        user_id: Uuid,
    ) -> AppResult<BookingEligibility> {
        let user = AuthService::get_user_by_id(pool, user_id).await?;

        let latest = sqlx::query_as::<_, RentalRequest>(
            r#"
            SELECT * FROM rental_requests
            WHERE user_id = $1
            ORDER BY request_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(BookingEligibility::derive(user.role, latest))
    }

    /// Одобрение заявки: договор, статус заявки, роль заявителя и статус
    /// квартиры меняются в одной транзакции, всё или ничего.
    pub async fn approve_request(
        pool: &PgPool,
        request_id: Uuid,
        admin_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<(RentalRequest, Lease)> {
        if !period_is_valid(start_date, end_date) {
            return Err(AppError::InvalidPeriod);
        }

        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, RentalRequest>(
            "SELECT * FROM rental_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Заявка не найдена".to_string()))?;

        if request.status != RentalRequestStatus::Pending {
            return Err(AppError::AlreadyDecided);
        }

        // Занять квартиру можно только из состояния available; проигравший
        // из двух параллельных одобрений получает UNIT_UNAVAILABLE
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units SET status = 'occupied', updated_at = NOW()
            WHERE id = $1 AND status = 'available'
            RETURNING *
            "#,
        )
        .bind(request.unit_id)
        .fetch_optional(&mut *tx)
        .await?;

        let unit = match unit {
            Some(unit) => unit,
            None => {
                let status: Option<(UnitStatus,)> =
                    sqlx::query_as("SELECT status FROM units WHERE id = $1")
                        .bind(request.unit_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                return Err(match status {
                    None => AppError::NotFound("Квартира не найдена".to_string()),
                    Some(_) => AppError::UnitUnavailable,
                });
            }
        };

        let overlapping: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM leases
            WHERE unit_id = $1 AND status = 'active'
              AND start_date < $3 AND end_date > $2
            LIMIT 1
            "#,
        )
        .bind(unit.id)
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(&mut *tx)
        .await?;
        if overlapping.is_some() {
            return Err(AppError::UnitUnavailable);
        }

        let lease = sqlx::query_as::<_, Lease>(
            r#"
            INSERT INTO leases (unit_id, tenant_id, start_date, end_date, monthly_rent, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING *
            "#,
        )
        .bind(unit.id)
        .bind(request.user_id)
        .bind(start_date)
        .bind(end_date)
        .bind(unit.rent_amount)
        .fetch_one(&mut *tx)
        .await?;

        // CAS по статусу: переход выполняется только из PENDING
        let request = sqlx::query_as::<_, RentalRequest>(
            r#"
            UPDATE rental_requests
            SET status = 'approved', decision_date = NOW(),
                decided_by = $2, resulting_lease_id = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(admin_id)
        .bind(lease.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::AlreadyDecided)?;

        sqlx::query("UPDATE users SET role = 'villager', updated_at = NOW() WHERE id = $1")
            .bind(request.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request.id,
            lease_id = %lease.id,
            unit_id = %unit.id,
            tenant_id = %request.user_id,
            "rental request approved"
        );

        Ok((request, lease))
    }

    /// Отклонение заявки: одиночное условное обновление, другие сущности
    /// не затрагиваются.
    pub async fn reject_request(
        pool: &PgPool,
        request_id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> AppResult<RentalRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "Причина отказа обязательна".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, RentalRequest>(
            r#"
            UPDATE rental_requests
            SET status = 'rejected', decision_date = NOW(), decided_by = $2,
                rejection_reason = $3, rejection_acknowledged = false
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(admin_id)
        .bind(reason)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(request) => {
                tracing::info!(request_id = %request.id, "rental request rejected");
                Ok(request)
            }
            None => {
                let exists: Option<(Uuid,)> =
                    sqlx::query_as("SELECT id FROM rental_requests WHERE id = $1")
                        .bind(request_id)
                        .fetch_optional(pool)
                        .await?;
                Err(match exists {
                    None => AppError::NotFound("Заявка не найдена".to_string()),
                    Some(_) => AppError::AlreadyDecided,
                })
            }
        }
    }

    /// Подтверждение ознакомления с отказом. Идемпотентно: повторный вызов
    /// по уже подтверждённой заявке возвращает успех без побочных эффектов.
    pub async fn acknowledge_rejection(
        pool: &PgPool,
        request_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<RentalRequest> {
        let request = sqlx::query_as::<_, RentalRequest>(
            "SELECT * FROM rental_requests WHERE id = $1 AND user_id = $2",
        )
        .bind(request_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Заявка не найдена".to_string()))?;

        match request.state()? {
            RequestState::Rejected { acknowledged, .. } => {
                if acknowledged {
                    return Ok(request);
                }
            }
            _ => {
                return Err(AppError::BadRequest(
                    "Подтвердить можно только отклонённую заявку".to_string(),
                ));
            }
        }

        let request = sqlx::query_as::<_, RentalRequest>(
            r#"
            UPDATE rental_requests
            SET rejection_acknowledged = true
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(request)
    }

    /// Расторжение договора симметрично одобрению: договор,
    /// квартира и роль жильца в одной транзакции. Роль понижается, только
    /// когда у жильца не осталось других активных договоров.
    pub async fn terminate_lease(pool: &PgPool, lease_id: Uuid) -> AppResult<Lease> {
        let mut tx = pool.begin().await?;

        let lease = sqlx::query_as::<_, Lease>("SELECT * FROM leases WHERE id = $1 FOR UPDATE")
            .bind(lease_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Договор не найден".to_string()))?;

        if lease.status != LeaseStatus::Active {
            return Err(AppError::LeaseNotActive);
        }

        let lease = sqlx::query_as::<_, Lease>(
            r#"
            UPDATE leases SET status = 'terminated', terminated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lease_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE units SET status = 'available', updated_at = NOW()
            WHERE id = $1 AND status = 'occupied'
              AND NOT EXISTS (
                  SELECT 1 FROM leases WHERE unit_id = $1 AND status = 'active'
              )
            "#,
        )
        .bind(lease.unit_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users SET role = 'user', updated_at = NOW()
            WHERE id = $1 AND role = 'villager'
              AND NOT EXISTS (
                  SELECT 1 FROM leases WHERE tenant_id = $1 AND status = 'active'
              )
            "#,
        )
        .bind(lease.tenant_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(lease_id = %lease.id, unit_id = %lease.unit_id, "lease terminated");

        Ok(lease)
    }

    async fn latest_request_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
    ) -> AppResult<Option<RentalRequest>> {
        let latest = sqlx::query_as::<_, RentalRequest>(
            r#"
            SELECT * FROM rental_requests
            WHERE user_id = $1
            ORDER BY request_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(latest)
    }

    /// Нарушение частичного уникального индекса "одна PENDING-заявка на
    /// пользователя" означает, что параллельная подача успела раньше
    fn map_pending_conflict(err: sqlx::Error) -> AppError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.constraint() == Some("rental_requests_one_pending_per_user") {
                return AppError::PendingExists;
            }
        }
        AppError::Database(err)
    }
}
