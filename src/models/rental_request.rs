use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::UserRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "rental_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RentalRequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Заявка на аренду. Анкета заявителя копируется в момент подачи,
/// поэтому последующие правки профиля не меняют уже поданную заявку.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RentalRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub unit_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub occupation: Option<String>,
    pub emergency_contact: Option<String>,
    pub lease_duration_months: i32,
    pub status: RentalRequestStatus,
    pub request_date: DateTime<Utc>,
    pub decision_date: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub rejection_acknowledged: bool,
    pub resulting_lease_id: Option<Uuid>,
}

/// Явное состояние заявки. Невозможные комбинации колонок
/// (approved без договора, rejected без причины) сюда не представимы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Approved { lease_id: Uuid },
    Rejected { reason: String, acknowledged: bool },
}

impl RentalRequest {
    pub fn state(&self) -> AppResult<RequestState> {
        Ok(match self.status {
            RentalRequestStatus::Pending => RequestState::Pending,
            RentalRequestStatus::Approved => RequestState::Approved {
                lease_id: self.resulting_lease_id.ok_or_else(|| {
                    AppError::Internal(format!(
                        "approved request {} has no resulting lease",
                        self.id
                    ))
                })?,
            },
            RentalRequestStatus::Rejected => RequestState::Rejected {
                reason: self
                    .rejection_reason
                    .clone()
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "rejected request {} has no rejection reason",
                            self.id
                        ))
                    })?,
                acknowledged: self.rejection_acknowledged,
            },
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RentalRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub unit_id: Uuid,
    pub unit_number: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub occupation: Option<String>,
    pub emergency_contact: Option<String>,
    pub lease_duration_months: i32,
    pub status: RentalRequestStatus,
    pub request_date: DateTime<Utc>,
    pub decision_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejection_acknowledged: bool,
    pub resulting_lease_id: Option<Uuid>,
}

impl From<RentalRequest> for RentalRequestResponse {
    fn from(req: RentalRequest) -> Self {
        Self {
            id: req.id,
            user_id: req.user_id,
            unit_id: req.unit_id,
            unit_number: None,
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            occupation: req.occupation,
            emergency_contact: req.emergency_contact,
            lease_duration_months: req.lease_duration_months,
            status: req.status,
            request_date: req.request_date,
            decision_date: req.decision_date,
            rejection_reason: req.rejection_reason,
            rejection_acknowledged: req.rejection_acknowledged,
            resulting_lease_id: req.resulting_lease_id,
        }
    }
}

/// Проекция доступности бронирования для опрашивающего клиента.
/// Пересчитывается на каждый запрос, ничего не кэшируется.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingEligibility {
    pub can_create_new_request: bool,
    pub is_pending: bool,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub requires_acknowledgement: bool,
    pub has_active_lease: bool,
    pub latest_request: Option<RentalRequestResponse>,
}

impl BookingEligibility {
    pub fn derive(role: UserRole, latest: Option<RentalRequest>) -> Self {
        let is_villager = role == UserRole::Villager;
        let (is_pending, is_approved, is_rejected, acknowledged) = match latest.as_ref() {
            None => (false, false, false, false),
            Some(req) => (
                req.status == RentalRequestStatus::Pending,
                req.status == RentalRequestStatus::Approved,
                req.status == RentalRequestStatus::Rejected,
                req.rejection_acknowledged,
            ),
        };

        // Заявитель может подать новую заявку, если он не жилец и
        // последняя заявка не висит на рассмотрении и не ждёт
        // подтверждения отказа. Approved при роли user означает, что
        // прежний договор уже завершён: роль здесь источник истины.
        let can_create_new_request = !is_villager
            && !is_pending
            && !(is_rejected && !acknowledged);

        Self {
            can_create_new_request,
            is_pending,
            is_approved,
            is_rejected,
            requires_acknowledgement: is_rejected && !acknowledged,
            has_active_lease: is_villager,
            latest_request: latest.map(RentalRequestResponse::from),
        }
    }
}

// DTOs
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitRentalRequest {
    pub unit_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 32))]
    pub phone: String,
    pub occupation: Option<String>,
    pub emergency_contact: Option<String>,
    #[validate(range(min = 1, max = 60))]
    pub lease_duration_months: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRentalRequest {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRentalRequest {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: RentalRequestStatus, acknowledged: bool) -> RentalRequest {
        RentalRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            unit_id: Uuid::new_v4(),
            full_name: "Иван Иванов".to_string(),
            email: "ivan@example.com".to_string(),
            phone: "+77001234567".to_string(),
            occupation: None,
            emergency_contact: None,
            lease_duration_months: 12,
            status,
            request_date: Utc::now(),
            decision_date: None,
            decided_by: None,
            rejection_reason: match status {
                RentalRequestStatus::Rejected => Some("неполный пакет документов".to_string()),
                _ => None,
            },
            rejection_acknowledged: acknowledged,
            resulting_lease_id: match status {
                RentalRequestStatus::Approved => Some(Uuid::new_v4()),
                _ => None,
            },
        }
    }

    #[test]
    fn no_request_allows_submission() {
        let view = BookingEligibility::derive(UserRole::User, None);
        assert!(view.can_create_new_request);
        assert!(!view.is_pending);
        assert!(!view.is_approved);
        assert!(!view.is_rejected);
        assert!(!view.requires_acknowledgement);
        assert!(!view.has_active_lease);
    }

    #[test]
    fn villager_cannot_submit_regardless_of_history() {
        let view = BookingEligibility::derive(UserRole::Villager, None);
        assert!(!view.can_create_new_request);
        assert!(view.has_active_lease);

        let view = BookingEligibility::derive(
            UserRole::Villager,
            Some(request(RentalRequestStatus::Approved, false)),
        );
        assert!(!view.can_create_new_request);
        assert!(view.is_approved);
        assert!(view.has_active_lease);
    }

    #[test]
    fn pending_request_blocks_submission() {
        let view = BookingEligibility::derive(
            UserRole::User,
            Some(request(RentalRequestStatus::Pending, false)),
        );
        assert!(!view.can_create_new_request);
        assert!(view.is_pending);
        assert!(!view.requires_acknowledgement);
    }

    #[test]
    fn unacknowledged_rejection_blocks_until_acknowledged() {
        let view = BookingEligibility::derive(
            UserRole::User,
            Some(request(RentalRequestStatus::Rejected, false)),
        );
        assert!(!view.can_create_new_request);
        assert!(view.is_rejected);
        assert!(view.requires_acknowledgement);

        let view = BookingEligibility::derive(
            UserRole::User,
            Some(request(RentalRequestStatus::Rejected, true)),
        );
        assert!(view.can_create_new_request);
        assert!(view.is_rejected);
        assert!(!view.requires_acknowledgement);
    }

    #[test]
    fn approved_with_demoted_role_means_lease_ended() {
        // Роль user при approved-заявке означает завершённый договор
        let view = BookingEligibility::derive(
            UserRole::User,
            Some(request(RentalRequestStatus::Approved, false)),
        );
        assert!(view.can_create_new_request);
        assert!(view.is_approved);
        assert!(!view.has_active_lease);
    }

    #[test]
    fn state_maps_columns_to_tagged_union() {
        let req = request(RentalRequestStatus::Pending, false);
        assert_eq!(req.state().unwrap(), RequestState::Pending);

        let req = request(RentalRequestStatus::Approved, false);
        match req.state().unwrap() {
            RequestState::Approved { lease_id } => {
                assert_eq!(Some(lease_id), req.resulting_lease_id)
            }
            other => panic!("unexpected state: {:?}", other),
        }

        let req = request(RentalRequestStatus::Rejected, true);
        assert_eq!(
            req.state().unwrap(),
            RequestState::Rejected {
                reason: "неполный пакет документов".to_string(),
                acknowledged: true
            }
        );
    }

    #[test]
    fn state_rejects_impossible_column_combinations() {
        let mut req = request(RentalRequestStatus::Approved, false);
        req.resulting_lease_id = None;
        assert!(req.state().is_err());

        let mut req = request(RentalRequestStatus::Rejected, false);
        req.rejection_reason = None;
        assert!(req.state().is_err());

        let mut req = request(RentalRequestStatus::Rejected, false);
        req.rejection_reason = Some(String::new());
        assert!(req.state().is_err());
    }
}
