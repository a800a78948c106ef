use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rentora API",
        version = "1.0.0",
        description = "Backend API для Rentora - платформы управления арендным жильём",
        contact(
            name = "Rentora Team",
            email = "support@rentora.app"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Аутентификация и авторизация"),
        (name = "users", description = "Профиль пользователя"),
        (name = "units", description = "Квартиры"),
        (name = "rental-requests", description = "Заявки на аренду: подача, рассмотрение, подтверждение отказа"),
        (name = "leases", description = "Договоры аренды"),
        (name = "maintenance", description = "Заявки на ремонт и обслуживание")
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::refresh_token,
        crate::api::auth::logout,
        // Users
        crate::api::users::get_me,
        crate::api::users::update_me,
        crate::api::users::list_users,
        // Units
        crate::api::units::list_units,
        crate::api::units::get_unit,
        crate::api::units::create_unit,
        crate::api::units::update_unit,
        crate::api::units::update_unit_status,
        // Rental requests
        crate::api::rental_requests::submit_request,
        crate::api::rental_requests::my_status,
        crate::api::rental_requests::my_requests,
        crate::api::rental_requests::list_requests,
        crate::api::rental_requests::approve_request,
        crate::api::rental_requests::reject_request,
        crate::api::rental_requests::acknowledge_rejection,
        // Leases
        crate::api::leases::list_leases,
        crate::api::leases::my_leases,
        crate::api::leases::get_lease,
        crate::api::leases::terminate_lease,
        // Maintenance
        crate::api::maintenance::list_tickets,
        crate::api::maintenance::create_ticket,
        crate::api::maintenance::get_ticket,
        crate::api::maintenance::update_status,
    ),
    components(
        schemas(
            // Auth
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::AuthResponse,
            crate::models::RefreshTokenRequest,
            crate::models::TokenResponse,
            crate::models::UserPublic,
            crate::models::UserRole,
            crate::models::UpdateUserRequest,
            crate::api::auth::LogoutResponse,
            // Units
            crate::models::UnitResponse,
            crate::models::UnitStatus,
            crate::models::CreateUnitRequest,
            crate::models::UpdateUnitRequest,
            crate::models::UpdateUnitStatusRequest,
            // Rental requests
            crate::models::RentalRequestStatus,
            crate::models::RentalRequestResponse,
            crate::models::SubmitRentalRequest,
            crate::models::ApproveRentalRequest,
            crate::models::RejectRentalRequest,
            crate::models::BookingEligibility,
            crate::api::rental_requests::ApproveResponse,
            // Leases
            crate::models::LeaseStatus,
            crate::models::LeaseResponse,
            // Maintenance
            crate::models::MaintenanceCategory,
            crate::models::MaintenanceStatus,
            crate::models::MaintenanceTicketResponse,
            crate::models::CreateMaintenanceTicket,
            crate::models::UpdateMaintenanceStatusRequest,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
