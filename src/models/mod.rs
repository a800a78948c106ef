pub mod lease;
pub mod maintenance;
pub mod rental_request;
pub mod unit;
pub mod user;

pub use lease::{period_is_valid, Lease, LeaseResponse, LeaseStatus};
pub use maintenance::{
    CreateMaintenanceTicket, MaintenanceCategory, MaintenanceStatus, MaintenanceTicket,
    MaintenanceTicketResponse, UpdateMaintenanceStatusRequest,
};
pub use rental_request::{
    ApproveRentalRequest, BookingEligibility, RejectRentalRequest, RentalRequest,
    RentalRequestResponse, RentalRequestStatus, RequestState, SubmitRentalRequest,
};
pub use unit::{
    CreateUnitRequest, Unit, UnitResponse, UnitStatus, UnitsQuery, UpdateUnitRequest,
    UpdateUnitStatusRequest,
};
pub use user::{
    AuthResponse, LoginRequest, RefreshToken, RefreshTokenRequest, RegisterRequest, TokenResponse,
    UpdateUserRequest, User, UserPublic, UserRole,
};
