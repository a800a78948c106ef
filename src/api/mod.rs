pub mod auth;
pub mod leases;
pub mod maintenance;
pub mod rental_requests;
pub mod units;
pub mod users;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/units", units::routes())
        .nest("/rental-requests", rental_requests::routes())
        .nest("/leases", leases::routes())
        .nest("/maintenance", maintenance::routes())
}
