pub mod auth;

pub use auth::{auth_middleware, is_admin, is_villager_or_higher, AppState, AuthUser};
