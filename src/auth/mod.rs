use crate::state::AppState;
use axum::Router;

pub mod basic;
pub mod dto;
pub mod error;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use error::{AuthError, StoreError};
pub use extractors::CurrentUser;
pub use repo::{MemoryUserStore, PgUserStore, UserStore};
pub use repo_types::{User, UserLookup, UserUpdate};
pub use services::AuthService;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::profile_routes())
}
