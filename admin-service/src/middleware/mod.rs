pub mod auth;

pub use auth::{CurrentUser, auth_middleware, authenticate_bearer};
