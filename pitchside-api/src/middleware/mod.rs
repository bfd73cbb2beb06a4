pub mod auth;

pub use auth::{owner_auth_middleware, user_auth_middleware, Claims};
