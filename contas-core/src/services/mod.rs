//! Business logic service layer

mod auth_service;

pub use auth_service::AuthService;
