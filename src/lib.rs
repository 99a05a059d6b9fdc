pub mod api;
pub mod assignment;
pub mod config;
pub mod database;
pub mod error;
pub mod services;

pub use error::ServiceError;
