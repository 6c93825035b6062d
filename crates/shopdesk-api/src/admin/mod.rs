// Admin backend client: facade, auth flows, health probe.

mod auth;
mod client;
mod health;

pub use auth::is_valid_email;
pub use client::{AdminClient, ApiResponse, ClientConfig, non_empty_params};
pub use health::HealthCheck;
