//! HTTP inbound adapter exposing the emoji API and the auth routes.

pub mod auth;
pub mod cache_control;
pub mod emojis;
pub mod error;
pub mod health;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
