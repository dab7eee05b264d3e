//! Request middleware.
//!
//! Purpose: define middleware for request lifecycle concerns: trace
//! identifiers and the session gate in front of every route.

pub mod auth_gateway;
pub mod trace;

pub use auth_gateway::AuthGateway;
pub use trace::Trace;
