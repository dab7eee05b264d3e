//! Inbound adapters that translate HTTP requests into domain service calls
//! while keeping framework details at the edge.
//!
//! Handlers, the session cookie layer, and request extractors live under
//! [`http`].

pub mod http;
