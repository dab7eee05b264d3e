//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL emoji repository using Diesel
//! - **storage**: image bucket over the storage REST API
//! - **generation**: hosted image model and output downloader
//! - **identity**: hosted auth API
//!
//! Adapters translate between wire or row formats and domain types; they hold
//! no business rules.

pub(crate) mod http_support;
pub mod generation;
pub mod identity;
pub mod persistence;
pub mod storage;
