//! archiven-server
//!
//! HTTP surface for the archive service: multipart upload, metadata lookup,
//! streamed download and paginated listing.

pub mod api;
pub mod config;
pub mod error;
pub mod store_factory;
