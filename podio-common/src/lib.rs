//! # Podio Common Library
//!
//! Shared code for the Podio public-talk scheduling service:
//! - Database schema, models and repositories
//! - Bulk talk-list import parser
//! - Credential hashing and session helpers
//! - Configuration loading
//! - Error types

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod import;

pub use error::{Error, Result};
