//! Database access layer for Podio
//!
//! Schema creation lives in [`init`], domain structs in [`models`].
//! The catalog repository ([`catalog`]) owns the transactional import
//! path; [`schedule`] owns the completion transaction that moves an
//! agenda entry into the history log.

pub mod catalog;
pub mod init;
pub mod models;
pub mod schedule;

pub use init::init_database;
