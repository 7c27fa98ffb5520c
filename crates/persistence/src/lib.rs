//! Persistence layer for the ZoneNotify backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the PostgreSQL zone and endpoint stores

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
