//! Shared utilities for the ZoneNotify backend.
//!
//! - Coordinate and reminder field validation
//! - Password hashing with Argon2id
//! - JWT access tokens for authenticated requests

pub mod jwt;
pub mod password;
pub mod validation;
