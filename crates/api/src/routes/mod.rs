//! HTTP route handlers.

pub mod auth;
pub mod health;
pub mod locations;
pub mod push;
pub mod reminders;
