//! HTTP surface of ZoneNotify: auth, reminders, location updates and push.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod services;
