//! Application services used by the HTTP layer.

pub mod auth;
pub mod web_push;

pub use auth::{AuthError, AuthService};
pub use web_push::WebPushSender;
