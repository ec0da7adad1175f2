// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus the service banner and health probe.
//
// Security Level: None
// Route Prefix: /api/v1/auth/{register,login}, /, /health

pub mod auth;
pub mod status;

pub use auth::{login_post, register_post};
pub use status::{health, root};
