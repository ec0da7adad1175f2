// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: bearer token, resolved into a RequestContext by
// jwt_auth_middleware. Routes that admit only some categories also carry a
// Permit layer; ownership checks happen inside the handlers.
// Route Prefix: /api/v1/{auth,employees,tasks,leaves,announcements,ai}

pub mod ai;
pub mod announcements;
pub mod auth;
pub mod employees;
pub mod leaves;
pub mod tasks;

pub use auth::{session_logout, session_me};
