pub mod session;

// Re-export handler functions for use in routing
pub use session::logout as session_logout;
pub use session::me as session_me;
