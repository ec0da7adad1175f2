pub mod list_service;

pub use list_service::{ListService, Populate, NAME_ONLY};
