pub mod auth;
pub mod form;
pub mod permit;
pub mod response;

pub use auth::{jwt_auth_middleware, RequestContext};
pub use form::{FormPayload, UploadedFile};
pub use permit::{require_permit, Permit};
pub use response::{no_cache_headers, ApiResponse, ApiResult, ListResponse};
