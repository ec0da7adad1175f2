pub mod ai;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, require_permit, Permit};
use crate::state::AppState;

/// The full HTTP application: versioned API under `/api/v1`, the banner and
/// health probe, and uploaded files under the configured public path.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .merge(auth_public_routes())
        .merge(protected_routes().route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware)));

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .nest("/api/v1", api)
        .nest_service(
            &config.storage.public_path,
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .service(ServeDir::new(&config.storage.upload_dir)),
        )
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
                .layer(cors_layer(&config.security)),
        )
        .with_state(state);

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(public::register_post))
        .route("/auth/login", post(public::login_post))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(employee_routes())
        .merge(task_routes())
        .merge(leave_routes())
        .merge(announcement_routes())
        .merge(ai_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(protected::session_me))
        .route("/auth/logout", get(protected::session_logout))
}

fn employee_routes() -> Router<AppState> {
    use protected::employees;
    let admin = || from_fn_with_state(Permit::ADMIN_ONLY, require_permit);

    Router::new()
        .route(
            "/employees",
            get(employees::list.layer(admin())).post(employees::create.layer(admin())),
        )
        .route("/employees/profile", put(employees::update_profile))
        .route(
            "/employees/:id",
            get(employees::get.layer(admin()))
                .put(employees::update.layer(admin()))
                .delete(employees::delete.layer(admin())),
        )
}

fn task_routes() -> Router<AppState> {
    use protected::tasks;
    let managers = || from_fn_with_state(Permit::MANAGERS, require_permit);

    Router::new()
        .route("/tasks", get(tasks::list).post(tasks::create.layer(managers())))
        .route(
            "/tasks/:id",
            get(tasks::get)
                .put(tasks::update)
                .delete(tasks::delete.layer(managers())),
        )
}

fn leave_routes() -> Router<AppState> {
    use protected::leaves;
    let managers = || from_fn_with_state(Permit::MANAGERS, require_permit);

    Router::new()
        .route("/leaves", get(leaves::list.layer(managers())).post(leaves::create))
        .route(
            "/leaves/:id",
            get(leaves::get)
                .put(leaves::update.layer(managers()))
                .delete(leaves::delete),
        )
}

fn announcement_routes() -> Router<AppState> {
    use protected::announcements;
    let admin = || from_fn_with_state(Permit::ADMIN_ONLY, require_permit);

    Router::new()
        .route(
            "/announcements",
            get(announcements::list).post(announcements::create.layer(admin())),
        )
        .route(
            "/announcements/:id",
            get(announcements::get)
                .put(announcements::update.layer(admin()))
                .delete(announcements::delete.layer(admin())),
        )
}

fn ai_routes() -> Router<AppState> {
    use protected::ai;
    let admin = || from_fn_with_state(Permit::ADMIN_ONLY, require_permit);
    let managers = || from_fn_with_state(Permit::MANAGERS, require_permit);

    Router::new()
        .route("/ai/job-recommendations", post(ai::job_recommendations))
        .route(
            "/ai/performance-suggestions",
            post(ai::performance_suggestions.layer(managers())),
        )
        .route("/ai/best-employee", get(ai::best_employee.layer(admin())))
        .route("/ai/chat", post(ai::chat.layer(admin())))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
