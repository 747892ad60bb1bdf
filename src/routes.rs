// src/routes.rs

use axum::{
    Router,
    handler::Handler,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::{admin, auth, exam, paper, video},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public: registration, login, logout and password reset.
/// * Every other route needs a session; role guards sit on the routes that
///   need them and run after `auth_middleware`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let require_session = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let teacher_only = middleware::from_fn(teacher_middleware);
    let student_only = middleware::from_fn(student_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/reset-password", post(auth::reset_password))
        .merge(
            Router::new()
                .route("/verify", get(auth::verify))
                .route_layer(require_session.clone()),
        );

    let user_routes = Router::new()
        .route("/{id}", get(auth::get_user))
        .route_layer(require_session.clone());

    let paper_routes = Router::new()
        .route(
            "/",
            get(paper::list_papers).post(paper::create_paper.layer(teacher_only.clone())),
        )
        .route("/{id}", get(paper::get_paper))
        .route_layer(require_session.clone());

    let exam_routes = Router::new()
        .route("/submit", post(exam::submit_exam.layer(student_only.clone())))
        .route("/mine", get(exam::my_solutions.layer(student_only)))
        .route("/stats/{paper_id}", get(exam::exam_stats))
        .route("/solutions/{id}", get(exam::get_solution))
        .route_layer(require_session.clone());

    let video_routes = Router::new()
        .route(
            "/",
            get(video::list_videos).post(video::create_video.layer(teacher_only)),
        )
        .route_layer(require_session.clone());

    // Auth first, then the admin check
    let admin_routes = Router::new()
        .route("/check-auth", get(admin::check_auth))
        .route("/stats", get(admin::stats))
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(require_session)
        .merge(Router::new().route("/logout", post(admin::logout)));

    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/papers", paper_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/videos", video_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the configured frontend origins.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
