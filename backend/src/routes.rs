use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{docs, handlers, middleware, state::AppState};

pub fn build_router(state: AppState) -> Router {
    // Build public routes (no session)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::request_login))
        .route("/login/{token}", get(handlers::auth::verify_login));

    // Build session-protected routes
    let protected_routes = Router::new()
        .route("/logout", get(handlers::auth::logout))
        .route(
            "/medicine",
            post(handlers::medicine::create_medicine).put(handlers::medicine::update_medicine),
        )
        // {id} is the account id for GET and the medicine id for DELETE.
        .route(
            "/medicine/{id}",
            get(handlers::medicine::list_medicines).delete(handlers::medicine::delete_medicine),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                )
                .layer(axum_middleware::from_fn(
                    middleware::logging::log_error_responses,
                )),
        )
        .with_state(state)
}
