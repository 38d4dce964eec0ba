use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::{handlers, request_context::request_context_middleware, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Define routes
    Router::new()
        .route("/api/posts", get(handlers::list_posts))
        .route("/api/posts/:id", get(handlers::get_post))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/:category_id/posts", get(handlers::list_category_posts))
        .route("/api/archives", get(handlers::list_archives))
        .route("/api/archives/:year/:month/posts", get(handlers::list_month_posts))
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(request_context_middleware))
}
