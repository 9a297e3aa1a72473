//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth_login))
        .route("/register", post(handlers::auth_register))
        .route("/logout", post(handlers::auth_logout))
        .route("/me", get(handlers::auth_me));

    let book_routes = Router::new()
        .route("/", post(handlers::book_save).get(handlers::book_list))
        .route("/{id}", get(handlers::book_get))
        .route("/owner", get(handlers::book_list_owned))
        .route("/borrowed", get(handlers::book_list_borrowed))
        .route("/returned", get(handlers::book_list_returned))
        .route("/shareable/{id}", patch(handlers::book_toggle_shareable))
        .route("/archived/{id}", patch(handlers::book_toggle_archived))
        // Borrow workflow
        .route("/borrow/{id}", post(handlers::book_borrow))
        .route("/borrow/return/{id}", patch(handlers::book_return))
        .route(
            "/borrow/return/approve/{id}",
            patch(handlers::book_approve_return),
        )
        // Cover photos
        .route(
            "/cover/{id}",
            post(handlers::book_upload_cover).get(handlers::book_cover),
        );

    let feedback_routes = Router::new()
        .route("/", post(handlers::feedback_save))
        .route("/book/{id}", get(handlers::feedback_list));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/books", book_routes)
        .nest("/api/feedbacks", feedback_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
