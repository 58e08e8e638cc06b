use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, approve_request, deny_request, get_book_queue, list_open_loans, list_pending_books,
    list_requests, list_strike_history, record_return, set_book_status, submit_request,
};

/// Creates the API router with all circulation endpoints
///
/// Command endpoints (Write operations):
/// - POST /requests - Submit a borrow request
/// - POST /requests/:id/approve - Approve a request and open a loan
/// - POST /requests/:id/deny - Deny a request
/// - POST /loans/:id/return - Record a return
/// - POST /books/:id/status - Override a book status (admin)
///
/// Query endpoints (Read operations):
/// - GET /requests?member_id=... - Request history for a member
/// - GET /requests/pending - Books with pending requests
/// - GET /books/:id/queue - Ranked waitlist for a book
/// - GET /loans/active - Open loans with due-date annotations
/// - GET /strikes - Strike history
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Command endpoints (Write operations)
        .route("/requests", post(submit_request))
        .route("/requests/:id/approve", post(approve_request))
        .route("/requests/:id/deny", post(deny_request))
        .route("/loans/:id/return", post(record_return))
        .route("/books/:id/status", post(set_book_status))
        // Query endpoints (Read operations)
        .route("/requests", get(list_requests))
        .route("/requests/pending", get(list_pending_books))
        .route("/books/:id/queue", get(get_book_queue))
        .route("/loans/active", get(list_open_loans))
        .route("/strikes", get(list_strike_history))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
