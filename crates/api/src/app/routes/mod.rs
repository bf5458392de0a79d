use axum::{Router, routing::post};

pub mod crts;
pub mod render;
pub mod system;

/// Router for all CRT endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/api/crts", crts::router())
        .route("/generate-pdf", post(render::generate_pdf))
}
