use axum::Router;

pub mod categories;
pub mod products;
pub mod system;

/// Router for all `/api` endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/api/products", products::router())
        .nest("/api/categories", categories::router())
        .merge(system::router())
}
