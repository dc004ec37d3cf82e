//! HTTP API application wiring (Axum router + store wiring).
//!
//! - `services.rs`: picks and builds the `FacturaStore` backend
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request bodies and their validation into domain inputs
//! - `errors.rs`: consistent `{ "message": ... }` responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use facturas_invoicing::FacturaStore;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Store handle shared by every handler.
pub type SharedStore = Arc<dyn FacturaStore>;

/// Build the full HTTP router around an injected store.
pub fn build_app(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(store)),
        )
}
