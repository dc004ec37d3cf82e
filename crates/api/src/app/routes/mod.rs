use axum::{
    Router,
    routing::{get, patch},
};

pub mod facturas;
pub mod system;

/// Router for the invoice endpoints.
pub fn router() -> Router {
    Router::new()
        .route(
            "/facturas",
            get(facturas::list_facturas).post(facturas::create_factura),
        )
        .route(
            "/facturas/:id",
            get(facturas::get_factura)
                .patch(facturas::update_factura)
                .delete(facturas::delete_factura),
        )
        .route("/facturas/:id/abono", patch(facturas::pay_factura))
}
