use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use facturas_invoicing::{ErrorKind, StoreError};

/// Message returned for any request body that fails validation.
pub const FALTAN_DATOS: &str = "Faltan datos";

/// Handler operation, used to pick the generic 500 message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    Pay,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Error al obtener facturas",
            Operation::Get => "Error al obtener factura",
            Operation::Create => "Error al crear factura",
            Operation::Update => "Error al actualizar factura",
            Operation::Delete => "Error al eliminar factura",
            Operation::Pay => "Error al abonar factura",
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

pub fn validation_error() -> Response {
    json_error(StatusCode::BAD_REQUEST, FALTAN_DATOS)
}

/// Map a store failure to a response.
///
/// Domain failures pass their message through. System failures are logged
/// with full detail and answered with the operation's generic message.
pub fn store_error_to_response(operation: Operation, err: StoreError) -> Response {
    match err.kind() {
        ErrorKind::NotFound => json_error(StatusCode::NOT_FOUND, err.to_string()),
        ErrorKind::Rejected => json_error(StatusCode::BAD_REQUEST, err.to_string()),
        ErrorKind::System => {
            tracing::error!(?operation, error = %err, "invoice store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, operation.failure_message())
        }
    }
}
