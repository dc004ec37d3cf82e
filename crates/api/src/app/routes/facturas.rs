//! Invoice (factura) handlers.
//!
//! Each handler validates its input, makes exactly one store call, and maps
//! the outcome to a status code. Invalid input never reaches the store.

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::instrument;

use facturas_core::FacturaId;
use facturas_invoicing::{CambiosFactura, ErrorKind, FacturaStore, NuevaFactura, StoreError};

use crate::app::SharedStore;
use crate::app::dto::{AbonoRequest, ActualizarFacturaRequest, CrearFacturaRequest};
use crate::app::errors::{self, Operation};

pub const FACTURA_CREADA: &str = "Factura creada";
pub const FACTURA_ACTUALIZADA: &str = "Factura actualizada";
pub const FACTURA_ELIMINADA: &str = "Factura eliminada";
pub const ABONO_REGISTRADO: &str = "Abono registrado";

fn message(text: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": text }))).into_response()
}

/// Path ids that cannot be an invoice id behave like ids that do not exist.
fn parse_id(raw: &str) -> Result<FacturaId, StoreError> {
    raw.parse().map_err(|_| StoreError::FacturaNoEncontrada)
}

#[instrument(skip_all)]
pub async fn list_facturas(Extension(store): Extension<SharedStore>) -> Response {
    match store.list().await {
        Ok(facturas) if facturas.is_empty() => {
            errors::json_error(StatusCode::NOT_FOUND, "No hay facturas")
        }
        Ok(facturas) => (StatusCode::OK, Json(facturas)).into_response(),
        Err(e) => errors::store_error_to_response(Operation::List, e),
    }
}

#[instrument(skip_all, fields(factura_id = %id))]
pub async fn get_factura(
    Extension(store): Extension<SharedStore>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = id.parse::<FacturaId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "Factura no existe");
    };

    match store.get(&id).await {
        Ok(Some(factura)) => (StatusCode::OK, Json(factura)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "Factura no existe"),
        Err(e) => errors::store_error_to_response(Operation::Get, e),
    }
}

#[instrument(skip_all)]
pub async fn create_factura(
    Extension(store): Extension<SharedStore>,
    body: Result<Json<CrearFacturaRequest>, JsonRejection>,
) -> Response {
    let nueva = match body
        .map_err(|e| e.body_text())
        .and_then(|Json(b)| NuevaFactura::try_from(b).map_err(|e| e.to_string()))
    {
        Ok(n) => n,
        Err(reason) => {
            tracing::debug!(%reason, "rejected invoice creation");
            return errors::validation_error();
        }
    };

    match store.create(nueva).await {
        Ok(id) => {
            tracing::info!(factura_id = %id, "invoice created");
            (
                StatusCode::OK,
                Json(json!({ "message": FACTURA_CREADA, "id": id })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(Operation::Create, e),
    }
}

#[instrument(skip_all, fields(factura_id = %id))]
pub async fn update_factura(
    Extension(store): Extension<SharedStore>,
    Path(id): Path<String>,
    body: Result<Json<ActualizarFacturaRequest>, JsonRejection>,
) -> Response {
    let cambios = match body
        .map_err(|e| e.body_text())
        .and_then(|Json(b)| CambiosFactura::try_from(b).map_err(|e| e.to_string()))
    {
        Ok(c) => c,
        Err(reason) => {
            tracing::debug!(%reason, "rejected invoice update");
            return errors::validation_error();
        }
    };

    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::store_error_to_response(Operation::Update, e),
    };

    match store.update(&id, cambios).await {
        Ok(()) => message(FACTURA_ACTUALIZADA),
        Err(e) => errors::store_error_to_response(Operation::Update, e),
    }
}

#[instrument(skip_all, fields(factura_id = %id))]
pub async fn delete_factura(
    Extension(store): Extension<SharedStore>,
    Path(id): Path<String>,
) -> Response {
    // Delete answers 200, 400 or 500 only: an unknown invoice is a failed delete.
    let result = match parse_id(&id) {
        Ok(id) => store.delete(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => message(FACTURA_ELIMINADA),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            errors::store_error_to_response(Operation::Delete, StoreError::EliminacionFallida)
        }
        Err(e) => errors::store_error_to_response(Operation::Delete, e),
    }
}

#[instrument(skip_all, fields(factura_id = %id))]
pub async fn pay_factura(
    Extension(store): Extension<SharedStore>,
    Path(id): Path<String>,
    body: Result<Json<AbonoRequest>, JsonRejection>,
) -> Response {
    let abono = match body
        .map_err(|e| e.body_text())
        .and_then(|Json(b)| b.monto().map_err(|e| e.to_string()))
    {
        Ok(a) => a,
        Err(reason) => {
            tracing::debug!(%reason, "rejected invoice payment");
            return errors::validation_error();
        }
    };

    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::store_error_to_response(Operation::Pay, e),
    };

    match store.abonar(&id, abono).await {
        Ok(()) => message(ABONO_REGISTRADO),
        Err(e) => errors::store_error_to_response(Operation::Pay, e),
    }
}
