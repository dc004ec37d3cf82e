//! Store outcome model.
//!
//! Every store operation either succeeds or fails with a `StoreError`. The
//! `Display` text of the domain variants is the exact message returned to API
//! clients; `Backend` carries the underlying cause for logs only.

use thiserror::Error;

/// Broad category of a store failure, used to pick a response status.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The invoice or biller does not exist.
    NotFound,
    /// The store refused the operation.
    Rejected,
    /// The store itself failed (connection, serialization, bug).
    System,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cliente no encontrado")]
    ClienteNoEncontrado,

    #[error("Factura no encontrada")]
    FacturaNoEncontrada,

    #[error("Error al crear la factura")]
    CreacionFallida,

    #[error("Error al actualizar la factura")]
    ActualizacionFallida,

    #[error("Error al eliminar la factura")]
    EliminacionFallida,

    #[error("Error al abonar la factura")]
    AbonoFallido,

    #[error("store backend failure: {0:#}")]
    Backend(#[source] anyhow::Error),
}

impl StoreError {
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::Backend(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::ClienteNoEncontrado | StoreError::FacturaNoEncontrada => ErrorKind::NotFound,
            StoreError::CreacionFallida
            | StoreError::ActualizacionFallida
            | StoreError::EliminacionFallida
            | StoreError::AbonoFallido => ErrorKind::Rejected,
            StoreError::Backend(_) => ErrorKind::System,
        }
    }
}
