use std::sync::Arc;

use facturas_core::FacturaId;

use crate::error::StoreError;
use crate::factura::{CambiosFactura, Factura, NuevaFactura};

/// Persistence contract for invoices.
///
/// Implementations own atomicity of each individual operation. Nothing here
/// coordinates concurrent writes to the same invoice.
#[async_trait::async_trait]
pub trait FacturaStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Factura>, StoreError>;

    async fn get(&self, id: &FacturaId) -> Result<Option<Factura>, StoreError>;

    /// Persist a new invoice and return its id (generated when the input had none).
    ///
    /// Fails with `ClienteNoEncontrado` for an unknown biller and
    /// `CreacionFallida` when the invoice cannot be stored (e.g. duplicate id).
    async fn create(&self, nueva: NuevaFactura) -> Result<FacturaId, StoreError>;

    async fn update(&self, id: &FacturaId, cambios: CambiosFactura) -> Result<(), StoreError>;

    async fn delete(&self, id: &FacturaId) -> Result<(), StoreError>;

    /// Add `abono` to the amount paid on an invoice.
    async fn abonar(&self, id: &FacturaId, abono: f64) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> FacturaStore for Arc<S>
where
    S: FacturaStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Factura>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: &FacturaId) -> Result<Option<Factura>, StoreError> {
        (**self).get(id).await
    }

    async fn create(&self, nueva: NuevaFactura) -> Result<FacturaId, StoreError> {
        (**self).create(nueva).await
    }

    async fn update(&self, id: &FacturaId, cambios: CambiosFactura) -> Result<(), StoreError> {
        (**self).update(id, cambios).await
    }

    async fn delete(&self, id: &FacturaId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn abonar(&self, id: &FacturaId, abono: f64) -> Result<(), StoreError> {
        (**self).abonar(id, abono).await
    }
}
