use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use facturas_core::{FacturaId, FacturadorId};
use facturas_invoicing::{CambiosFactura, Factura, FacturaStore, NuevaFactura, StoreError};

/// In-memory invoice store for tests/dev.
///
/// Billers must be registered up front; creating an invoice for an unknown
/// biller fails with `ClienteNoEncontrado`.
#[derive(Debug, Default)]
pub struct InMemoryFacturaStore {
    facturas: RwLock<HashMap<FacturaId, Factura>>,
    facturadores: RwLock<HashSet<FacturadorId>>,
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::backend(anyhow::anyhow!("in-memory store lock poisoned"))
}

impl InMemoryFacturaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facturadores(facturadores: impl IntoIterator<Item = FacturadorId>) -> Self {
        let store = Self::new();
        if let Ok(mut set) = store.facturadores.write() {
            set.extend(facturadores);
        }
        store
    }

    pub fn register_facturador(&self, id: FacturadorId) -> Result<(), StoreError> {
        self.facturadores.write().map_err(poisoned)?.insert(id);
        Ok(())
    }

    fn facturador_exists(&self, id: &FacturadorId) -> Result<bool, StoreError> {
        Ok(self.facturadores.read().map_err(poisoned)?.contains(id))
    }
}

#[async_trait::async_trait]
impl FacturaStore for InMemoryFacturaStore {
    async fn list(&self) -> Result<Vec<Factura>, StoreError> {
        let map = self.facturas.read().map_err(poisoned)?;
        let mut facturas: Vec<Factura> = map.values().cloned().collect();
        facturas.sort_by(|a, b| a.fecha.cmp(&b.fecha).then_with(|| a.id.cmp(&b.id)));
        Ok(facturas)
    }

    async fn get(&self, id: &FacturaId) -> Result<Option<Factura>, StoreError> {
        let map = self.facturas.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn create(&self, nueva: NuevaFactura) -> Result<FacturaId, StoreError> {
        if !self.facturador_exists(&nueva.id_facturador)? {
            return Err(StoreError::ClienteNoEncontrado);
        }

        let id = nueva.id.clone().unwrap_or_else(FacturaId::generate);
        let mut map = self.facturas.write().map_err(poisoned)?;
        if map.contains_key(&id) {
            tracing::debug!(factura_id = %id, "duplicate invoice id");
            return Err(StoreError::CreacionFallida);
        }
        let factura = nueva.into_factura(id.clone())?;
        map.insert(id.clone(), factura);
        Ok(id)
    }

    async fn update(&self, id: &FacturaId, cambios: CambiosFactura) -> Result<(), StoreError> {
        let mut map = self.facturas.write().map_err(poisoned)?;
        let factura = map.get_mut(id).ok_or(StoreError::FacturaNoEncontrada)?;
        factura.aplicar_cambios(cambios)
    }

    async fn delete(&self, id: &FacturaId) -> Result<(), StoreError> {
        let mut map = self.facturas.write().map_err(poisoned)?;
        match map.remove(id) {
            Some(_) => Ok(()),
            None => {
                tracing::debug!(factura_id = %id, "delete of unknown invoice");
                Err(StoreError::EliminacionFallida)
            }
        }
    }

    async fn abonar(&self, id: &FacturaId, abono: f64) -> Result<(), StoreError> {
        let mut map = self.facturas.write().map_err(poisoned)?;
        let factura = map.get_mut(id).ok_or(StoreError::FacturaNoEncontrada)?;
        factura.registrar_abono(abono)
    }
}
