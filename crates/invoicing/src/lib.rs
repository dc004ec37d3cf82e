//! Invoicing domain module.
//!
//! Invoice (factura) records, the inputs that create and change them, and the
//! `FacturaStore` contract every persistence backend implements. No IO here.

pub mod error;
pub mod factura;
pub mod store;

pub use error::{ErrorKind, StoreError};
pub use factura::{CambiosFactura, Factura, NuevaFactura, ProductoFactura, calcular_total, validar_abono};
pub use store::FacturaStore;
