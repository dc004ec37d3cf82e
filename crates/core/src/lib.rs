//! `facturas-core` — shared building blocks for the invoicing service.
//!
//! Identifiers and the domain error type. No IO, no HTTP, no storage.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{FacturaId, FacturadorId};
