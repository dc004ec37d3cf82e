//! Strongly-typed identifiers used across the domain.
//!
//! Invoice and biller ids are opaque strings chosen by clients (or generated
//! by the store), so these wrap `String` rather than `Uuid`.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of an invoice (factura).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacturaId(String);

/// Identifier of the biller (facturador) an invoice is issued against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacturadorId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_newtype!(FacturaId, "FacturaId");
impl_string_newtype!(FacturadorId, "FacturadorId");

impl FacturaId {
    /// Generate a fresh identifier for invoices created without one.
    ///
    /// Uses UUIDv7 so generated ids sort by creation time.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}
