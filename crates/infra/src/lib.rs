//! Infrastructure layer: `FacturaStore` backends.

pub mod store;

pub use store::InMemoryFacturaStore;
#[cfg(feature = "postgres")]
pub use store::PostgresFacturaStore;
