//! Invoice store implementations.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryFacturaStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresFacturaStore;
