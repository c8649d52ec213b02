// Adapters layer: concrete ledger stores behind the `LedgerStore` port.

pub mod csv_store;
pub mod memory;
pub mod postgres;

pub use csv_store::CsvLedgerStore;
pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;
