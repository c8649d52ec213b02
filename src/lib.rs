pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CsvLedgerStore, MemoryLedgerStore, PgLedgerStore};
pub use config::cli::LocalStorage;
pub use config::tariff::Tariff;
pub use config::toml_config::{AppConfig, Backend};
pub use core::ledger::LedgerService;
pub use core::pricing::{calculate_income, AttendanceRequest};
pub use utils::error::{LedgerError, Result};
