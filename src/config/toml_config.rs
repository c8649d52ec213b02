use crate::config::tariff::{Tariff, TariffConfig};
use crate::utils::error::{LedgerError, Result};
use crate::utils::validation::{
    validate_database_url, validate_path, validate_positive_number, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;
pub const DEFAULT_EXPORT_FILENAME: &str = "reporte_control_ingresos.csv";
pub const DEFAULT_LEDGER_FILENAME: &str = "atenciones.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Backend {
    #[default]
    Postgres,
    Csv,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub tariff: TariffConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: Backend,
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub acquire_timeout_seconds: Option<u64>,
    /// Directory holding the ledger file when `backend = "csv"`.
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: Option<String>,
    pub filename: Option<String>,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left
    /// as written so validation can report them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| LedgerError::config(format!("env pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn tariff(&self) -> Result<Tariff> {
        Tariff::from_config(&self.tariff)
    }

    pub fn backend(&self) -> Backend {
        self.database.backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database.url.as_deref()
    }

    pub fn max_connections(&self) -> u32 {
        self.database.max_connections.unwrap_or(5)
    }

    pub fn acquire_timeout_seconds(&self) -> u64 {
        self.database.acquire_timeout_seconds.unwrap_or(10)
    }

    pub fn data_dir(&self) -> &str {
        self.database.data_dir.as_deref().unwrap_or("./data")
    }

    pub fn cache_ttl_seconds(&self) -> u64 {
        self.cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS)
    }

    pub fn export_output_path(&self) -> &str {
        self.export.output_path.as_deref().unwrap_or(".")
    }

    pub fn export_filename(&self) -> &str {
        self.export
            .filename
            .as_deref()
            .unwrap_or(DEFAULT_EXPORT_FILENAME)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        match self.backend() {
            Backend::Postgres => {
                let url = self.database_url().ok_or_else(|| LedgerError::MissingConfigError {
                    field: "database.url (or DATABASE_URL)".to_string(),
                })?;
                if url.contains("${") {
                    return Err(LedgerError::MissingConfigError {
                        field: "environment variable referenced by database.url".to_string(),
                    });
                }
                validate_database_url("database.url", url)?;
                validate_positive_number(
                    "database.max_connections",
                    u64::from(self.max_connections()),
                    1,
                )?;
                validate_positive_number(
                    "database.acquire_timeout_seconds",
                    self.acquire_timeout_seconds(),
                    1,
                )?;
            }
            Backend::Csv => validate_path("database.data_dir", self.data_dir())?,
        }

        validate_path("export.output_path", self.export_output_path())?;
        validate_path("export.filename", self.export_filename())?;
        self.tariff()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[database]
backend = "postgres"
url = "postgres://ledger:pw@db.internal:5432/postgres"
max_connections = 3

[cache]
ttl_seconds = 60

[export]
output_path = "./reports"

[[tariff.prices]]
location = "CONSULTA"
item = "EVALUACION"
amount = 40000

[tariff.location_discounts]
CONSULTA = 2500

[tariff.payment_commissions]
TARJETA = 0.03
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend(), Backend::Postgres);
        assert_eq!(config.max_connections(), 3);
        assert_eq!(config.cache_ttl_seconds(), 60);
        assert_eq!(config.export_output_path(), "./reports");
        assert_eq!(config.export_filename(), DEFAULT_EXPORT_FILENAME);

        let tariff = config.tariff().unwrap();
        assert_eq!(tariff.base_price("CONSULTA", "EVALUACION"), Some(40000.0));
        assert_eq!(
            tariff.commission_rate(crate::domain::model::PaymentMethod::Tarjeta),
            0.03
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.backend(), Backend::Postgres);
        assert_eq!(config.cache_ttl_seconds(), DEFAULT_CACHE_TTL_SECONDS);
        assert_eq!(config.tariff().unwrap(), Tariff::default());
        // Postgres without a URL cannot start.
        assert!(matches!(
            config.validate(),
            Err(LedgerError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LEDGER_TEST_DB_URL", "postgres://u:p@localhost/ledger");

        let toml_content = r#"
[database]
url = "${LEDGER_TEST_DB_URL}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.database_url(), Some("postgres://u:p@localhost/ledger"));
        assert!(config.validate().is_ok());

        std::env::remove_var("LEDGER_TEST_DB_URL");
    }

    #[test]
    fn test_unset_env_var_is_reported() {
        let toml_content = r#"
[database]
url = "${LEDGER_TEST_SURELY_UNSET_VARIABLE}"
"#;
        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_csv_backend_needs_no_url() {
        let toml_content = r#"
[database]
backend = "csv"
data_dir = "/tmp/ledger"
"#;
        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.backend(), Backend::Csv);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[database\nurl = 1"),
            Err(LedgerError::TomlError(_))
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[database]\nbackend = \"csv\"\n[cache]\nttl_seconds = 5\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.cache_ttl_seconds(), 5);
    }
}
