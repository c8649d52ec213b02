use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("No price configured for item '{item}' at '{location}'")]
    UnknownTariffError { location: String, item: String },

    #[error("Could not parse {field} from '{value}'")]
    ParseError { field: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a failed command. `Low` does not fail the run.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Low => 0,
            Self::Medium => 2,
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::ValidationError { .. }
            | Self::UnknownTariffError { .. }
            | Self::ParseError { .. } => ErrorCategory::Input,
            Self::DatabaseError(_) | Self::IoError(_) => ErrorCategory::Storage,
            Self::CsvError(_) | Self::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ValidationError { .. }
            | Self::UnknownTariffError { .. }
            | Self::ParseError { .. } => ErrorSeverity::High,
            Self::DatabaseError(sqlx::Error::PoolTimedOut)
            | Self::DatabaseError(sqlx::Error::Io(_)) => ErrorSeverity::Medium,
            Self::DatabaseError(_) | Self::IoError(_) => ErrorSeverity::Critical,
            Self::CsvError(_) | Self::SerializationError(_) => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::DatabaseError(sqlx::Error::PoolTimedOut)
            | Self::DatabaseError(sqlx::Error::Io(_)) => {
                "The database did not answer in time; check the network and retry"
            }
            Self::DatabaseError(_) => {
                "Check the database URL, the credentials and that the 'atenciones' table exists (run init-db)"
            }
            Self::IoError(_) => "Check that the path exists and is writable",
            Self::CsvError(_) => "Check that the ledger CSV file has not been edited by hand",
            Self::SerializationError(_) => "Report this as a bug",
            Self::TomlError(_) | Self::ConfigError { .. } => {
                "Fix the configuration file and try again"
            }
            Self::MissingConfigError { .. } => {
                "Provide the value in the config file, on the command line or through the environment"
            }
            Self::InvalidConfigValueError { .. } => "Correct the value shown above",
            Self::ValidationError { .. } => "Correct the attendance data and try again",
            Self::UnknownTariffError { .. } => {
                "Run the catalog command to see the items priced at each location"
            }
            Self::ParseError { .. } => "Dates use YYYY-MM-DD, amounts are plain numbers",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Could not reach or query the ledger database".to_string(),
            Self::IoError(e) => format!("File operation failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
