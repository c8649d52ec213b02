pub mod cli;
pub mod tariff;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::{AttendanceArgs, CliConfig, Command, OutputFormat, RangeArgs};

#[cfg(feature = "cli")]
mod args {
    use crate::config::toml_config::{AppConfig, Backend};
    use crate::domain::model::{parse_date, DateRange, PaymentMethod};
    use crate::utils::error::Result;
    use chrono::NaiveDate;
    use clap::{Args, Parser, Subcommand, ValueEnum};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "income-ledger")]
    #[command(about = "Record attendances and report net income per location")]
    pub struct CliConfig {
        /// Path to a TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
        pub database_url: Option<String>,

        #[arg(long, value_enum, global = true)]
        pub backend: Option<Backend>,

        /// Directory for the CSV ledger backend
        #[arg(long, global = true)]
        pub data_dir: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Show locations, items, prices and discount rules
        Catalog {
            #[arg(long)]
            location: Option<String>,
        },
        /// Calculate the net income of an attendance without saving it
        Quote(AttendanceArgs),
        /// Calculate and store an attendance
        Record {
            #[command(flatten)]
            attendance: AttendanceArgs,
            #[arg(long)]
            patient: String,
        },
        /// List stored attendances, newest first
        List {
            #[command(flatten)]
            range: RangeArgs,
            #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
            format: OutputFormat,
        },
        /// Historic total, monthly evolution and per-location distribution
        Summary {
            #[command(flatten)]
            range: RangeArgs,
            #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
            format: OutputFormat,
        },
        /// Write stored attendances to a CSV file
        Export {
            #[command(flatten)]
            range: RangeArgs,
            /// Output file name; relative to the export directory
            #[arg(short, long)]
            output: Option<String>,
        },
        /// Create the ledger table if it does not exist
        InitDb,
    }

    #[derive(Debug, Clone, Args)]
    pub struct AttendanceArgs {
        #[arg(long)]
        pub location: String,

        #[arg(long)]
        pub item: String,

        #[arg(long)]
        pub payment: PaymentMethod,

        /// Attendance date (YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = parse_date)]
        pub date: Option<NaiveDate>,

        /// Gross value; defaults to the tariff price
        #[arg(long)]
        pub gross: Option<f64>,

        /// Positive for discounts, negative for surcharges
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pub extra_discount: f64,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct RangeArgs {
        /// First date included (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        pub from: Option<NaiveDate>,

        /// Last date included (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        pub to: Option<NaiveDate>,
    }

    impl From<&RangeArgs> for DateRange {
        fn from(args: &RangeArgs) -> Self {
            DateRange::new(args.from, args.to)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum OutputFormat {
        Table,
        Json,
    }

    impl CliConfig {
        /// Loads the TOML file when one is given and lays the command-line
        /// overrides on top of it.
        pub fn app_config(&self) -> Result<AppConfig> {
            let mut config = match &self.config {
                Some(path) => AppConfig::from_file(path)?,
                None => AppConfig::default(),
            };

            if let Some(url) = &self.database_url {
                config.database.url = Some(url.clone());
            }
            if let Some(backend) = self.backend {
                config.database.backend = backend;
            }
            if let Some(dir) = &self.data_dir {
                config.database.data_dir = Some(dir.clone());
            }

            Ok(config)
        }
    }

}
