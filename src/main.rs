use chrono::Local;
use clap::Parser;
use income_ledger::config::toml_config::DEFAULT_LEDGER_FILENAME;
use income_ledger::config::{AttendanceArgs, Command, OutputFormat};
use income_ledger::core::pricing::{self, AttendanceRequest};
use income_ledger::core::report::{
    location_discount_label, render_bar_chart, render_location_table, total_label,
};
use income_ledger::core::summary::Summary;
use income_ledger::domain::model::{Attendance, DateRange, IncomeBreakdown, PaymentMethod};
use income_ledger::domain::ports::{LedgerStore, Storage};
use income_ledger::utils::format::{format_clp, format_percent, weekday_es};
use income_ledger::utils::{logger, validation::Validate};
use income_ledger::{
    AppConfig, Backend, CliConfig, CsvLedgerStore, LedgerService, LocalStorage, PgLedgerStore,
    Result, Tariff,
};
use std::time::Duration;

const CHART_WIDTH: usize = 40;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli.command);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.severity().exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<()> {
    let config = cli.app_config()?;
    let tariff = config.tariff()?;

    // These two only need the tariff, not a ledger connection.
    match &cli.command {
        Command::Catalog { location } => return print_catalog(&tariff, location.as_deref()),
        Command::Quote(args) => {
            let request = attendance_request(args);
            let breakdown = pricing::quote(&tariff, &request)?;
            print_breakdown(&tariff, &request, &breakdown);
            return Ok(());
        }
        _ => {}
    }

    config.validate()?;
    let ttl = Duration::from_secs(config.cache_ttl_seconds());

    match config.backend() {
        Backend::Postgres => {
            // validate() guarantees the URL is present.
            let url = config.database_url().unwrap_or_default();
            let store = PgLedgerStore::connect(
                url,
                config.max_connections(),
                Duration::from_secs(config.acquire_timeout_seconds()),
            )
            .await?;
            execute(LedgerService::new(store, tariff, ttl), &cli.command, &config).await
        }
        Backend::Csv => {
            tracing::info!("Using CSV ledger in {}", config.data_dir());
            let store = CsvLedgerStore::new(
                LocalStorage::new(config.data_dir()),
                DEFAULT_LEDGER_FILENAME,
            );
            execute(LedgerService::new(store, tariff, ttl), &cli.command, &config).await
        }
    }
}

async fn execute<S: LedgerStore>(
    ledger: LedgerService<S>,
    command: &Command,
    config: &AppConfig,
) -> Result<()> {
    match command {
        Command::InitDb => {
            ledger.init().await?;
            println!("✅ Ledger storage is ready");
        }
        Command::Record {
            attendance,
            patient,
        } => {
            let request = attendance_request(attendance);
            let stored = ledger.record(&request, patient).await?;
            print_breakdown(ledger.tariff(), &request, &stored.breakdown);
            println!(
                "✅ Attendance #{} recorded for {} by {}",
                stored.id,
                stored.patient,
                format_clp(stored.breakdown.net)
            );
        }
        Command::List { range, format } => {
            let rows = ledger.list(DateRange::from(range)).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Table => print_rows(&rows),
            }
        }
        Command::Summary { range, format } => {
            let range = DateRange::from(range);
            let summary = ledger.summary(range).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Table => print_summary(&summary, &range),
            }
        }
        Command::Export { range, output } => {
            let data = ledger.export_csv(DateRange::from(range)).await?;
            let file_name = output.as_deref().unwrap_or(config.export_filename());
            let storage = LocalStorage::new(config.export_output_path());
            storage.write_file(file_name, &data).await?;

            let path = storage.full_path(file_name);
            tracing::info!("📁 Export saved to: {}", path.display());
            println!("📁 Export saved to: {}", path.display());
        }
        // Answered in run() before any store is opened.
        Command::Catalog { .. } | Command::Quote(_) => {}
    }
    Ok(())
}

fn attendance_request(args: &AttendanceArgs) -> AttendanceRequest {
    AttendanceRequest {
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
        location: args.location.clone(),
        item: args.item.clone(),
        payment_method: args.payment,
        gross_override: args.gross,
        extra_discount: args.extra_discount,
    }
}

fn print_catalog(tariff: &Tariff, only: Option<&str>) -> Result<()> {
    let locations: Vec<&str> = match only {
        Some(location) if tariff.has_location(location) => vec![location],
        Some(location) => {
            return Err(income_ledger::LedgerError::validation(format!(
                "unknown location '{}'",
                location
            )))
        }
        None => tariff.locations(),
    };

    for location in locations {
        println!("📍 {}", location);
        for entry in tariff.items_for(location) {
            println!("    {:<24} {:>10}", entry.item, format_clp(entry.amount));
        }
    }

    println!();
    println!("Fixed location discounts:");
    for (location, amount) in tariff.flat_discounts() {
        println!("    {:<24} {:>10}", location, format_clp(amount));
    }
    for (location, day, amount) in tariff.weekday_rules() {
        println!(
            "    {:<24} {:>10}  ({})",
            location,
            format_clp(amount),
            weekday_es(day)
        );
    }

    println!();
    println!("Payment commissions:");
    for method in PaymentMethod::ALL {
        println!(
            "    {:<24} {:>10}",
            method,
            format_percent(tariff.commission_rate(method))
        );
    }
    Ok(())
}

fn print_breakdown(tariff: &Tariff, request: &AttendanceRequest, breakdown: &IncomeBreakdown) {
    let discount_label = location_discount_label(tariff, &request.location, request.date);
    let fee_label = format!(
        "Desc. Tarjeta ({})",
        format_percent(tariff.commission_rate(request.payment_method))
    );

    println!("🗓️  {}  📍 {}  📋 {}", request.date, request.location, request.item);
    println!("    {:<40} {:>12}", "Valor Bruto", format_clp(breakdown.gross));
    println!("    {:<40} {:>12}", fee_label, format_clp(breakdown.card_fee));
    println!(
        "    {:<40} {:>12}",
        discount_label,
        format_clp(breakdown.location_discount)
    );
    println!(
        "    {:<40} {:>12}",
        "Descuento Adicional/Ajuste",
        format_clp(breakdown.extra_discount)
    );
    println!("    {:<40} {:>12}", "TOTAL LÍQUIDO", format_clp(breakdown.net));
}

fn print_rows(rows: &[Attendance]) {
    if rows.is_empty() {
        println!("No attendances recorded in this period.");
        return;
    }
    for row in rows {
        println!(
            "#{:<5} {}  {:<14} {:<24} {:<24} {:<13} {:>10}",
            row.id,
            row.date,
            row.location,
            row.item,
            row.patient,
            row.payment_method,
            format_clp(row.net())
        );
    }
}

fn print_summary(summary: &Summary, range: &DateRange) {
    if summary.is_empty() {
        println!("ℹ️  No attendances recorded yet, or none in this period.");
        return;
    }

    if !range.is_unbounded() {
        let from = range.from.map(|d| d.to_string()).unwrap_or_default();
        let to = range.to.map(|d| d.to_string()).unwrap_or_default();
        println!("Period: {} .. {}", from, to);
    }
    println!(
        "📊 {}: {} ({} attendances)",
        total_label(range),
        format_clp(summary.total_net),
        summary.count
    );
    println!();
    println!("Evolución mensual de ingresos líquidos");
    print!("{}", render_bar_chart(&summary.monthly, CHART_WIDTH));
    println!();
    println!("Distribución de ingresos por centro de atención");
    print!("{}", render_location_table(&summary.by_location));
}
