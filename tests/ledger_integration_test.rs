use chrono::NaiveDate;
use income_ledger::config::toml_config::DEFAULT_LEDGER_FILENAME;
use income_ledger::core::report;
use income_ledger::domain::model::{DateRange, PaymentMethod};
use income_ledger::domain::ports::Storage;
use income_ledger::{
    AppConfig, AttendanceRequest, CsvLedgerStore, LedgerError, LedgerService, LocalStorage,
    MemoryLedgerStore, Tariff,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn request(
    date: &str,
    location: &str,
    item: &str,
    payment_method: PaymentMethod,
) -> AttendanceRequest {
    AttendanceRequest {
        date: d(date),
        location: location.to_string(),
        item: item.to_string(),
        payment_method,
        gross_override: None,
        extra_discount: 0.0,
    }
}

#[tokio::test]
async fn test_end_to_end_csv_ledger_record_summary_and_export() {
    // Setup temporary directories for the ledger and the export
    let data_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();

    let store = CsvLedgerStore::new(LocalStorage::new(data_dir.path()), DEFAULT_LEDGER_FILENAME);
    let ledger = LedgerService::new(store, Tariff::default(), Duration::from_secs(3600));
    assert_ok!(ledger.init().await);

    // Tuesday at AMAR AUSTRAL, paid by card: 30000 - 8000 - 1500
    let tuesday = ledger
        .record(
            &request("2025-01-07", "AMAR AUSTRAL", "PACIENTE", PaymentMethod::Tarjeta),
            "Ana",
        )
        .await
        .unwrap();
    assert!((tuesday.breakdown.net - 20500.0).abs() < 1e-6);

    // CPM flat discount, cash
    ledger
        .record(
            &request("2025-01-20", "CPM", "PACIENTE", PaymentMethod::Efectivo),
            "Luis",
        )
        .await
        .unwrap();

    // February, with a manual surcharge
    let mut surcharge = request("2025-02-03", "LIBEDUL", "DUPLA", PaymentMethod::Transferencia);
    surcharge.extra_discount = -1000.0;
    ledger.record(&surcharge, "Eva").await.unwrap();

    let summary = ledger.summary(DateRange::all()).await.unwrap();
    assert_eq!(summary.count, 3);
    assert!((summary.total_net - (20500.0 + 15390.0 + 8000.0)).abs() < 1e-6);
    assert_eq!(summary.monthly.len(), 2);
    assert_eq!(summary.monthly[0].month, "2025-01");
    assert_eq!(summary.monthly[1].month, "2025-02");
    assert_eq!(summary.by_location[0].location, "AMAR AUSTRAL");

    // Export February only
    let february = DateRange::new(Some(d("2025-02-01")), Some(d("2025-02-28")));
    let csv = ledger.export_csv(february).await.unwrap();
    let export = LocalStorage::new(export_dir.path());
    export.write_file("febrero.csv", &csv).await.unwrap();

    let written = std::fs::read(export_dir.path().join("febrero.csv")).unwrap();
    let rows = report::read_csv(&written).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].patient, "Eva");
    assert_eq!(rows[0].breakdown.extra_discount, -1000.0);
    assert_eq!(rows[0].net(), 8000.0);
}

#[tokio::test]
async fn test_csv_ledger_survives_restart() {
    let data_dir = TempDir::new().unwrap();

    {
        let store =
            CsvLedgerStore::new(LocalStorage::new(data_dir.path()), DEFAULT_LEDGER_FILENAME);
        let ledger = LedgerService::new(store, Tariff::default(), Duration::from_secs(3600));
        ledger
            .record(
                &request("2025-03-04", "DOMICILIO", "LAVADO OIDO", PaymentMethod::Efectivo),
                "Ana",
            )
            .await
            .unwrap();
    }

    let store = CsvLedgerStore::new(LocalStorage::new(data_dir.path()), DEFAULT_LEDGER_FILENAME);
    let ledger = LedgerService::new(store, Tariff::default(), Duration::from_secs(3600));
    let rows = ledger.list(DateRange::all()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].location, "DOMICILIO");
    assert_eq!(rows[0].breakdown.gross, 25000.0);
}

#[tokio::test]
async fn test_rejected_attendance_is_not_stored() {
    let store = MemoryLedgerStore::new();
    let ledger = LedgerService::new(store.clone(), Tariff::default(), Duration::from_secs(60));

    let err = assert_err!(
        ledger
            .record(
                &request("2025-01-07", "ALERCE", "PACIENTE", PaymentMethod::Efectivo),
                "Ana",
            )
            .await
    );
    assert!(matches!(err, LedgerError::UnknownTariffError { .. }));
    assert!(err.recovery_suggestion().contains("catalog"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_tariff_from_config_file_drives_pricing() {
    let config = AppConfig::from_toml_str(
        r#"
[database]
backend = "csv"

[[tariff.prices]]
location = "CONSULTA"
item = "EVALUACION"
amount = 50000

[[tariff.weekday_discounts]]
location = "CONSULTA"
weekday = "saturday"
amount = 10000

[tariff.payment_commissions]
TARJETA = 0.1
"#,
    )
    .unwrap();

    let ledger = LedgerService::new(
        MemoryLedgerStore::new(),
        config.tariff().unwrap(),
        Duration::from_secs(config.cache_ttl_seconds()),
    );

    // 2025-01-11 is a Saturday
    let breakdown = ledger
        .quote(&request("2025-01-11", "CONSULTA", "EVALUACION", PaymentMethod::Tarjeta))
        .unwrap();
    assert_eq!(breakdown.gross, 50000.0);
    assert_eq!(breakdown.location_discount, 10000.0);
    assert!((breakdown.card_fee - 5000.0).abs() < 1e-6);
    assert!((breakdown.net - 35000.0).abs() < 1e-6);

    // The built-in locations are gone once the file lists its own prices
    assert!(ledger
        .quote(&request("2025-01-11", "CPM", "PACIENTE", PaymentMethod::Efectivo))
        .is_err());
}
