use crate::config::tariff::Tariff;
use crate::core::pricing::{self, AttendanceRequest};
use crate::core::report;
use crate::core::summary::Summary;
use crate::domain::model::{Attendance, DateRange, IncomeBreakdown, NewAttendance};
use crate::domain::ports::LedgerStore;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CachedRows {
    loaded_at: Instant,
    rows: Arc<Vec<Attendance>>,
}

pub struct LedgerService<S: LedgerStore> {
    store: S,
    tariff: Tariff,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedRows>>,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: S, tariff: Tariff, cache_ttl: Duration) -> Self {
        Self {
            store,
            tariff,
            cache_ttl,
            cache: RwLock::new(None),
        }
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn init(&self) -> Result<()> {
        self.store.init().await
    }

    pub fn quote(&self, request: &AttendanceRequest) -> Result<IncomeBreakdown> {
        pricing::quote(&self.tariff, request)
    }

    pub async fn record(&self, request: &AttendanceRequest, patient: &str) -> Result<Attendance> {
        validate_non_empty_string("patient name", patient)?;
        let breakdown = self.quote(request)?;

        let new = NewAttendance {
            date: request.date,
            location: request.location.clone(),
            item: request.item.clone(),
            patient: patient.trim().to_string(),
            payment_method: request.payment_method,
            breakdown,
        };
        new.validate()?;

        let stored = self.store.insert(&new).await?;
        self.invalidate().await;

        tracing::info!(
            id = stored.id,
            location = %stored.location,
            item = %stored.item,
            net = stored.breakdown.net,
            "Attendance recorded"
        );
        Ok(stored)
    }

    /// Every stored row, newest first. Served from the cache while it is fresh.
    pub async fn load_all(&self) -> Result<Arc<Vec<Attendance>>> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() < self.cache_ttl {
                    tracing::debug!("Serving {} attendances from cache", cached.rows.len());
                    return Ok(Arc::clone(&cached.rows));
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if cached.loaded_at.elapsed() < self.cache_ttl {
                return Ok(Arc::clone(&cached.rows));
            }
        }

        let started = Instant::now();
        let rows = Arc::new(self.store.load_all().await?);
        tracing::debug!(
            "Loaded {} attendances from store in {:?}",
            rows.len(),
            started.elapsed()
        );

        *cache = Some(CachedRows {
            loaded_at: Instant::now(),
            rows: Arc::clone(&rows),
        });
        Ok(rows)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    pub async fn list(&self, range: DateRange) -> Result<Vec<Attendance>> {
        range.validate()?;
        let rows = self.load_all().await?;
        Ok(rows
            .iter()
            .filter(|row| range.contains(row.date))
            .cloned()
            .collect())
    }

    pub async fn summary(&self, range: DateRange) -> Result<Summary> {
        let rows = self.list(range).await?;
        Ok(Summary::build(&rows))
    }

    pub async fn export_csv(&self, range: DateRange) -> Result<Vec<u8>> {
        let rows = self.list(range).await?;
        report::write_csv(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryLedgerStore;
    use crate::domain::model::PaymentMethod;
    use crate::utils::error::LedgerError;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(location: &str, item: &str, date: &str) -> AttendanceRequest {
        AttendanceRequest {
            date: d(date),
            location: location.to_string(),
            item: item.to_string(),
            payment_method: PaymentMethod::Efectivo,
            gross_override: None,
            extra_discount: 0.0,
        }
    }

    fn service(ttl: Duration) -> LedgerService<MemoryLedgerStore> {
        LedgerService::new(MemoryLedgerStore::new(), Tariff::default(), ttl)
    }

    #[tokio::test]
    async fn test_record_requires_patient_name() {
        let ledger = service(Duration::from_secs(60));
        let err = ledger
            .record(&request("CPM", "PACIENTE", "2025-01-06"), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError { .. }));
        assert_eq!(ledger.store().len().await, 0);
    }

    #[tokio::test]
    async fn test_record_rejects_unknown_location_and_item() {
        let ledger = service(Duration::from_secs(60));
        assert!(matches!(
            ledger.quote(&request("NOWHERE", "PACIENTE", "2025-01-06")),
            Err(LedgerError::ValidationError { .. })
        ));
        assert!(matches!(
            ledger.quote(&request("ALERCE", "PACIENTE", "2025-01-06")),
            Err(LedgerError::UnknownTariffError { .. })
        ));
    }

    #[tokio::test]
    async fn test_quote_bounds() {
        let ledger = service(Duration::from_secs(60));

        let mut req = request("CPM", "PACIENTE", "2025-01-06");
        req.gross_override = Some(-1.0);
        assert!(ledger.quote(&req).is_err());

        let mut req = request("CPM", "PACIENTE", "2025-01-06");
        req.extra_discount = -500_001.0;
        assert!(ledger.quote(&req).is_err());

        req.extra_discount = -500_000.0;
        let breakdown = ledger.quote(&req).unwrap();
        assert_eq!(breakdown.net, 30000.0 - 14610.0 + 500_000.0);
    }

    #[tokio::test]
    async fn test_cache_is_served_until_invalidated_by_record() {
        let ledger = service(Duration::from_secs(3600));

        ledger
            .record(&request("LIBEDUL", "PACIENTE", "2025-01-06"), "Ana")
            .await
            .unwrap();
        assert_eq!(ledger.load_all().await.unwrap().len(), 1);
        assert_eq!(ledger.store().load_count(), 1);

        // Fresh cache: no second trip to the store.
        ledger.load_all().await.unwrap();
        assert_eq!(ledger.store().load_count(), 1);

        ledger
            .record(&request("CPM", "PACIENTE", "2025-01-07"), "Luis")
            .await
            .unwrap();
        let rows = ledger.load_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(ledger.store().load_count(), 2);
        // Newest first.
        assert_eq!(rows[0].patient, "Luis");
    }

    #[tokio::test]
    async fn test_expired_cache_reloads() {
        let ledger = service(Duration::ZERO);
        ledger.load_all().await.unwrap();
        ledger.load_all().await.unwrap();
        assert_eq!(ledger.store().load_count(), 2);
    }

    #[tokio::test]
    async fn test_list_and_summary_respect_date_range() {
        let ledger = service(Duration::from_secs(3600));
        for (date, patient) in [
            ("2024-12-30", "A"),
            ("2025-01-06", "B"),
            ("2025-01-31", "C"),
            ("2025-02-03", "D"),
        ] {
            ledger
                .record(&request("LIBEDUL", "PACIENTE", date), patient)
                .await
                .unwrap();
        }

        let january = DateRange::new(Some(d("2025-01-01")), Some(d("2025-01-31")));
        let rows = ledger.list(january).await.unwrap();
        let patients: Vec<&str> = rows.iter().map(|r| r.patient.as_str()).collect();
        assert_eq!(patients, vec!["C", "B"]);

        let summary = ledger.summary(january).await.unwrap();
        assert_eq!(summary.total_net, 9000.0);
        assert_eq!(summary.monthly.len(), 1);

        let inverted = DateRange::new(Some(d("2025-02-01")), Some(d("2025-01-01")));
        assert!(ledger.list(inverted).await.is_err());
    }
}
