use crate::adapters::memory::{next_id, sort_newest_first};
use crate::core::report;
use crate::domain::model::{Attendance, NewAttendance};
use crate::domain::ports::{LedgerStore, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Ledger kept as a single CSV file inside a [`Storage`].
pub struct CsvLedgerStore<S: Storage> {
    storage: S,
    file_name: String,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl<S: Storage> CsvLedgerStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_rows(&self) -> Result<Vec<Attendance>> {
        if !self.storage.exists(&self.file_name).await? {
            return Ok(Vec::new());
        }
        let data = self.storage.read_file(&self.file_name).await?;
        report::read_csv(&data)
    }
}

#[async_trait]
impl<S: Storage> LedgerStore for CsvLedgerStore<S> {
    async fn init(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !self.storage.exists(&self.file_name).await? {
            self.storage
                .write_file(&self.file_name, &report::write_csv(&[])?)
                .await?;
            tracing::info!("Created ledger file {}", self.file_name);
        }
        Ok(())
    }

    async fn insert(&self, attendance: &NewAttendance) -> Result<Attendance> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.read_rows().await?;

        let stored = Attendance::from_new(next_id(&rows), attendance.clone());
        rows.push(stored.clone());
        // Oldest first on disk so the file reads like a journal.
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        self.storage
            .write_file(&self.file_name, &report::write_csv(&rows)?)
            .await?;
        tracing::debug!("Appended attendance {} to {}", stored.id, self.file_name);
        Ok(stored)
    }

    async fn load_all(&self) -> Result<Vec<Attendance>> {
        let mut rows = self.read_rows().await?;
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::domain::model::{IncomeBreakdown, PaymentMethod};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn new_attendance(date: &str, patient: &str) -> NewAttendance {
        NewAttendance {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            location: "LIBEDUL".to_string(),
            item: "PACIENTE".to_string(),
            patient: patient.to_string(),
            payment_method: PaymentMethod::Tarjeta,
            breakdown: IncomeBreakdown {
                gross: 4500.0,
                location_discount: 0.0,
                card_fee: 225.0,
                extra_discount: 0.0,
                net: 4275.0,
            },
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let store = CsvLedgerStore::new(LocalStorage::new(dir.path()), "atenciones.csv");
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let store = CsvLedgerStore::new(LocalStorage::new(dir.path()), "atenciones.csv");
        store.init().await.unwrap();
        store.insert(&new_attendance("2025-01-06", "Ana")).await.unwrap();
        // A second init must not wipe existing rows.
        store.init().await.unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rows_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        {
            let store = CsvLedgerStore::new(LocalStorage::new(dir.path()), "atenciones.csv");
            store.insert(&new_attendance("2025-01-06", "Ana")).await.unwrap();
            store.insert(&new_attendance("2025-01-08", "Luis")).await.unwrap();
        }

        let store = CsvLedgerStore::new(LocalStorage::new(dir.path()), "atenciones.csv");
        let third = store.insert(&new_attendance("2025-01-07", "Eva")).await.unwrap();
        assert_eq!(third.id, 3);

        let rows = store.load_all().await.unwrap();
        let patients: Vec<&str> = rows.iter().map(|r| r.patient.as_str()).collect();
        assert_eq!(patients, vec!["Luis", "Eva", "Ana"]);
        assert_eq!(rows[0].breakdown.net, 4275.0);
    }
}
