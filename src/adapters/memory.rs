use crate::domain::model::{Attendance, NewAttendance};
use crate::domain::ports::LedgerStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local ledger. Cloning shares the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    rows: Arc<Mutex<Vec<Attendance>>>,
    loads: Arc<AtomicUsize>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Number of `load_all` calls served so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

pub(crate) fn next_id(rows: &[Attendance]) -> i64 {
    rows.iter().map(|r| r.id).max().unwrap_or(0) + 1
}

/// Newest date first, then newest id.
pub(crate) fn sort_newest_first(rows: &mut [Attendance]) {
    rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, attendance: &NewAttendance) -> Result<Attendance> {
        let mut rows = self.rows.lock().await;
        let stored = Attendance::from_new(next_id(&rows), attendance.clone());
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn load_all(&self) -> Result<Vec<Attendance>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().await.clone();
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{IncomeBreakdown, PaymentMethod};
    use chrono::NaiveDate;

    fn new_attendance(date: &str) -> NewAttendance {
        NewAttendance {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            location: "DOMICILIO".to_string(),
            item: "PACIENTE".to_string(),
            patient: "Ana".to_string(),
            payment_method: PaymentMethod::Efectivo,
            breakdown: IncomeBreakdown::default(),
        }
    }

    #[tokio::test]
    async fn test_ids_increase_and_rows_sort_newest_first() {
        let store = MemoryLedgerStore::new();
        let a = store.insert(&new_attendance("2025-01-10")).await.unwrap();
        let b = store.insert(&new_attendance("2025-01-12")).await.unwrap();
        let c = store.insert(&new_attendance("2025-01-10")).await.unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));

        let ids: Vec<i64> = store.load_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(store.load_count(), 1);
    }
}
