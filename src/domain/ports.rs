use crate::domain::model::{Attendance, NewAttendance};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Persistence for recorded attendances.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Creates the backing table or file when missing.
    async fn init(&self) -> Result<()>;
    async fn insert(&self, attendance: &NewAttendance) -> Result<Attendance>;
    /// All rows, newest date first; ties by id descending.
    async fn load_all(&self) -> Result<Vec<Attendance>>;
}
