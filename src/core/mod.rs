pub mod ledger;
pub mod pricing;
pub mod report;
pub mod summary;

pub use crate::domain::model::{Attendance, DateRange, IncomeBreakdown, NewAttendance, PaymentMethod};
pub use crate::domain::ports::{LedgerStore, Storage};
pub use crate::utils::error::Result;
