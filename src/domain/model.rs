use crate::utils::error::LedgerError;
use crate::utils::validation::{validate_non_empty_string, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    Tarjeta,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Transferencia,
        PaymentMethod::Tarjeta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "EFECTIVO",
            PaymentMethod::Transferencia => "TRANSFERENCIA",
            PaymentMethod::Tarjeta => "TARJETA",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EFECTIVO" => Ok(PaymentMethod::Efectivo),
            "TRANSFERENCIA" => Ok(PaymentMethod::Transferencia),
            "TARJETA" => Ok(PaymentMethod::Tarjeta),
            _ => Err(LedgerError::ParseError {
                field: "payment method".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Amounts are whole pesos carried as `f64`; the card fee can be fractional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub gross: f64,
    pub location_discount: f64,
    pub card_fee: f64,
    pub extra_discount: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttendance {
    pub date: NaiveDate,
    pub location: String,
    pub item: String,
    pub patient: String,
    pub payment_method: PaymentMethod,
    pub breakdown: IncomeBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub date: NaiveDate,
    pub location: String,
    pub item: String,
    pub patient: String,
    pub payment_method: PaymentMethod,
    pub breakdown: IncomeBreakdown,
}

impl Attendance {
    pub fn from_new(id: i64, new: NewAttendance) -> Self {
        Self {
            id,
            date: new.date,
            location: new.location,
            item: new.item,
            patient: new.patient,
            payment_method: new.payment_method,
            breakdown: new.breakdown,
        }
    }

    pub fn net(&self) -> f64 {
        self.breakdown.net
    }
}

/// Inclusive date window; an open end is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

impl Validate for DateRange {
    fn validate(&self) -> Result<(), LedgerError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(LedgerError::validation(format!(
                    "date range starts ({}) after it ends ({})",
                    from, to
                )));
            }
        }
        Ok(())
    }
}

impl Validate for NewAttendance {
    fn validate(&self) -> Result<(), LedgerError> {
        validate_non_empty_string("location", &self.location)?;
        validate_non_empty_string("item", &self.item)?;
        validate_non_empty_string("patient name", &self.patient)?;

        let b = &self.breakdown;
        let amounts = [b.gross, b.location_discount, b.card_fee, b.extra_discount, b.net];
        if amounts.iter().any(|amount| !amount.is_finite()) {
            return Err(LedgerError::validation("amounts must be finite numbers"));
        }
        Ok(())
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| LedgerError::ParseError {
        field: "date".to_string(),
        value: value.to_string(),
    })
}
