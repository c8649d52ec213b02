use crate::config::tariff::Tariff;
use crate::domain::model::{IncomeBreakdown, PaymentMethod};
use crate::utils::error::{LedgerError, Result};
use crate::utils::validation::validate_at_least;
use chrono::NaiveDate;

/// Largest surcharge a single attendance may carry, as a negative discount.
pub const MIN_EXTRA_DISCOUNT: f64 = -500_000.0;

/// Inputs of a single attendance before it is priced.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRequest {
    pub date: NaiveDate,
    pub location: String,
    pub item: String,
    pub payment_method: PaymentMethod,
    /// Replaces the tariff price when set.
    pub gross_override: Option<f64>,
    /// Positive values reduce the net, negative values are surcharges.
    pub extra_discount: f64,
}

/// Net income of one attendance. The result is allowed to go negative.
pub fn calculate_income(tariff: &Tariff, request: &AttendanceRequest) -> IncomeBreakdown {
    let gross = request
        .gross_override
        .or_else(|| tariff.base_price(&request.location, &request.item))
        .unwrap_or(0.0);

    let location_discount = tariff.location_discount(&request.location, request.date);
    let card_fee = gross * tariff.commission_rate(request.payment_method);
    let net = gross - location_discount - card_fee - request.extra_discount;

    IncomeBreakdown {
        gross,
        location_discount,
        card_fee,
        extra_discount: request.extra_discount,
        net,
    }
}

/// Checks the request against the tariff: the location must exist and
/// price the item, the gross must not be negative.
pub fn validate_request(tariff: &Tariff, request: &AttendanceRequest) -> Result<()> {
    if !tariff.has_location(&request.location) {
        return Err(LedgerError::validation(format!(
            "unknown location '{}'; expected one of: {}",
            request.location,
            tariff.locations().join(", ")
        )));
    }
    if tariff.base_price(&request.location, &request.item).is_none() {
        return Err(LedgerError::UnknownTariffError {
            location: request.location.clone(),
            item: request.item.clone(),
        });
    }
    if let Some(gross) = request.gross_override {
        validate_at_least("gross value", gross, 0.0)?;
    }
    validate_at_least("extra discount", request.extra_discount, MIN_EXTRA_DISCOUNT)?;
    Ok(())
}

pub fn quote(tariff: &Tariff, request: &AttendanceRequest) -> Result<IncomeBreakdown> {
    validate_request(tariff, request)?;
    Ok(calculate_income(tariff, request))
}
