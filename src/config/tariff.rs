use crate::domain::model::PaymentMethod;
use crate::utils::error::{LedgerError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub location: String,
    pub item: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayDiscount {
    pub location: String,
    /// English day name or abbreviation, e.g. `tuesday` or `Tue`.
    pub weekday: String,
    pub amount: f64,
}

/// Tariff section as written in the TOML file. Every table is optional;
/// an absent table keeps the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TariffConfig {
    pub prices: Option<Vec<PriceEntry>>,
    pub location_discounts: Option<BTreeMap<String, f64>>,
    pub weekday_discounts: Option<Vec<WeekdayDiscount>>,
    /// Keyed by payment method name, e.g. `TARJETA = 0.05`.
    pub payment_commissions: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    prices: Vec<PriceEntry>,
    location_discounts: BTreeMap<String, f64>,
    weekday_discounts: Vec<(String, Weekday, f64)>,
    payment_commissions: BTreeMap<PaymentMethod, f64>,
}

impl Default for Tariff {
    fn default() -> Self {
        let prices = [
            ("LIBEDUL", "PACIENTE", 4500.0),
            ("LIBEDUL", "VISITA ESTABLECIMIENTO", 20000.0),
            ("LIBEDUL", "ADOS2", 30000.0),
            ("LIBEDUL", "DUPLA", 7000.0),
            ("LIBEDUL", "ADIR+ADOS2", 37500.0),
            ("LIBEDUL", "LAVADO OIDO", 6000.0),
            ("AMAR AUSTRAL", "PACIENTE", 30000.0),
            ("AMAR AUSTRAL", "DUPLA", 25000.0),
            ("AMAR AUSTRAL", "LAVADO OIDO", 20000.0),
            ("AMAR AUSTRAL", "VISITA ESTABLECIMIENTO", 35000.0),
            ("AMAR AUSTRAL", "FALTO", 0.0),
            ("AMAR AUSTRAL", "ADIR+ADOS2", 100000.0),
            ("CPM", "PACIENTE", 30000.0),
            ("CPM", "HOSPITALIZADO", 30000.0),
            ("CPM", "ADIR+ADOS2", 190000.0),
            ("DOMICILIO", "PACIENTE", 30000.0),
            ("DOMICILIO", "LAVADO OIDO", 25000.0),
            ("ALERCE", "5 SABADOS", 25000.0),
            ("ALERCE", "4 SABADOS", 31250.0),
        ]
        .into_iter()
        .map(|(location, item, amount)| PriceEntry {
            location: location.to_string(),
            item: item.to_string(),
            amount,
        })
        .collect();

        let location_discounts = [
            ("LIBEDUL", 0.0),
            ("ALERCE", 0.0),
            ("DOMICILIO", 0.0),
            ("CPM", 14610.0),
        ]
        .into_iter()
        .map(|(location, amount)| (location.to_string(), amount))
        .collect();

        let weekday_discounts = vec![
            ("AMAR AUSTRAL".to_string(), Weekday::Tue, 8000.0),
            ("AMAR AUSTRAL".to_string(), Weekday::Fri, 6500.0),
        ];

        let payment_commissions = BTreeMap::from([
            (PaymentMethod::Efectivo, 0.0),
            (PaymentMethod::Transferencia, 0.0),
            (PaymentMethod::Tarjeta, 0.05),
        ]);

        Self {
            prices,
            location_discounts,
            weekday_discounts,
            payment_commissions,
        }
    }
}

impl Tariff {
    /// Builds a tariff from the file section, falling back to the built-in
    /// table for every section the file leaves out.
    pub fn from_config(config: &TariffConfig) -> Result<Self> {
        let mut tariff = Self::default();

        if let Some(prices) = &config.prices {
            tariff.prices = prices.clone();
        }
        if let Some(discounts) = &config.location_discounts {
            tariff.location_discounts = discounts.clone();
        }
        if let Some(rules) = &config.weekday_discounts {
            tariff.weekday_discounts = rules
                .iter()
                .map(|rule| {
                    let day = rule.weekday.parse::<Weekday>().map_err(|_| {
                        LedgerError::InvalidConfigValueError {
                            field: "tariff.weekday_discounts.weekday".to_string(),
                            value: rule.weekday.clone(),
                            reason: "Expected an English day name such as 'tuesday'".to_string(),
                        }
                    })?;
                    Ok((rule.location.clone(), day, rule.amount))
                })
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(commissions) = &config.payment_commissions {
            tariff.payment_commissions = commissions
                .iter()
                .map(|(name, rate)| Ok((name.parse::<PaymentMethod>()?, *rate)))
                .collect::<Result<BTreeMap<_, _>>>()?;
        }

        tariff.validate()?;
        Ok(tariff)
    }

    pub fn locations(&self) -> Vec<&str> {
        let mut locations: Vec<&str> = self.prices.iter().map(|p| p.location.as_str()).collect();
        locations.sort_unstable();
        locations.dedup();
        locations
    }

    pub fn items_for(&self, location: &str) -> Vec<&PriceEntry> {
        self.prices.iter().filter(|p| p.location == location).collect()
    }

    pub fn has_location(&self, location: &str) -> bool {
        self.prices.iter().any(|p| p.location == location)
    }

    pub fn base_price(&self, location: &str, item: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|p| p.location == location && p.item == item)
            .map(|p| p.amount)
    }

    /// The fixed discount that applies at `location` on `date`. A weekday rule
    /// for that location replaces the location's flat discount.
    pub fn location_discount(&self, location: &str, date: NaiveDate) -> f64 {
        let weekday = date.weekday();
        self.weekday_discounts
            .iter()
            .find(|(loc, day, _)| loc == location && *day == weekday)
            .map(|(_, _, amount)| *amount)
            .or_else(|| self.location_discounts.get(location).copied())
            .unwrap_or(0.0)
    }

    pub fn has_weekday_rules(&self, location: &str) -> bool {
        self.weekday_discounts.iter().any(|(loc, _, _)| loc == location)
    }

    pub fn weekday_rules(&self) -> impl Iterator<Item = (&str, Weekday, f64)> {
        self.weekday_discounts
            .iter()
            .map(|(loc, day, amount)| (loc.as_str(), *day, *amount))
    }

    pub fn flat_discounts(&self) -> impl Iterator<Item = (&str, f64)> {
        self.location_discounts
            .iter()
            .map(|(loc, amount)| (loc.as_str(), *amount))
    }

    pub fn commission_rate(&self, method: PaymentMethod) -> f64 {
        self.payment_commissions.get(&method).copied().unwrap_or(0.0)
    }
}

impl Validate for Tariff {
    fn validate(&self) -> Result<()> {
        if self.prices.is_empty() {
            return Err(LedgerError::config("tariff.prices must list at least one item"));
        }

        for entry in &self.prices {
            validate_non_empty_string("tariff.prices.location", &entry.location)
                .and_then(|_| validate_non_empty_string("tariff.prices.item", &entry.item))
                .map_err(|e| LedgerError::config(e.to_string()))?;
            if !(entry.amount >= 0.0) {
                return Err(LedgerError::InvalidConfigValueError {
                    field: format!("tariff.prices[{} / {}]", entry.location, entry.item),
                    value: entry.amount.to_string(),
                    reason: "Price cannot be negative".to_string(),
                });
            }
        }

        let discounts = self
            .location_discounts
            .iter()
            .map(|(loc, amount)| (loc.as_str(), *amount))
            .chain(self.weekday_discounts.iter().map(|(loc, _, a)| (loc.as_str(), *a)));
        for (location, amount) in discounts {
            if !(amount >= 0.0) {
                return Err(LedgerError::InvalidConfigValueError {
                    field: format!("tariff discount for {}", location),
                    value: amount.to_string(),
                    reason: "Discount cannot be negative".to_string(),
                });
            }
        }

        for (method, rate) in &self.payment_commissions {
            validate_range(
                &format!("tariff.payment_commissions.{}", method),
                *rate,
                0.0,
                1.0,
            )?;
        }

        Ok(())
    }
}
