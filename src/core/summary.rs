use crate::domain::model::Attendance;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationTotal {
    pub location: String,
    pub net: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub total_net: f64,
    pub monthly: Vec<MonthlyTotal>,
    pub by_location: Vec<LocationTotal>,
}

impl Summary {
    pub fn build(rows: &[Attendance]) -> Self {
        Self {
            count: rows.len(),
            total_net: total_net(rows),
            monthly: monthly_net(rows),
            by_location: net_by_location(rows),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

pub fn total_net(rows: &[Attendance]) -> f64 {
    rows.iter().map(Attendance::net).sum()
}

/// Net income per calendar month, oldest month first.
pub fn monthly_net(rows: &[Attendance]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        *months.entry(row.date.format("%Y-%m").to_string()).or_default() += row.net();
    }

    months
        .into_iter()
        .map(|(month, net)| MonthlyTotal { month, net })
        .collect()
}

/// Net income and attendance count per location, by location name.
pub fn net_by_location(rows: &[Attendance]) -> Vec<LocationTotal> {
    let mut locations: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = locations.entry(row.location.as_str()).or_default();
        entry.0 += row.net();
        entry.1 += 1;
    }

    locations
        .into_iter()
        .map(|(location, (net, count))| LocationTotal {
            location: location.to_string(),
            net,
            count,
        })
        .collect()
}
