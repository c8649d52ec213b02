use crate::config::tariff::Tariff;
use crate::core::summary::{LocationTotal, MonthlyTotal};
use crate::domain::model::{Attendance, DateRange, IncomeBreakdown, PaymentMethod};
use crate::utils::error::{LedgerError, Result};
use crate::utils::format::{format_clp, weekday_es};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: [&str; 11] = [
    "id",
    "fecha",
    "lugar",
    "item",
    "paciente",
    "metodo_pago",
    "valor_bruto",
    "desc_fijo_lugar",
    "desc_tarjeta",
    "desc_adicional",
    "total_recibido",
];

/// Flat row shape shared by the export file and the CSV ledger backend.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: i64,
    fecha: NaiveDate,
    lugar: String,
    item: String,
    paciente: String,
    metodo_pago: PaymentMethod,
    #[serde(deserialize_with = "csv::invalid_option")]
    valor_bruto: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    desc_fijo_lugar: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    desc_tarjeta: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    desc_adicional: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    total_recibido: Option<f64>,
}

impl From<&Attendance> for CsvRow {
    fn from(row: &Attendance) -> Self {
        Self {
            id: row.id,
            fecha: row.date,
            lugar: row.location.clone(),
            item: row.item.clone(),
            paciente: row.patient.clone(),
            metodo_pago: row.payment_method,
            valor_bruto: Some(row.breakdown.gross),
            desc_fijo_lugar: Some(row.breakdown.location_discount),
            desc_tarjeta: Some(row.breakdown.card_fee),
            desc_adicional: Some(row.breakdown.extra_discount),
            total_recibido: Some(row.breakdown.net),
        }
    }
}

impl From<CsvRow> for Attendance {
    fn from(row: CsvRow) -> Self {
        Self {
            id: row.id,
            date: row.fecha,
            location: row.lugar,
            item: row.item,
            patient: row.paciente,
            payment_method: row.metodo_pago,
            breakdown: IncomeBreakdown {
                gross: row.valor_bruto.unwrap_or(0.0),
                location_discount: row.desc_fijo_lugar.unwrap_or(0.0),
                card_fee: row.desc_tarjeta.unwrap_or(0.0),
                extra_discount: row.desc_adicional.unwrap_or(0.0),
                net: row.total_recibido.unwrap_or(0.0),
            },
        }
    }
}

pub fn write_csv(rows: &[Attendance]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    // Written by hand so an empty export still carries the header row.
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(CsvRow::from(row))?;
    }

    writer.into_inner().map_err(|e| {
        LedgerError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string()))
    })
}

/// Parses a ledger CSV. Amount cells that are empty or not numbers read as 0.
pub fn read_csv(data: &[u8]) -> Result<Vec<Attendance>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        rows.push(Attendance::from(record?));
    }
    Ok(rows)
}

/// Row label for the location discount. Names the weekday when the location has weekday rules.
pub fn location_discount_label(tariff: &Tariff, location: &str, date: NaiveDate) -> String {
    let mut label = format!("Desc. Fijo Lugar ({})", location);
    if tariff.has_weekday_rules(location) {
        label.push_str(&format!(" ({})", weekday_es(date.weekday())));
    }
    label
}

pub fn total_label(range: &DateRange) -> &'static str {
    if range.is_unbounded() {
        "Total líquido histórico"
    } else {
        "Total líquido del período"
    }
}

const POSITIVE_BAR: char = '█';
const NEGATIVE_BAR: char = '░';

/// Horizontal bar per month, scaled to the largest absolute value.
pub fn render_bar_chart(monthly: &[MonthlyTotal], width: usize) -> String {
    let max = monthly.iter().map(|m| m.net.abs()).fold(0.0_f64, f64::max);
    let amounts: Vec<String> = monthly.iter().map(|m| format_clp(m.net)).collect();
    let amount_width = amounts.iter().map(|a| a.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (month, amount) in monthly.iter().zip(&amounts) {
        let len = if max > 0.0 {
            ((month.net.abs() / max) * width as f64).round() as usize
        } else {
            0
        };
        let glyph = if month.net < 0.0 { NEGATIVE_BAR } else { POSITIVE_BAR };
        let bar: String = std::iter::repeat(glyph).take(len).collect();
        out.push_str(&format!(
            "{}  {:>aw$}  {}\n",
            month.month,
            amount,
            bar,
            aw = amount_width
        ));
    }
    out
}

pub fn render_location_table(totals: &[LocationTotal]) -> String {
    let headers = ("Lugar", "Atenciones", "Total líquido");
    let rows: Vec<(String, String, String)> = totals
        .iter()
        .map(|t| (t.location.clone(), t.count.to_string(), format_clp(t.net)))
        .collect();

    let w0 = rows
        .iter()
        .map(|r| r.0.chars().count())
        .chain(std::iter::once(headers.0.chars().count()))
        .max()
        .unwrap_or(0);
    let w1 = rows
        .iter()
        .map(|r| r.1.len())
        .chain(std::iter::once(headers.1.len()))
        .max()
        .unwrap_or(0);
    let w2 = rows
        .iter()
        .map(|r| r.2.len())
        .chain(std::iter::once(headers.2.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{:<w0$}  {:>w1$}  {:>w2$}\n",
        headers.0,
        headers.1,
        headers.2,
        w0 = w0,
        w1 = w1,
        w2 = w2
    );
    out.push_str(&format!("{}\n", "-".repeat(w0 + w1 + w2 + 4)));
    for (location, count, net) in rows {
        out.push_str(&format!(
            "{:<w0$}  {:>w1$}  {:>w2$}\n",
            location,
            count,
            net,
            w0 = w0,
            w1 = w1,
            w2 = w2
        ));
    }
    out
}
