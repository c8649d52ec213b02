use chrono::Weekday;

/// Formats an amount as whole Chilean pesos, e.g. `$1.234.567`.
pub fn format_clp(value: f64) -> String {
    let rounded = value.round();
    // -0.4 rounds to -0 and must not print as "-$0".
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

pub fn format_percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

pub fn weekday_es(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}
