//! pt-BR display helpers used by table rendering.

use chrono::NaiveDate;

/// Formats a value as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let units = cents / 100;
    let fraction = cents % 100;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {},{fraction:02}", group_thousands(units))
}

/// Formats an ISO date as `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}

pub fn format_hours(hours: i32) -> String {
    format!("{hours}h")
}

pub fn format_active(active: bool) -> &'static str {
    if active {
        "Ativo"
    } else {
        "Inativo"
    }
}

fn group_thousands(mut units: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if units < 1000 {
            groups.push(units.to_string());
            break;
        }
        groups.push(format!("{:03}", units % 1000));
        units /= 1000;
    }
    groups.reverse();
    groups.join(".")
}
