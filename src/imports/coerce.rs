// src/imports/coerce.rs

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

/// Limpa uma string de moeda para os dígitos, ponto e sinal, e converte.
/// Qualquer coisa imprestável vira 0 — a validação de linha nunca deve
/// derrubar a irmã por um valor sujo.
pub fn parse_amount(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    cleaned.parse().unwrap_or(Decimal::ZERO)
}

/// Serial de data do Excel. A época é 1899-12-30 (compensando o bug do ano
/// bissexto de 1900).
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial as i64))
}

// Formatos de texto que esses exports realmente emitem.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d/%m/%y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%m/%d/%Y",
];

/// Data em texto livre: tenta os formatos conhecidos na ordem.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Normaliza um telefone para os últimos 10 dígitos. Devolve None quando o
/// resultado não é um celular plausível — quem chama descarta o telefone,
/// não a linha.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 10 {
        return None;
    }
    Some(digits[digits.len() - 10..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn amount_strips_currency_noise() {
        assert_eq!(parse_amount("₹ 1,234.56"), "1234.56".parse().unwrap());
        assert_eq!(parse_amount("5000"), Decimal::from(5000));
        assert_eq!(parse_amount("-42.50"), "-42.50".parse().unwrap());
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("Dr"), Decimal::ZERO);
    }

    #[test]
    fn excel_serial_matches_known_dates() {
        assert_eq!(excel_serial_to_date(45667.0), Some(d(2025, 1, 10)));
        assert_eq!(excel_serial_to_date(45383.0), Some(d(2024, 4, 1)));
    }

    #[test]
    fn flexible_date_accepts_common_formats() {
        assert_eq!(parse_flexible_date("2024-04-01"), Some(d(2024, 4, 1)));
        assert_eq!(parse_flexible_date("01/04/2024"), Some(d(2024, 4, 1)));
        assert_eq!(parse_flexible_date("01-04-2024"), Some(d(2024, 4, 1)));
        assert_eq!(parse_flexible_date("01-Apr-2024"), Some(d(2024, 4, 1)));
        assert_eq!(parse_flexible_date("  2024-04-01  "), Some(d(2024, 4, 1)));
    }

    #[test]
    fn flexible_date_rejects_garbage() {
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("not a date"), None);
        assert_eq!(parse_flexible_date("32/13/2024"), None);
    }

    #[test]
    fn phone_keeps_last_ten_digits() {
        assert_eq!(normalize_phone("+91 98765 43210"), Some("9876543210".to_string()));
        assert_eq!(normalize_phone("098-7654-3210"), Some("9876543210".to_string()));
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone(""), None);
    }
}
