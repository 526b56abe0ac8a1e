//! Human-readable rendering of loan records.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::record::{LoanRecord, LoanRequest};

fn two_places(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `1234567.891` -> `1234567.89`
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", two_places(value))
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_grouped(value: Decimal) -> String {
    let plain = format_amount(value.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if two_places(value) < Decimal::ZERO { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

/// A decimal rate shown as a percentage: `0.15` -> `15.00`.
pub fn format_percent(rate: Decimal) -> String {
    format_amount(rate * Decimal::ONE_HUNDRED)
}

/// `Juan Pérez – $484029.91 -- $5000000.00 -- 12 meses -- interés 15.00%`
pub fn format_record(record: &LoanRecord) -> String {
    format!(
        "{} – ${} -- ${} -- {} meses -- interés {}%",
        record.applicant_name,
        format_amount(record.payment),
        format_amount(record.principal),
        record.term_months,
        format_percent(record.rate),
    )
}

pub fn format_list(records: &[LoanRecord]) -> String {
    records
        .iter()
        .map(format_record)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sentence shown for a payment that was computed but not stored.
pub fn format_preview(request: &LoanRequest, payment: Decimal) -> String {
    format!(
        "{} debe pagar ${} cada mes por el préstamo de ${} a {} meses con el interés del {}%",
        request.applicant_name(),
        format_grouped(payment),
        format_grouped(request.principal()),
        request.term_months(),
        format_percent(request.rate()),
    )
}

/// Multi-line block used by reports; `position` is 1-based.
pub fn format_entry(position: usize, record: &LoanRecord) -> String {
    format!(
        "[{position}] {}\n  • Principal: ${}\n  • Monthly payment: ${}\n  • Term: {} months\n  • Rate: {}%",
        record.applicant_name,
        format_grouped(record.principal),
        format_grouped(record.payment),
        record.term_months,
        format_percent(record.rate),
    )
}
