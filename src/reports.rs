//! Read-only reports over a snapshot of the loan book.
//!
//! Every report takes the records in insertion order and builds a new value;
//! the stored records are never touched. An empty result renders as a fixed
//! message instead of an error.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::format::{format_amount, format_entry, format_grouped};
use crate::record::LoanRecord;

pub const HIGH_PAYMENT_THRESHOLD: Decimal = dec!(300000);
pub const SHORT_TERM_MONTHS: u32 = 12;
pub const LARGE_PRINCIPAL_THRESHOLD: Decimal = dec!(5000000);
pub const LOW_RATE_THRESHOLD: Decimal = dec!(0.02);
pub const SHIFT_AMOUNT: Decimal = dec!(90000);

const RULE_WIDTH: usize = 60;

pub const NO_LOANS: &str = "No loans registered.";
const NO_SUM: &str = "No loans to sum.";
const NO_HIGH_PAYMENTS: &str = "No loans with a payment above $300,000.";
const NO_SHORT_TERM: &str = "No loans with a term under one year.";
const NO_LARGE_PRINCIPAL: &str = "No loan with a principal above $5,000,000 was found.";
const NO_LOW_RATE: &str = "No loan with a rate below 2% was found.";
const NO_PAYMENT_SHIFT: &str = "No loans to increase.";
const NO_PRINCIPAL_SHIFT: &str = "No loans to decrease.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    PaymentSum,
    HighPayments,
    ShortTerm,
    FirstLargePrincipal,
    FirstLowRate,
    ShiftedPayments,
    ShiftedPrincipals,
    Payments,
    Summary,
}

impl ReportKind {
    pub const ALL: [ReportKind; 9] = [
        ReportKind::PaymentSum,
        ReportKind::HighPayments,
        ReportKind::ShortTerm,
        ReportKind::FirstLargePrincipal,
        ReportKind::FirstLowRate,
        ReportKind::ShiftedPayments,
        ReportKind::ShiftedPrincipals,
        ReportKind::Payments,
        ReportKind::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::PaymentSum => "payment-sum",
            ReportKind::HighPayments => "high-payments",
            ReportKind::ShortTerm => "short-term",
            ReportKind::FirstLargePrincipal => "first-large-principal",
            ReportKind::FirstLowRate => "first-low-rate",
            ReportKind::ShiftedPayments => "shifted-payments",
            ReportKind::ShiftedPrincipals => "shifted-principals",
            ReportKind::Payments => "payments",
            ReportKind::Summary => "summary",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReport(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownReport(s.to_string()))
    }
}

/// Payments in insertion order and their total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentTotals {
    pub payments: Vec<Decimal>,
    pub total: Decimal,
}

/// A record found by a first-match search, with its 1-based position in the book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Found {
    pub position: usize,
    pub record: LoanRecord,
}

/// One row of a projection: the stored value next to the shifted one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftedRow {
    pub id: u64,
    pub applicant_name: String,
    pub original: Decimal,
    pub shifted: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub principal_total: Decimal,
    pub payment_total: Decimal,
    pub mean_payment: Decimal,
    pub mean_term_months: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    PaymentSum(PaymentTotals),
    HighPayments(Vec<LoanRecord>),
    ShortTerm(Vec<LoanRecord>),
    FirstLargePrincipal(Option<Found>),
    FirstLowRate(Option<Found>),
    ShiftedPayments(Vec<ShiftedRow>),
    ShiftedPrincipals(Vec<ShiftedRow>),
    Payments(PaymentTotals),
    Summary(Option<Summary>),
}

pub fn payment_totals(records: &[LoanRecord]) -> PaymentTotals {
    let payments: Vec<Decimal> = records.iter().map(|r| r.payment).collect();
    let total = payments.iter().sum();
    PaymentTotals { payments, total }
}

pub fn high_payments(records: &[LoanRecord]) -> Vec<LoanRecord> {
    records
        .iter()
        .filter(|r| r.payment > HIGH_PAYMENT_THRESHOLD)
        .cloned()
        .collect()
}

pub fn short_term(records: &[LoanRecord]) -> Vec<LoanRecord> {
    records
        .iter()
        .filter(|r| r.term_months < SHORT_TERM_MONTHS)
        .cloned()
        .collect()
}

fn first_where(records: &[LoanRecord], predicate: impl Fn(&LoanRecord) -> bool) -> Option<Found> {
    records
        .iter()
        .position(predicate)
        .map(|index| Found {
            position: index + 1,
            record: records[index].clone(),
        })
}

pub fn first_large_principal(records: &[LoanRecord]) -> Option<Found> {
    first_where(records, |r| r.principal > LARGE_PRINCIPAL_THRESHOLD)
}

pub fn first_low_rate(records: &[LoanRecord]) -> Option<Found> {
    first_where(records, |r| r.rate < LOW_RATE_THRESHOLD)
}

/// Every payment raised by [`SHIFT_AMOUNT`].
pub fn shifted_payments(records: &[LoanRecord]) -> Vec<ShiftedRow> {
    records
        .iter()
        .map(|r| ShiftedRow {
            id: r.id,
            applicant_name: r.applicant_name.clone(),
            original: r.payment,
            shifted: r.payment + SHIFT_AMOUNT,
        })
        .collect()
}

/// Every principal lowered by [`SHIFT_AMOUNT`], never below zero.
pub fn shifted_principals(records: &[LoanRecord]) -> Vec<ShiftedRow> {
    records
        .iter()
        .map(|r| ShiftedRow {
            id: r.id,
            applicant_name: r.applicant_name.clone(),
            original: r.principal,
            shifted: (r.principal - SHIFT_AMOUNT).max(Decimal::ZERO),
        })
        .collect()
}

pub fn summary(records: &[LoanRecord]) -> Option<Summary> {
    if records.is_empty() {
        return None;
    }
    let count = Decimal::from(records.len());
    let principal_total: Decimal = records.iter().map(|r| r.principal).sum();
    let payment_total: Decimal = records.iter().map(|r| r.payment).sum();
    let term_total: Decimal = records.iter().map(|r| Decimal::from(r.term_months)).sum();

    Some(Summary {
        count: records.len(),
        principal_total,
        payment_total,
        mean_payment: payment_total / count,
        mean_term_months: term_total / count,
    })
}

impl Report {
    pub fn build(kind: ReportKind, records: &[LoanRecord]) -> Self {
        match kind {
            ReportKind::PaymentSum => Report::PaymentSum(payment_totals(records)),
            ReportKind::HighPayments => Report::HighPayments(high_payments(records)),
            ReportKind::ShortTerm => Report::ShortTerm(short_term(records)),
            ReportKind::FirstLargePrincipal => {
                Report::FirstLargePrincipal(first_large_principal(records))
            }
            ReportKind::FirstLowRate => Report::FirstLowRate(first_low_rate(records)),
            ReportKind::ShiftedPayments => Report::ShiftedPayments(shifted_payments(records)),
            ReportKind::ShiftedPrincipals => {
                Report::ShiftedPrincipals(shifted_principals(records))
            }
            ReportKind::Payments => Report::Payments(payment_totals(records)),
            ReportKind::Summary => Report::Summary(summary(records)),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Report::PaymentSum(totals) if totals.payments.is_empty() => NO_SUM.to_string(),
            Report::PaymentSum(totals) => titled(
                "PAYMENT SUM",
                format!(
                    "Loans: {}\nTotal of payments: ${}\n\nPayments:\n{}",
                    totals.payments.len(),
                    format_grouped(totals.total),
                    numbered_amounts(&totals.payments),
                ),
            ),
            Report::HighPayments(found) => entries(
                found,
                NO_HIGH_PAYMENTS,
                &format!("LOANS WITH A PAYMENT ABOVE $300,000 ({} found)", found.len()),
            ),
            Report::ShortTerm(found) => entries(
                found,
                NO_SHORT_TERM,
                &format!("LOANS UNDER ONE YEAR ({} found)", found.len()),
            ),
            Report::FirstLargePrincipal(found) => single(
                found.as_ref(),
                NO_LARGE_PRINCIPAL,
                "FIRST LOAN ABOVE $5,000,000",
            ),
            Report::FirstLowRate(found) => single(
                found.as_ref(),
                NO_LOW_RATE,
                "FIRST LOAN WITH A RATE BELOW 2%",
            ),
            Report::ShiftedPayments(rows) => shifted(
                rows,
                NO_PAYMENT_SHIFT,
                "PAYMENTS INCREASED BY $90,000",
                ["Original payment", "New payment", "Increase"],
            ),
            Report::ShiftedPrincipals(rows) => shifted(
                rows,
                NO_PRINCIPAL_SHIFT,
                "PRINCIPALS DECREASED BY $90,000",
                ["Original principal", "New principal", "Decrease"],
            ),
            Report::Payments(totals) if totals.payments.is_empty() => NO_LOANS.to_string(),
            Report::Payments(totals) => titled(
                &format!("PAYMENTS ONLY ({} items)", totals.payments.len()),
                format!(
                    "Extracted payments:\n{}\n\nRunning total: ${}",
                    numbered_amounts(&totals.payments),
                    format_grouped(totals.total),
                ),
            ),
            Report::Summary(None) => NO_LOANS.to_string(),
            Report::Summary(Some(s)) => titled(
                "SUMMARY",
                format!(
                    "Loans: {}\nTotal principal: ${}\nTotal payments: ${}\nAverage payment: ${}\nAverage term: {} months",
                    s.count,
                    format_grouped(s.principal_total),
                    format_grouped(s.payment_total),
                    format_grouped(s.mean_payment),
                    format_amount(s.mean_term_months),
                ),
            ),
        }
    }
}

fn titled(title: &str, body: String) -> String {
    format!("{title}\n{}\n\n{body}", "=".repeat(RULE_WIDTH))
}

fn numbered_amounts(amounts: &[Decimal]) -> String {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| format!("  {}. ${}", i + 1, format_grouped(*amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn entries(records: &[LoanRecord], empty: &str, title: &str) -> String {
    if records.is_empty() {
        return empty.to_string();
    }
    let body = records
        .iter()
        .enumerate()
        .map(|(i, r)| format_entry(i + 1, r))
        .collect::<Vec<_>>()
        .join("\n\n");
    titled(title, body)
}

fn single(found: Option<&Found>, empty: &str, title: &str) -> String {
    match found {
        Some(found) => titled(title, format_entry(found.position, &found.record)),
        None => empty.to_string(),
    }
}

fn shifted(rows: &[ShiftedRow], empty: &str, title: &str, labels: [&str; 3]) -> String {
    if rows.is_empty() {
        return empty.to_string();
    }
    let [before, after, delta] = labels;
    let body = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                "[{}] {}\n  • {before}: ${}\n  • {after}: ${}\n  • {delta}: ${}",
                i + 1,
                row.applicant_name,
                format_grouped(row.original),
                format_grouped(row.shifted),
                format_grouped(SHIFT_AMOUNT),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    titled(title, body)
}
