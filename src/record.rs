use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Field, LoanError};

/// A stored loan. The payment is derived once at insertion and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    /// Assigned by the store, starting at 1 after every clear.
    pub id: u64,
    pub applicant_name: String,
    pub principal: Decimal,
    pub term_months: u32,
    /// Monthly rate as a decimal (0.15 for 15%).
    pub rate: Decimal,
    pub payment: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Request body exactly as the client sent it; nothing here is trusted yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSubmission {
    #[serde(default)]
    pub applicant_name: Option<Value>,
    #[serde(default)]
    pub principal: Option<Value>,
    #[serde(default)]
    pub term_months: Option<Value>,
    #[serde(default)]
    pub rate: Option<Value>,
}

/// Validated loan parameters. Only obtainable through [`LoanRequest::new`] or
/// [`LoanSubmission::validate`], so every instance satisfies the calculator's
/// preconditions.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    applicant_name: String,
    principal: Decimal,
    term_months: u32,
    rate: Decimal,
}

const NAME_MESSAGE: &str = "applicantName must not be empty";
const PRINCIPAL_MESSAGE: &str = "principal must be a positive number";
const TERM_MESSAGE: &str = "termMonths must be a positive integer";
const RATE_MESSAGE: &str = "rate must be a non-negative number";
const PRINCIPAL_LIMIT_MESSAGE: &str = "principal must not exceed 79228162514264337593543950335";
const RATE_LIMIT_MESSAGE: &str = "rate must not exceed 79228162514264337593543950335";
const QUERY_MESSAGE: &str = "search query must not be empty";

impl LoanRequest {
    /// Checks fields in order name, principal, term, rate; the first failure wins.
    pub fn new(
        applicant_name: &str,
        principal: Decimal,
        term_months: u32,
        rate: Decimal,
    ) -> Result<Self, LoanError> {
        let applicant_name = applicant_name.trim();
        if applicant_name.is_empty() {
            return Err(LoanError::validation(Field::ApplicantName, NAME_MESSAGE));
        }
        if principal <= Decimal::ZERO {
            return Err(LoanError::validation(Field::Principal, PRINCIPAL_MESSAGE));
        }
        if term_months == 0 {
            return Err(LoanError::validation(Field::TermMonths, TERM_MESSAGE));
        }
        if rate < Decimal::ZERO {
            return Err(LoanError::validation(Field::Rate, RATE_MESSAGE));
        }

        Ok(Self {
            applicant_name: applicant_name.to_string(),
            principal,
            term_months,
            rate,
        })
    }

    pub fn applicant_name(&self) -> &str {
        &self.applicant_name
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }
}

impl LoanSubmission {
    /// Converts the untyped body into a [`LoanRequest`].
    ///
    /// Amounts must be JSON numbers; numeric strings are treated as non-numeric.
    pub fn validate(&self) -> Result<LoanRequest, LoanError> {
        let name = match &self.applicant_name {
            Some(Value::String(name)) => name.as_str(),
            _ => return Err(LoanError::validation(Field::ApplicantName, NAME_MESSAGE)),
        };
        if name.trim().is_empty() {
            return Err(LoanError::validation(Field::ApplicantName, NAME_MESSAGE));
        }

        let principal = decimal_from(self.principal.as_ref()).map_err(|err| match err {
            Unparsed::TooLarge => LoanError::validation(Field::Principal, PRINCIPAL_LIMIT_MESSAGE),
            Unparsed::Invalid => LoanError::validation(Field::Principal, PRINCIPAL_MESSAGE),
        })?;
        if principal <= Decimal::ZERO {
            return Err(LoanError::validation(Field::Principal, PRINCIPAL_MESSAGE));
        }

        let term_months = term_from(self.term_months.as_ref())
            .ok_or_else(|| LoanError::validation(Field::TermMonths, TERM_MESSAGE))?;

        let rate = decimal_from(self.rate.as_ref()).map_err(|err| match err {
            Unparsed::TooLarge => LoanError::validation(Field::Rate, RATE_LIMIT_MESSAGE),
            Unparsed::Invalid => LoanError::validation(Field::Rate, RATE_MESSAGE),
        })?;

        LoanRequest::new(name, principal, term_months, rate)
    }
}

/// Normalizes a name search query; blank queries are an input error.
pub fn search_query(raw: &str) -> Result<String, LoanError> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(empty_search_query());
    }
    Ok(query.to_lowercase())
}

pub fn empty_search_query() -> LoanError {
    LoanError::validation(Field::SearchQuery, QUERY_MESSAGE)
}

/// Why a JSON value did not become a `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unparsed {
    /// Missing, not a number, or a negative number past the range.
    Invalid,
    /// Positive and above `Decimal::MAX`.
    TooLarge,
}

/// Numbers with more than 28 decimal places are rounded to 28, so `1e-30`
/// reads as zero.
fn decimal_from(value: Option<&Value>) -> Result<Decimal, Unparsed> {
    let Some(Value::Number(number)) = value else {
        return Err(Unparsed::Invalid);
    };
    let text = number.to_string();
    if let Ok(decimal) = Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        return Ok(decimal);
    }

    let float = number.as_f64().ok_or(Unparsed::Invalid)?;
    if float.abs() >= 1.0 {
        return Err(if float > 0.0 { Unparsed::TooLarge } else { Unparsed::Invalid });
    }

    // below one, the only failure left is a scale past 28
    let (mantissa, exponent) = text.split_once(['e', 'E']).ok_or(Unparsed::Invalid)?;
    let mut decimal = Decimal::from_str(mantissa).map_err(|_| Unparsed::Invalid)?;
    let exponent: i32 = exponent.parse().map_err(|_| Unparsed::Invalid)?;
    for _ in 0..exponent.min(0).unsigned_abs() {
        decimal /= Decimal::TEN;
    }
    Ok(decimal)
}

fn term_from(value: Option<&Value>) -> Option<u32> {
    let Some(Value::Number(number)) = value else {
        return None;
    };
    if let Some(whole) = number.as_u64() {
        return u32::try_from(whole).ok().filter(|term| *term > 0);
    }
    // 12.0 is an integer, 12.5 and -3 are not
    let float = number.as_f64()?;
    if float.fract() == 0.0 && float >= 1.0 && float <= f64::from(u32::MAX) {
        Some(float as u32)
    } else {
        None
    }
}
