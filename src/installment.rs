use rust_decimal::{Decimal, MathematicalOps};

use crate::error::LoanError;

/// Calculates the fixed monthly installment of a loan.
///
/// The formula is the capital-recovery factor applied to the principal:
/// PMT = P * [i(1 + i)^n] / [(1 + i)^n – 1]
///
/// The rearrangement `P * i / (1 - (1 + i)^-n)` is algebraically the same
/// value; this is the only place the installment is computed.
///
/// # Arguments
///
/// * `principal` - The loan amount.
/// * `term_months` - The number of monthly payments.
/// * `rate` - The periodic (monthly) interest rate as a decimal, not a percentage.
///
/// # Errors
///
/// Returns [`LoanError::Domain`] if the term is zero, the rate is negative or the
/// principal is not positive, and [`LoanError::Arithmetic`] if the installment
/// itself does not fit the decimal range. A `(1 + i)^n` too large for a
/// `Decimal` is not an error: the installment is then `P * i`.
pub fn monthly_installment(
    principal: Decimal,
    term_months: u32,
    rate: Decimal,
) -> Result<Decimal, LoanError> {
    if term_months == 0 {
        return Err(LoanError::Domain("term must be at least one month".into()));
    }
    if rate < Decimal::ZERO {
        return Err(LoanError::Domain(format!("negative rate {rate}")));
    }
    if principal <= Decimal::ZERO {
        return Err(LoanError::Domain(format!("non-positive principal {principal}")));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let overflow = || LoanError::Arithmetic { context: "monthly installment" };

    // P*i*f/(f-1) == P*i + P*i/(f-1); the split form never builds P*f
    let interest = principal.checked_mul(rate).ok_or_else(overflow)?;
    let Some(factor) = (Decimal::ONE + rate).checked_powu(term_months.into()) else {
        // 1/(f-1) is below the decimal resolution once f overflows
        return Ok(interest);
    };
    let growth = factor - Decimal::ONE;
    if growth.is_zero() {
        // rate too small to move (1 + i)^n at 28 places
        return Ok(principal / Decimal::from(term_months));
    }

    let amortization = interest.checked_div(growth).ok_or_else(overflow)?;
    interest.checked_add(amortization).ok_or_else(overflow)
}
