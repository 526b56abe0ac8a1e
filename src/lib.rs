//! `loan_desk` computes fixed monthly loan installments and keeps the submitted
//! loans in an in-memory book that can be searched and reported on.
//!
//! It is made of four pieces:
//! - **Installment calculator**: the capital-recovery formula
//!   `PMT = P * [i(1 + i)^n] / [(1 + i)^n – 1]`, or `P / n` when the rate is zero.
//! - **Loan store**: an append-only list with ids assigned from 1, behind a single lock.
//! - **Reports**: sums, threshold filters, first-match lookups and shifted
//!   projections over a snapshot of the store. None of them mutate it.
//! - **Formatter**: the one-line record template and the report text.
//!
//! The `loan-desk` binary serves all of this over HTTP (see [`api`]).
//!
//! ## Usage
//!
//! ```rust
//! use loan_desk::{format_record, LoanRequest, LoanStore, Report, ReportKind};
//! use rust_decimal_macros::dec;
//!
//! let store = LoanStore::new();
//! let request = LoanRequest::new("Juan Pérez", dec!(5000000), 12, dec!(0.15))?;
//! let record = store.insert(&request)?;
//!
//! assert_eq!(
//!     format_record(&record),
//!     "Juan Pérez – $922403.88 -- $5000000.00 -- 12 meses -- interés 15.00%"
//! );
//!
//! let report = Report::build(ReportKind::HighPayments, &store.list_all()?);
//! println!("{}", report.render());
//! # Ok::<(), loan_desk::LoanError>(())
//! ```
//!
//! Rates are periodic (monthly) decimals: `0.15` means 15% per month.

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod installment;
pub mod record;
pub mod reports;
pub mod store;

pub use error::{Field, LoanError};
pub use format::{format_list, format_record};
pub use installment::monthly_installment;
pub use record::{LoanRecord, LoanRequest, LoanSubmission};
pub use reports::{Report, ReportKind};
pub use store::LoanStore;
