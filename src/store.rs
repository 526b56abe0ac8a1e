use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::error::LoanError;
use crate::installment::monthly_installment;
use crate::record::{search_query, LoanRecord, LoanRequest};

const FIRST_ID: u64 = 1;

#[derive(Debug)]
struct Ledger {
    records: Vec<LoanRecord>,
    next_id: u64,
}

/// Append-only, in-memory loan book.
///
/// The records and the id counter live behind one lock, so an insert or a clear
/// is never observed half done. Reads clone a consistent snapshot.
#[derive(Debug)]
pub struct LoanStore {
    ledger: Mutex<Ledger>,
}

impl Default for LoanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanStore {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                records: Vec::new(),
                next_id: FIRST_ID,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, LoanError> {
        self.ledger.lock().map_err(|_| LoanError::StoreUnavailable)
    }

    /// Computes the installment, assigns the next id and appends the record.
    ///
    /// Nothing is appended when the installment cannot be computed.
    pub fn insert(&self, request: &LoanRequest) -> Result<LoanRecord, LoanError> {
        let payment = monthly_installment(
            request.principal(),
            request.term_months(),
            request.rate(),
        )?;

        let mut ledger = self.lock()?;
        let record = LoanRecord {
            id: ledger.next_id,
            applicant_name: request.applicant_name().to_string(),
            principal: request.principal(),
            term_months: request.term_months(),
            rate: request.rate(),
            payment,
            created_at: Utc::now(),
        };
        ledger.next_id += 1;
        ledger.records.push(record.clone());

        Ok(record)
    }

    /// Every record in insertion order.
    pub fn list_all(&self) -> Result<Vec<LoanRecord>, LoanError> {
        Ok(self.lock()?.records.clone())
    }

    /// Case-insensitive substring match on the applicant name.
    pub fn find_by_name(&self, query: &str) -> Result<Vec<LoanRecord>, LoanError> {
        let needle = search_query(query)?;
        let ledger = self.lock()?;
        Ok(ledger
            .records
            .iter()
            .filter(|r| r.applicant_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    /// Drops every record and restarts ids at 1. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, LoanError> {
        let mut ledger = self.lock()?;
        let removed = ledger.records.len();
        ledger.records.clear();
        ledger.next_id = FIRST_ID;
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize, LoanError> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, LoanError> {
        Ok(self.len()? == 0)
    }
}
