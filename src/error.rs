use thiserror::Error;

/// Input field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ApplicantName,
    Principal,
    TermMonths,
    Rate,
    SearchQuery,
}

impl Field {
    /// Machine-readable code returned alongside the message.
    pub fn code(self) -> &'static str {
        match self {
            Field::ApplicantName => "invalid_applicant_name",
            Field::Principal => "invalid_principal",
            Field::TermMonths => "invalid_term_months",
            Field::Rate => "invalid_rate",
            Field::SearchQuery => "empty_search_query",
        }
    }
}

#[derive(Debug, Error)]
pub enum LoanError {
    #[error("{message}")]
    Validation { field: Field, message: &'static str },

    #[error("request body must be a JSON object")]
    MalformedBody,

    #[error("installment precondition violated: {0}")]
    Domain(String),

    #[error("arithmetic overflow while computing {context}")]
    Arithmetic { context: &'static str },

    #[error("loan store is unavailable")]
    StoreUnavailable,
}

impl LoanError {
    pub fn validation(field: Field, message: &'static str) -> Self {
        LoanError::Validation { field, message }
    }

    /// Caused by the caller's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LoanError::Validation { .. } | LoanError::MalformedBody)
    }
}
