//! HTTP surface of the loan desk.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::LoanError;
use crate::format::{format_list, format_preview, format_record};
use crate::installment::monthly_installment;
use crate::record::{LoanRecord, LoanSubmission, empty_search_query};
use crate::reports::{NO_LOANS, Report, ReportKind};
use crate::store::LoanStore;

const INTERNAL_ERROR: &str = "internal server error";
const ROUTE_NOT_FOUND: &str = "route not found";
const CLEARED: &str = "All loans have been removed";

#[derive(Clone, Default)]
pub struct AppState {
    pub store: Arc<LoanStore>,
}

impl AppState {
    pub fn new(store: Arc<LoanStore>) -> Self {
        Self { store }
    }
}

pub fn app() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/loans", post(create_loan).get(list_loans).delete(clear_loans))
        .route("/loans/preview", post(preview_loan))
        .route("/loans/search", get(search_without_query))
        .route("/loans/search/", get(search_without_query))
        .route("/loans/search/{name}", get(search_loans))
        .route("/loans/reports/{kind}", get(report))
        .fallback(not_found)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedBody {
    result_text: String,
    record: LoanRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListBody {
    records: Vec<LoanRecord>,
    total: usize,
    result_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearedBody {
    message: &'static str,
    removed_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewBody {
    payment: Decimal,
    result_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody {
    report: &'static str,
    result_text: String,
    data: Report,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    loans: usize,
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, error: &str, code: Option<&'static str>) -> Response {
    json_response(
        status,
        ErrorBody {
            error: error.to_string(),
            code,
        },
    )
}

impl LoanError {
    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for LoanError {
    fn into_response(self) -> Response {
        match &self {
            LoanError::Validation { field, message } => {
                warn!(code = field.code(), "rejected input: {message}");
                error_response(self.status(), message, Some(field.code()))
            }
            LoanError::MalformedBody => {
                warn!("rejected body that is not a JSON object");
                error_response(self.status(), &self.to_string(), None)
            }
            _ => {
                // details stay in the log
                error!(error = %self, "request failed");
                error_response(self.status(), INTERNAL_ERROR, None)
            }
        }
    }
}

fn submission(
    payload: Result<Json<LoanSubmission>, JsonRejection>,
) -> Result<LoanSubmission, LoanError> {
    payload
        .map(|Json(submission)| submission)
        .map_err(|rejection| {
            warn!(%rejection, "unreadable loan body");
            LoanError::MalformedBody
        })
}

fn list_text(records: &[LoanRecord], empty: impl FnOnce() -> String) -> String {
    if records.is_empty() {
        empty()
    } else {
        format_list(records)
    }
}

pub async fn health(State(state): State<AppState>) -> Result<Response, LoanError> {
    let loans = state.store.len()?;
    Ok(json_response(StatusCode::OK, HealthBody { status: "ok", loans }))
}

pub async fn create_loan(
    State(state): State<AppState>,
    payload: Result<Json<LoanSubmission>, JsonRejection>,
) -> Result<Response, LoanError> {
    let request = submission(payload)?.validate()?;
    let record = state.store.insert(&request)?;

    info!(
        id = record.id,
        applicant = %record.applicant_name,
        payment = %record.payment.round_dp(2),
        "loan stored"
    );

    Ok(json_response(
        StatusCode::CREATED,
        CreatedBody {
            result_text: format_record(&record),
            record,
        },
    ))
}

pub async fn preview_loan(
    payload: Result<Json<LoanSubmission>, JsonRejection>,
) -> Result<Response, LoanError> {
    let request = submission(payload)?.validate()?;
    let payment = monthly_installment(request.principal(), request.term_months(), request.rate())?;

    Ok(json_response(
        StatusCode::OK,
        PreviewBody {
            result_text: format_preview(&request, payment),
            payment,
        },
    ))
}

pub async fn list_loans(State(state): State<AppState>) -> Result<Response, LoanError> {
    let records = state.store.list_all()?;
    info!(count = records.len(), "loans listed");

    Ok(json_response(
        StatusCode::OK,
        ListBody {
            total: records.len(),
            result_text: list_text(&records, || NO_LOANS.to_string()),
            records,
        },
    ))
}

pub async fn search_loans(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, LoanError> {
    let records = state.store.find_by_name(&name)?;
    info!(query = %name, count = records.len(), "loans searched");

    Ok(json_response(
        StatusCode::OK,
        ListBody {
            total: records.len(),
            result_text: list_text(&records, || format!("No loans found for \"{name}\".")),
            records,
        },
    ))
}

pub async fn search_without_query() -> Response {
    empty_search_query().into_response()
}

pub async fn clear_loans(State(state): State<AppState>) -> Result<Response, LoanError> {
    let removed_count = state.store.clear()?;
    info!(removed_count, "loans cleared");

    Ok(json_response(
        StatusCode::OK,
        ClearedBody {
            message: CLEARED,
            removed_count,
        },
    ))
}

pub async fn report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, LoanError> {
    let Ok(kind) = kind.parse::<ReportKind>() else {
        return Ok(not_found().await);
    };
    let records = state.store.list_all()?;
    let data = Report::build(kind, &records);

    Ok(json_response(
        StatusCode::OK,
        ReportBody {
            report: kind.as_str(),
            result_text: data.render(),
            data,
        },
    ))
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn state() -> AppState {
        AppState::default()
    }

    fn body(value: Value) -> Result<Json<LoanSubmission>, JsonRejection> {
        Ok(Json(serde_json::from_value(value).unwrap()))
    }

    async fn read(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn respond(result: Result<Response, LoanError>) -> (StatusCode, Value) {
        read(result.unwrap_or_else(IntoResponse::into_response)).await
    }

    async fn submit(state: &AppState, name: &str, principal: f64, term: u32, rate: f64) -> Value {
        let payload = body(json!({
            "applicantName": name,
            "principal": principal,
            "termMonths": term,
            "rate": rate
        }));
        let (status, value) = respond(create_loan(State(state.clone()), payload).await).await;
        assert_eq!(status, StatusCode::CREATED);
        value
    }

    #[rstest]
    #[tokio::test]
    async fn test_created_loan_carries_text_and_record(state: AppState) {
        let value = submit(&state, "Juan Pérez", 5000000.0, 12, 0.15).await;

        assert_eq!(
            value["resultText"],
            "Juan Pérez – $922403.88 -- $5000000.00 -- 12 meses -- interés 15.00%"
        );
        assert_eq!(value["record"]["id"], 1);
        assert_eq!(value["record"]["applicantName"], "Juan Pérez");
        assert_eq!(value["record"]["termMonths"], 12);
        assert!(value["record"]["createdAt"].is_string());
    }

    #[rstest]
    #[tokio::test]
    async fn test_invalid_body_is_rejected_before_storing(state: AppState) {
        let payload = body(json!({"applicantName": "", "principal": 1000, "termMonths": 12, "rate": 0.1}));
        let (status, value) = respond(create_loan(State(state.clone()), payload).await).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "applicantName must not be empty");
        assert_eq!(value["code"], "invalid_applicant_name");
        assert_eq!(state.store.len().unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_long_term_loan_is_created(state: AppState) {
        let payload = body(json!({"applicantName": "Rosa", "principal": 1000, "termMonths": 480, "rate": 0.15}));
        let (status, value) = respond(create_loan(State(state.clone()), payload).await).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(value["record"]["payment"], json!(150.0));
        assert_eq!(state.store.len().unwrap(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_overflowing_loan_is_a_generic_internal_error(state: AppState) {
        let payload = body(json!({"applicantName": "Max", "principal": 7e28, "termMonths": 12, "rate": 2}));
        let (status, value) = respond(create_loan(State(state.clone()), payload).await).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value, json!({"error": "internal server error"}));
        assert_eq!(state.store.len().unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_empty_list_uses_the_empty_message(state: AppState) {
        let (status, value) = respond(list_loans(State(state)).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({"records": [], "total": 0, "resultText": "No loans registered."}));
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_joins_every_record(state: AppState) {
        submit(&state, "Ana", 1200.0, 12, 0.0).await;
        submit(&state, "Luis", 2400.0, 24, 0.0).await;

        let (_, value) = respond(list_loans(State(state)).await).await;
        assert_eq!(value["total"], 2);
        assert_eq!(
            value["resultText"],
            "Ana – $100.00 -- $1200.00 -- 12 meses -- interés 0.00%\nLuis – $100.00 -- $2400.00 -- 24 meses -- interés 0.00%"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_search_matches_case_insensitively(state: AppState) {
        for name in ["Juan Pérez", "Ana Gómez", "María Ana"] {
            submit(&state, name, 1000.0, 6, 0.01).await;
        }

        let (status, value) =
            respond(search_loans(State(state), Path("ANA".to_string())).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["total"], 2);
        assert_eq!(value["records"][0]["applicantName"], "Ana Gómez");
        assert_eq!(value["records"][1]["applicantName"], "María Ana");
    }

    #[rstest]
    #[tokio::test]
    async fn test_search_without_matches_explains_itself(state: AppState) {
        let (status, value) =
            respond(search_loans(State(state), Path("zoe".to_string())).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["resultText"], "No loans found for \"zoe\".");
    }

    #[rstest]
    #[tokio::test]
    async fn test_blank_search_is_a_bad_request(state: AppState) {
        let (status, value) =
            respond(search_loans(State(state.clone()), Path("  ".to_string())).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["code"], "empty_search_query");

        let (status, _) = read(search_without_query().await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[tokio::test]
    async fn test_clear_reports_count_and_restarts_ids(state: AppState) {
        submit(&state, "Ana", 1000.0, 6, 0.01).await;
        submit(&state, "Luis", 1000.0, 6, 0.01).await;

        let (status, value) = respond(clear_loans(State(state.clone())).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({"message": "All loans have been removed", "removedCount": 2}));

        let value = submit(&state, "Eva", 1000.0, 6, 0.01).await;
        assert_eq!(value["record"]["id"], 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_preview_computes_without_storing(state: AppState) {
        let payload = body(json!({"applicantName": "Ana", "principal": 1200, "termMonths": 12, "rate": 0}));
        let (status, value) = respond(preview_loan(payload).await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            value["resultText"],
            "Ana debe pagar $100.00 cada mes por el préstamo de $1,200.00 a 12 meses con el interés del 0.00%"
        );
        assert_eq!(state.store.len().unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_shifted_payment_report_leaves_stored_payments(state: AppState) {
        submit(&state, "Ana", 1200.0, 12, 0.0).await;

        let (status, value) = respond(
            report(State(state.clone()), Path("shifted-payments".to_string())).await,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["report"], "shifted-payments");
        assert_eq!(value["data"][0]["shifted"], 90100.0);

        let records = state.store.list_all().unwrap();
        assert_eq!(records[0].payment, Decimal::from(100));
    }

    #[rstest]
    #[tokio::test]
    async fn test_report_on_empty_book_is_a_message(state: AppState) {
        let (status, value) =
            respond(report(State(state), Path("high-payments".to_string())).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["resultText"], "No loans with a payment above $300,000.");
    }

    #[rstest]
    #[tokio::test]
    async fn test_unknown_report_is_not_found(state: AppState) {
        let (status, value) =
            respond(report(State(state), Path("everything".to_string())).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value, json!({"error": "route not found"}));
    }

    #[tokio::test]
    async fn test_responses_are_not_cached() {
        let response = not_found().await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_counts_loans(state: AppState) {
        submit(&state, "Ana", 1000.0, 6, 0.01).await;
        let (_, value) = respond(health(State(state)).await).await;
        assert_eq!(value, json!({"status": "ok", "loans": 1}));
    }

    #[test]
    fn test_router_builds_with_state() {
        let _router: Router = app().with_state(AppState::default());
    }
}
