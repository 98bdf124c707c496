//! Axum route handlers for payment requests, verification and webhooks.
//!
//! Endpoints:
//! - `POST /api/payment/request` - create a payment request
//! - `GET /api/payment/request/{reference}` - fetch a live payment request
//! - `GET /api/payment/request/{reference}/qr` - QR code of its Solana Pay URL
//! - `GET /api/payment/verify` - look for a matching on-chain transfer
//! - `POST /api/webhook/payment` - apply payment status events

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use solpick::qr::{QrOptions, render_qr_svg};
use solpick::{AmountInput, DecimalAmount, RetryPolicy, UnixTimestamp, with_retry};
use solpick_svm::chain::{Address, AddressInput, LedgerHistory};
use solpick_svm::pay::{
    ReferenceVerifier, VerificationRequest, generate_reference, sol_to_lamports,
};
use url::Url;

use crate::error::{ApiError, FieldIssue};
use crate::store::{PaymentRecord, PaymentStore};

/// Everything the handlers share.
pub struct AppState {
    /// Payment request persistence.
    pub store: Arc<dyn PaymentStore>,
    /// On-chain reference verifier.
    pub verifier: ReferenceVerifier<Arc<dyn LedgerHistory>>,
    /// Base URL of the hosted payment page.
    pub hosted_pick_base_url: Url,
    /// Backoff applied to verification when the RPC node rate limits.
    pub retry: RetryPolicy,
    /// QR rendering options.
    pub qr: QrOptions,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("hosted_pick_base_url", &self.hosted_pick_base_url.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Shared application state.
pub type SharedState = Arc<AppState>;

/// Body of `POST /api/payment/request`.
///
/// A client-supplied `reference` is ignored; every request gets a fresh one.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePaymentBody {
    /// Receiving account.
    #[serde(default)]
    pub recipient: Option<String>,
    /// Amount in SOL, as a string or a number.
    #[serde(default)]
    pub amount: Option<Value>,
    /// Merchant label.
    #[serde(default)]
    pub label: Option<String>,
    /// Message shown to the payer.
    #[serde(default)]
    pub message: Option<String>,
    /// On-chain memo.
    #[serde(default)]
    pub memo: Option<String>,
}

/// A payment request together with the links that pay it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestResponse {
    /// The stored record.
    #[serde(flatten)]
    pub record: PaymentRecord,
    /// `solana:` URL for wallets.
    pub solana_pay_url: String,
    /// Link to the hosted payment page.
    pub hosted_url: String,
}

impl PaymentRequestResponse {
    fn new(record: PaymentRecord, hosted_base: &Url) -> Self {
        let link = record.link();
        Self {
            solana_pay_url: link.solana_pay_url(),
            hosted_url: link.hosted_url(hosted_base).into(),
            record,
        }
    }
}

/// Query of `GET /api/payment/verify`.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    /// Reference key of the payment request.
    pub reference: Option<String>,
    /// Receiving account.
    pub recipient: Option<String>,
    /// Expected amount in SOL.
    pub amount: Option<String>,
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum VerifyResponse {
    /// A matching transfer was found.
    #[serde(rename = "verified")]
    Verified {
        /// Signature of the matching transaction.
        signature: String,
    },
    /// No recent transaction matched.
    #[serde(rename = "not found")]
    NotFound,
}

/// Body of `POST /api/webhook/payment`.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    /// Event name such as `payment_confirmed`.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: Option<WebhookData>,
}

/// Payload of a webhook event.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    /// Reference key of the affected payment request.
    #[serde(default)]
    pub reference: Option<String>,
}

fn parse_amount(value: Value) -> Result<DecimalAmount, FieldIssue> {
    let parsed = match value {
        Value::String(text) => text.into_amount(),
        Value::Number(number) => number.to_string().into_amount(),
        _ => return Err(FieldIssue::new("amount", "Expected a string or number")),
    };
    let amount = parsed.map_err(|e| FieldIssue::from(&e))?;
    sol_to_lamports(&amount).map_err(|e| FieldIssue::from(&e))?;
    Ok(amount)
}

/// A reference from the path. Malformed references cannot name a stored
/// record, so they read as "not found".
fn path_reference(reference: &str) -> Result<Address, ApiError> {
    reference.parse().map_err(|_| ApiError::NotFound)
}

/// `POST /api/payment/request` - Creates a payment request.
///
/// # Errors
///
/// Returns 400 with field issues on invalid input.
pub async fn create_payment_request(
    State(state): State<SharedState>,
    body: Result<Json<CreatePaymentBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let mut issues = Vec::new();

    let recipient = match body.recipient.as_deref() {
        None => {
            issues.push(FieldIssue::required("recipient"));
            None
        }
        Some(raw) => raw
            .into_address("recipient")
            .map_err(|e| issues.push(FieldIssue::from(&e)))
            .ok(),
    };
    let amount = match body.amount {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::required("amount"));
            None
        }
        Some(raw) => parse_amount(raw).map_err(|e| issues.push(e)).ok(),
    };
    let (Some(recipient), Some(amount)) = (recipient, amount) else {
        return Err(ApiError::InvalidInput(issues));
    };

    let mut record = PaymentRecord::new(generate_reference(), recipient, amount);
    record.label = body.label.filter(|s| !s.is_empty());
    record.message = body.message.filter(|s| !s.is_empty());
    record.memo = body.memo.filter(|s| !s.is_empty());

    let record = state.store.create(record).await?;
    tracing::info!(
        reference = %record.reference,
        recipient = %record.recipient,
        amount = %record.amount,
        "Created payment request"
    );
    Ok((
        StatusCode::CREATED,
        Json(PaymentRequestResponse::new(
            record,
            &state.hosted_pick_base_url,
        )),
    ))
}

/// `GET /api/payment/request/{reference}` - Fetches a live payment request.
///
/// # Errors
///
/// Returns 404 if the request does not exist or has expired.
pub async fn get_payment_request(
    State(state): State<SharedState>,
    Path(reference): Path<String>,
) -> Result<Json<PaymentRequestResponse>, ApiError> {
    let reference = path_reference(&reference)?;
    let record = state.store.get(&reference).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(PaymentRequestResponse::new(
        record,
        &state.hosted_pick_base_url,
    )))
}

/// `GET /api/payment/request/{reference}/qr` - Renders the Solana Pay URL as SVG.
///
/// # Errors
///
/// Returns 404 if the request does not exist or has expired.
pub async fn get_payment_qr(
    State(state): State<SharedState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = path_reference(&reference)?;
    let record = state.store.get(&reference).await?.ok_or(ApiError::NotFound)?;
    let svg = render_qr_svg(&record.link().solana_pay_url(), &state.qr)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// `GET /api/payment/verify` - Looks for a matching on-chain payment.
///
/// # Errors
///
/// Returns 400 on missing or malformed parameters and 500 when the ledger
/// cannot be read.
pub async fn verify_payment(
    State(state): State<SharedState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let (Some(reference), Some(recipient), Some(amount)) =
        (&query.reference, &query.recipient, &query.amount)
    else {
        let issues = [
            ("reference", &query.reference),
            ("recipient", &query.recipient),
            ("amount", &query.amount),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| FieldIssue::required(field))
        .collect();
        return Err(ApiError::InvalidInput(issues));
    };

    let request = VerificationRequest::parse(reference, recipient, amount)?;
    let verified = with_retry(&state.retry, || state.verifier.verify(&request)).await?;

    Ok(Json(verified.map_or(VerifyResponse::NotFound, |payment| {
        VerifyResponse::Verified {
            signature: payment.signature,
        }
    })))
}

/// `POST /api/webhook/payment` - Applies a payment status event.
///
/// # Errors
///
/// Returns 400 on a malformed body and 404 if the payment request does not
/// exist. Unknown events, and events without a reference, are acknowledged
/// and ignored.
pub async fn payment_webhook(
    State(state): State<SharedState>,
    body: Result<Json<WebhookBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let event = body.event.as_str();
    let raw = body.data.and_then(|data| data.reference);
    let raw = match raw {
        Some(raw)
            if matches!(
                event,
                "payment_confirmed" | "payment_failed" | "payment_expired"
            ) =>
        {
            raw
        }
        _ => {
            tracing::debug!(event, "Ignoring webhook event");
            return Ok(Json(json!({ "received": true })));
        }
    };
    let reference = path_reference(&raw)?;

    let response = match event {
        "payment_confirmed" => {
            let record = state
                .store
                .mark_paid(&reference, UnixTimestamp::now())
                .await?
                .ok_or(ApiError::NotFound)?;
            json!({ "status": "confirmed", "updated": record })
        }
        "payment_failed" => {
            let record = state
                .store
                .mark_unpaid(&reference)
                .await?
                .ok_or(ApiError::NotFound)?;
            json!({ "status": "failed", "updated": record })
        }
        _ => {
            let record = state
                .store
                .remove(&reference)
                .await?
                .ok_or(ApiError::NotFound)?;
            json!({ "status": "expired", "deleted": record })
        }
    };
    tracing::info!(event, %reference, "Applied webhook event");
    Ok(Json(response))
}

/// Creates an Axum [`axum::Router`] with all payment endpoints.
pub fn payment_router(state: SharedState) -> axum::Router {
    axum::Router::new()
        .route(
            "/api/payment/request",
            axum::routing::post(create_payment_request),
        )
        .route(
            "/api/payment/request/{reference}",
            axum::routing::get(get_payment_request),
        )
        .route(
            "/api/payment/request/{reference}/qr",
            axum::routing::get(get_payment_qr),
        )
        .route("/api/payment/verify", axum::routing::get(verify_payment))
        .route("/api/webhook/payment", axum::routing::post(payment_webhook))
        .with_state(state)
}
