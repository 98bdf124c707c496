//! Error types for the payment service.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use solpick::AmountError;
use solpick::qr::QrError;
use solpick_svm::chain::InvalidAddress;
use solpick_svm::pay::VerifyError;

use crate::store::StoreError;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Field name as sent by the client.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl FieldIssue {
    /// An issue for `field`.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// The field is absent.
    #[must_use]
    pub fn required(field: &'static str) -> Self {
        Self::new(field, "Required")
    }
}

impl From<&InvalidAddress> for FieldIssue {
    fn from(err: &InvalidAddress) -> Self {
        Self::new(err.field, err.to_string())
    }
}

impl From<&AmountError> for FieldIssue {
    fn from(err: &AmountError) -> Self {
        Self::new("amount", format!("Invalid amount: {err}"))
    }
}

/// Errors returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more fields failed validation.
    #[error("Invalid input")]
    InvalidInput(Vec<FieldIssue>),

    /// The request body is not the expected JSON.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// No live payment request for the reference.
    #[error("Payment request not found")]
    NotFound,

    /// The payment request already exists.
    #[error("Payment request already exists")]
    Conflict,

    /// The client exceeded its request budget.
    #[error("Too many requests, please try again later")]
    RateLimited,

    /// The ledger could not be checked.
    #[error("Failed to verify payment")]
    Verification(#[source] VerifyError),

    /// The payment store failed.
    #[error("Payment store failed")]
    Store(#[source] StoreError),

    /// The QR code could not be rendered.
    #[error("Failed to generate QR code")]
    Qr(#[from] QrError),
}

#[derive(Serialize)]
struct ErrorBody<T: Serialize> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<T>,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => Self::Conflict,
            StoreError::Backend(_) => Self::Store(err),
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        match &err {
            VerifyError::InvalidAddress(e) => Self::InvalidInput(vec![e.into()]),
            VerifyError::InvalidAmount(e) => Self::InvalidInput(vec![e.into()]),
            _ => Self::Verification(err),
        }
    }
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Verification(_) | Self::Store(_) | Self::Qr(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        match self {
            Self::InvalidInput(issues) => (
                status,
                Json(ErrorBody {
                    error,
                    details: Some(issues),
                }),
            )
                .into_response(),
            Self::InvalidBody(details) => (
                status,
                Json(ErrorBody {
                    error: "Invalid request body".to_owned(),
                    details: Some(details),
                }),
            )
                .into_response(),
            Self::Verification(source) => {
                tracing::error!(error = %source, "Payment verification failed");
                (
                    status,
                    Json(ErrorBody {
                        error,
                        details: Some(source.to_string()),
                    }),
                )
                    .into_response()
            }
            Self::Store(source) => {
                tracing::error!(error = %source, "Payment store failed");
                (
                    status,
                    Json(ErrorBody {
                        error,
                        details: Some(source.to_string()),
                    }),
                )
                    .into_response()
            }
            Self::Qr(source) => {
                tracing::error!(error = %source, "QR rendering failed");
                (
                    status,
                    Json(ErrorBody {
                        error,
                        details: Some(source.to_string()),
                    }),
                )
                    .into_response()
            }
            Self::NotFound | Self::Conflict | Self::RateLimited => (
                status,
                Json(ErrorBody::<()> {
                    error,
                    details: None,
                }),
            )
                .into_response(),
        }
    }
}
