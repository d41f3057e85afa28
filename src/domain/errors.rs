use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend store unavailable")]
    Backend,
}

/// Business-rule outcomes of the referral/points ledger. Everything here is
/// a refused operation with a reason; infrastructure trouble rides along as
/// `Store` and is rendered generically at the HTTP boundary.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("email already registered")]
    EmailTaken,
    #[error("a referral code cannot be used by its own account")]
    SelfReferral,
    #[error("insufficient points: have {available}, need {required}")]
    InsufficientPoints { available: i64, required: i64 },
    #[error("unknown user")]
    UserNotFound,
    #[error("unknown reward")]
    RewardNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub enum ApiError {
    EmailTaken,
    SelfReferral,
    InsufficientPoints,
    UserNotFound,
    RewardNotFound,
    InvalidCredentials,
    AuthenticationError,
    ServerError,
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Backend => Self::ServerError,
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::EmailTaken => Self::EmailTaken,
            LedgerError::SelfReferral => Self::SelfReferral,
            LedgerError::InsufficientPoints { .. } => Self::InsufficientPoints,
            LedgerError::UserNotFound => Self::UserNotFound,
            LedgerError::RewardNotFound => Self::RewardNotFound,
            LedgerError::Store(_) => Self::ServerError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Self::EmailTaken => (StatusCode::CONFLICT, "Email already exists"),
            Self::SelfReferral => (
                StatusCode::BAD_REQUEST,
                "You cannot sign up with your own referral code",
            ),
            Self::InsufficientPoints => (
                StatusCode::CONFLICT,
                "You don't have enough points for this reward",
            ),
            Self::UserNotFound => (StatusCode::NOT_FOUND, "Unknown user"),
            Self::RewardNotFound => (StatusCode::NOT_FOUND, "Unknown reward"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password"),
            Self::AuthenticationError => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            Self::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong"),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[derive(Debug)]
pub enum JWTError {
    GenerationFailed(jsonwebtoken::errors::ErrorKind),
    DecodeFailed(jsonwebtoken::errors::ErrorKind),
}

impl From<JWTError> for ApiError {
    fn from(_value: JWTError) -> Self {
        Self::AuthenticationError
    }
}
