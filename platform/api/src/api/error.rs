use common::http::RouteError;
use hyper::StatusCode;

use super::auth::AuthError;
use crate::pass::image::EncodingError;
use crate::pass::PassError;
use crate::scan::ScanError;
use crate::store::StoreError;

pub type Result<T, E = RouteError<ApiError>> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("failed to read http body: {0}")]
    ParseHttpBody(#[from] hyper::Error),
    #[error("failed to parse json body: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("auth: {0}")]
    Auth(#[from] AuthError),
    #[error("pass: {0}")]
    Pass(#[from] PassError),
    #[error("scan: {0}")]
    Scan(#[from] ScanError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl From<PassError> for RouteError<ApiError> {
    #[track_caller]
    fn from(value: PassError) -> Self {
        let (status, message) = match &value {
            PassError::Conflict => (
                StatusCode::CONFLICT,
                "a pass for this visitor phone number already exists".to_string(),
            ),
            PassError::NotFound => (StatusCode::NOT_FOUND, "pass not found".to_string()),
            PassError::InvalidDuration(minutes) => (StatusCode::BAD_REQUEST, format!("invalid duration: {minutes} minutes")),
            PassError::Encoding(EncodingError::TooLong(_)) => {
                (StatusCode::BAD_REQUEST, "pass details are too long to encode".to_string())
            }
            PassError::Encoding(EncodingError::Png(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to render pass image".to_string())
            }
            PassError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to access passes".to_string()),
        };

        RouteError::from((status, message)).with_source(Some(ApiError::Pass(value)))
    }
}

impl From<ScanError> for RouteError<ApiError> {
    #[track_caller]
    fn from(value: ScanError) -> Self {
        RouteError::from(match &value {
            ScanError::NotFound => (StatusCode::NOT_FOUND, "scan not found"),
            ScanError::InvalidPass => (StatusCode::CONFLICT, "cannot approve entry on an invalid pass"),
            ScanError::AlreadyConfirmed => (StatusCode::CONFLICT, "scan has already been confirmed"),
            ScanError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to access scans"),
        })
        .with_source(Some(ApiError::Scan(value)))
    }
}

impl From<StoreError> for RouteError<ApiError> {
    #[track_caller]
    fn from(value: StoreError) -> Self {
        RouteError::from((StatusCode::INTERNAL_SERVER_ERROR, "failed to access store")).with_source(Some(ApiError::Store(value)))
    }
}
