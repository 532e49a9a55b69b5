use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Field name to list of messages, serialized verbatim as a 400 body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Expiry date is required")]
    MissingExpiryDate,

    #[error("Invalid expiry date format")]
    InvalidDateFormat,

    #[error("Expiry date must be in the future")]
    ExpiredExpiryDate,

    #[error("Invalid referral code")]
    InvalidReferralCode,

    #[error("Invalid email address")]
    EmailUnverifiable,

    #[error("Invalid Username/Password")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(fields) => {
                (StatusCode::BAD_REQUEST, Json(fields)).into_response()
            }
            AppError::MissingExpiryDate => error_body(
                StatusCode::BAD_REQUEST,
                "Expiry date is required",
            ),
            AppError::InvalidDateFormat => error_body(
                StatusCode::BAD_REQUEST,
                "Invalid expiry date format",
            ),
            AppError::ExpiredExpiryDate => error_body(
                StatusCode::BAD_REQUEST,
                "Expiry date must be in the future",
            ),
            AppError::InvalidReferralCode => {
                error_body(StatusCode::BAD_REQUEST, "Invalid referral code")
            }
            AppError::EmailUnverifiable => {
                error_body(StatusCode::BAD_REQUEST, "Invalid email address")
            }
            AppError::InvalidCredentials => {
                error_body(StatusCode::BAD_REQUEST, "Invalid Username/Password")
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "message": msg })),
            )
                .into_response(),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "detail": msg })),
            )
                .into_response(),
            AppError::ExternalService(msg) => {
                tracing::error!("External service error: {}", msg);
                error_body(
                    StatusCode::BAD_GATEWAY,
                    "Email verification service unavailable",
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            AppError::Jwt(e) => {
                tracing::warn!("JWT error: {}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "detail": "Invalid token" })),
                )
                    .into_response()
            }
            AppError::Bcrypt(e) => {
                tracing::error!("Bcrypt error: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error")
            }
            AppError::HttpClient(e) => {
                tracing::error!("HTTP client error: {}", e);
                error_body(
                    StatusCode::BAD_GATEWAY,
                    "Email verification service unavailable",
                )
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub type Result<T> = std::result::Result<T, AppError>;
