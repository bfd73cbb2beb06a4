use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use pitchside_booking::ReservationError;
use pitchside_catalog::{AvailabilityError, SlotError, VenueError};
use pitchside_store::AccountError;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict { kind: &'static str, message: String },
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conflict { kind, message } => (StatusCode::CONFLICT, kind, message),
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "kind": kind,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let message = err.to_string();
        match err {
            ReservationError::SlotNotFound(_)
            | ReservationError::VenueNotFound(_)
            | ReservationError::BookingNotFound(_) => AppError::NotFound(message),
            ReservationError::SlotUnavailable(_) => AppError::Conflict {
                kind: "SLOT_UNAVAILABLE",
                message,
            },
            ReservationError::AmountMismatch { .. } => AppError::Conflict {
                kind: "AMOUNT_MISMATCH",
                message,
            },
            ReservationError::InvalidState { .. } => AppError::Conflict {
                kind: "INVALID_STATE",
                message,
            },
            ReservationError::TooLateToCancel(_) => AppError::Conflict {
                kind: "TOO_LATE_TO_CANCEL",
                message,
            },
            ReservationError::Forbidden => AppError::Forbidden(message),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        let message = err.to_string();
        match err {
            AvailabilityError::SlotNotFound(_) => AppError::NotFound(message),
            AvailabilityError::AlreadyGenerated { .. } => AppError::Conflict {
                kind: "SLOTS_ALREADY_GENERATED",
                message,
            },
        }
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<VenueError> for AppError {
    fn from(err: VenueError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        match err {
            AccountError::AlreadyExists(_) => AppError::Conflict {
                kind: "ALREADY_EXISTS",
                message,
            },
            AccountError::InvalidCredentials => AppError::Unauthorized(message),
            AccountError::NotFound(_) => AppError::NotFound(message),
            AccountError::Hashing(_) => AppError::Internal(message),
        }
    }
}
