use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("email already registered")]
    UserAlreadyExists(String),
    #[error("vehicle not found: {0}")]
    VehicleNotFound(Uuid),
    #[error("Trip not found")]
    TripNotFound(Uuid),
    #[error("No available seats")]
    NoAvailableSeats(Uuid),
    #[error("drivers cannot join their own trip")]
    DriverCannotJoin(Uuid),
    #[error("user has already joined this trip")]
    AlreadyJoined(Uuid),
    #[error("{0}")]
    Validation(String),
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::VehicleNotFound(_)
            | DomainError::TripNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::UserAlreadyExists(_)
            | DomainError::NoAvailableSeats(_)
            | DomainError::DriverCannotJoin(_)
            | DomainError::AlreadyJoined(_)
            | DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::TripNotFound(resource)
            | DomainError::UserNotFound(resource)
            | DomainError::VehicleNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::NoAvailableSeats(trip)
            | DomainError::DriverCannotJoin(trip)
            | DomainError::AlreadyJoined(trip) => Some(json!({ "trip": trip })),
            DomainError::Forbidden => {
                Some(json!({ "message": "you cannot act on behalf of another user" }))
            }
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn capacity_errors_are_bad_requests() {
        let trip = Uuid::new_v4();
        assert_eq!(
            DomainError::NoAvailableSeats(trip).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::AlreadyJoined(trip).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::TripNotFound(trip).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::Internal("db down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn full_trip_body_carries_the_client_facing_message() {
        let response = DomainError::NoAvailableSeats(Uuid::new_v4()).error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "No available seats");
        assert!(body["details"]["trip"].is_string());
    }
}
