use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use wardrobe_core::{
    ApplicationError, DomainError, InterfaceError, OwnerId, PlanError, RepositoryError,
};

pub const OWNER_HEADER: &str = "x-owner-id";

/// Handler error carrying a user-safe message and the correlation id that
/// ties the response to the logged detail.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    correlation_id: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let message = message.into();
        tracing::info!(
            event_name = "http.bad_request",
            correlation_id = %correlation_id,
            detail = %message,
            "request rejected"
        );
        Self(InterfaceError::BadRequest { message, correlation_id })
    }

    pub fn interface(&self) -> &InterfaceError {
        &self.0
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn class(&self) -> &'static str {
        match self.0 {
            InterfaceError::BadRequest { .. } => "bad_request",
            InterfaceError::Conflict { .. } => "conflict",
            InterfaceError::Unprocessable { .. } => "unprocessable",
            InterfaceError::ServiceUnavailable { .. } => "service_unavailable",
            InterfaceError::Internal { .. } => "internal",
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        match &error {
            ApplicationError::Domain(_) | ApplicationError::Plan(PlanError::GenerationInProgress) => {
                tracing::info!(
                    event_name = "http.request_rejected",
                    correlation_id = %correlation_id,
                    error = %error,
                    "request rejected"
                )
            }
            _ => tracing::error!(
                event_name = "http.request_failed",
                correlation_id = %correlation_id,
                error = %error,
                "request failed"
            ),
        }
        Self(error.into_interface(correlation_id))
    }
}

impl From<PlanError> for ApiError {
    fn from(error: PlanError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let interface = self.interface();
        let detail = match interface {
            InterfaceError::BadRequest { message, .. } => Some(message.as_str()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.class(),
            message: interface.user_message(),
            detail,
            correlation_id: interface.correlation_id(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Owner taken from the `x-owner-id` header; blank or missing is a 400.
#[derive(Clone, Debug)]
pub struct Owner(pub OwnerId);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();
        if value.is_empty() {
            return Err(ApiError::bad_request(format!("missing `{OWNER_HEADER}` header")));
        }
        Ok(Self(OwnerId(value.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::ApiError;
    use wardrobe_core::{DomainError, InterfaceError, PlanError, RepositoryError};

    #[test]
    fn plan_errors_map_to_documented_statuses() {
        let cases = [
            (ApiError::from(PlanError::GenerationInProgress), StatusCode::CONFLICT),
            (
                ApiError::from(PlanError::InsufficientWardrobe { uppers: 1, bottoms: 0 }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(PlanError::Persistence(RepositoryError::Database(
                    "disk full".to_string(),
                ))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::from(DomainError::InvalidDay("caturday".to_string())), StatusCode::BAD_REQUEST),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn every_error_gets_its_own_correlation_id() {
        let first = ApiError::bad_request("one");
        let second = ApiError::bad_request("two");

        assert_ne!(first.interface().correlation_id(), second.interface().correlation_id());
        assert!(matches!(first.interface(), InterfaceError::BadRequest { .. }));
    }
}
