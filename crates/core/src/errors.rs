use serde::Serialize;
use thiserror::Error;

use crate::stores::RepositoryError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown body slot `{0}` (expected upper|bottom)")]
    InvalidBodySlot(String),
    #[error("unknown day `{0}` (expected monday..sunday)")]
    InvalidDay(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Why a suggestion request was answered by the rule-based generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    MissingCredential,
    RateLimited,
    CoolingDown,
    EndpointUnavailable,
    EndpointDisabled,
    MalformedResponse,
    Transport,
    UnexpectedStatus(u16),
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::RateLimited => "rate_limited",
            Self::CoolingDown => "cooling_down",
            Self::EndpointUnavailable => "endpoint_unavailable",
            Self::EndpointDisabled => "endpoint_disabled",
            Self::MalformedResponse => "malformed_response",
            Self::Transport => "transport",
            Self::UnexpectedStatus(_) => "unexpected_status",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("seed item is invalid: {0}")]
    InvalidSeed(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("wardrobe needs at least one upper and one bottom (uppers: {uppers}, bottoms: {bottoms})")]
    InsufficientWardrobe { uppers: usize, bottoms: usize },
    #[error("outfit generation is already in progress")]
    GenerationInProgress,
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound { .. } | RepositoryError::Conflict(_) => {
                Self::Domain(DomainError::InvariantViolation(value.to_string()))
            }
            RepositoryError::Database(_) | RepositoryError::Decode(_) => {
                Self::Persistence(value.to_string())
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("unprocessable: {message}")]
    Unprocessable { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Conflict { .. } => {
                "Outfit generation is already running. Please wait for it to finish."
            }
            Self::Unprocessable { .. } => {
                "Add at least one upper and one bottom item before generating outfits."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Plan(PlanError::GenerationInProgress) => Self::Conflict {
                message: PlanError::GenerationInProgress.to_string(),
                correlation_id,
            },
            ApplicationError::Plan(error @ PlanError::InsufficientWardrobe { .. }) => {
                Self::Unprocessable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Plan(PlanError::Persistence(error)) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError, PlanError};
    use crate::stores::RepositoryError;

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::InvalidDay("someday".to_owned()))
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn generation_in_progress_maps_to_conflict() {
        let interface =
            ApplicationError::from(PlanError::GenerationInProgress).into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Conflict { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn insufficient_wardrobe_maps_to_actionable_message() {
        let interface =
            ApplicationError::from(PlanError::InsufficientWardrobe { uppers: 2, bottoms: 0 })
                .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Unprocessable { .. }));
        assert!(interface.user_message().contains("Add at least one upper and one bottom"));
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::from(PlanError::Persistence(RepositoryError::Database(
            "database lock timeout".to_owned(),
        )))
        .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn repository_conflict_maps_to_bad_request() {
        let interface = ApplicationError::from(RepositoryError::Conflict(
            "body slot is immutable".to_owned(),
        ))
        .into_interface("req-5");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = ApplicationError::Configuration("invalid llm base url".to_owned())
            .into_interface("req-6");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
