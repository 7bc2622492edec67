use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::mock::mock_suggestion;
use super::prompt::{build_prompt, parse_reply};
use super::rate_limit::{credential_fingerprint, Admission, RateLimiter};
use super::MAX_SUGGESTIONS;
use crate::domain::item::ClothingItem;
use crate::domain::suggestion::Suggestion;
use crate::errors::{FallbackReason, SourceError};
use crate::labels::{ItemLabels, LabelCatalog};
use crate::stores::CredentialStore;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("endpoint answered with status {status}")]
    Status { status: u16, retry_after_secs: Option<u64> },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected reply envelope: {0}")]
    Envelope(String),
}

/// A text-completion endpoint. Implementations return the reply text only;
/// interpreting it is the caller's job.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        credential: &SecretString,
        prompt: &str,
    ) -> Result<String, CompletionError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionOrigin {
    Remote,
    Fallback(FallbackReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcedSuggestions {
    pub suggestions: Vec<Suggestion>,
    pub origin: SuggestionOrigin,
    /// Set when this request put the endpoint into cool-down or marked it
    /// unavailable.
    pub tripped: bool,
}

impl SourcedSuggestions {
    pub fn is_remote(&self) -> bool {
        self.origin == SuggestionOrigin::Remote
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self.origin {
            SuggestionOrigin::Remote => None,
            SuggestionOrigin::Fallback(reason) => Some(reason),
        }
    }
}

struct RemoteFailure {
    reason: FallbackReason,
    tripped: bool,
}

impl From<FallbackReason> for RemoteFailure {
    fn from(reason: FallbackReason) -> Self {
        Self { reason, tripped: false }
    }
}

pub struct SuggestionSource {
    client: Option<Arc<dyn CompletionClient>>,
    credentials: Arc<dyn CredentialStore>,
    limiter: Arc<RateLimiter>,
    max_suggestions: usize,
}

impl SuggestionSource {
    pub fn new(
        client: Option<Arc<dyn CompletionClient>>,
        credentials: Arc<dyn CredentialStore>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self { client, credentials, limiter, max_suggestions: MAX_SUGGESTIONS }
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions.max(1);
        self
    }

    /// Suggestions for `seed`. Endpoint failures never surface; they are
    /// reported through the origin and answered by the rule-based generator.
    pub async fn suggest<R: Rng + Send + ?Sized>(
        &self,
        seed: &ClothingItem,
        labels: &LabelCatalog,
        rng: &mut R,
    ) -> Result<SourcedSuggestions, SourceError> {
        if seed.id.0.trim().is_empty() {
            return Err(SourceError::InvalidSeed("item id is blank".to_string()));
        }

        let item_labels = labels.describe(seed);
        match self.remote(seed, &item_labels).await {
            Ok(suggestions) => {
                tracing::debug!(
                    event_name = "suggestions.remote",
                    item_id = %seed.id,
                    count = suggestions.len(),
                    "endpoint suggestions accepted"
                );
                Ok(SourcedSuggestions {
                    suggestions,
                    origin: SuggestionOrigin::Remote,
                    tripped: false,
                })
            }
            Err(failure) => {
                tracing::info!(
                    event_name = "suggestions.fallback",
                    item_id = %seed.id,
                    reason = failure.reason.as_str(),
                    "using rule-based suggestion"
                );
                let suggestion =
                    mock_suggestion(seed.slot, &item_labels.color, &item_labels.category, rng);
                Ok(SourcedSuggestions {
                    suggestions: vec![suggestion],
                    origin: SuggestionOrigin::Fallback(failure.reason),
                    tripped: failure.tripped,
                })
            }
        }
    }

    /// Clears cool-downs and "unavailable" flags for every credential.
    pub fn reset_endpoint_state(&self) {
        self.limiter.reset_all();
        tracing::info!(event_name = "suggestions.endpoint_reset", "endpoint state cleared");
    }

    async fn remote(
        &self,
        seed: &ClothingItem,
        labels: &ItemLabels,
    ) -> Result<Vec<Suggestion>, RemoteFailure> {
        let client = self.client.as_ref().ok_or(FallbackReason::EndpointDisabled)?;
        let credential = match self.credentials.get().await {
            Ok(Some(credential)) if !credential.expose_secret().trim().is_empty() => credential,
            Ok(_) => return Err(FallbackReason::MissingCredential.into()),
            Err(error) => {
                tracing::warn!(
                    event_name = "suggestions.credential_unreadable",
                    error = %error,
                    "credential store read failed"
                );
                return Err(FallbackReason::MissingCredential.into());
            }
        };
        let fingerprint = credential_fingerprint(credential.expose_secret());

        match self.limiter.admit(&fingerprint) {
            Admission::Allowed { .. } => {}
            Admission::Limited => return Err(FallbackReason::RateLimited.into()),
            Admission::CoolingDown { .. } => return Err(FallbackReason::CoolingDown.into()),
            Admission::Unavailable => return Err(FallbackReason::EndpointUnavailable.into()),
        }

        let prompt = build_prompt(seed.slot, labels);
        let text = client.complete(&credential, &prompt).await.map_err(|error| {
            self.classify(&fingerprint, error)
        })?;

        parse_reply(&text, self.max_suggestions).map_err(|reason| {
            tracing::warn!(
                event_name = "suggestions.malformed_reply",
                item_id = %seed.id,
                reason = %reason,
                "endpoint reply could not be used"
            );
            RemoteFailure::from(FallbackReason::MalformedResponse)
        })
    }

    fn classify(&self, fingerprint: &str, error: CompletionError) -> RemoteFailure {
        match error {
            CompletionError::Status { status: 429, retry_after_secs } => {
                let retry_after = retry_after_secs
                    .and_then(|secs| i64::try_from(secs).ok())
                    .map(Duration::seconds);
                let until = self.limiter.trip_cooldown(fingerprint, retry_after);
                tracing::warn!(
                    event_name = "suggestions.cooldown_started",
                    until = %until.to_rfc3339(),
                    "endpoint rate limited the request"
                );
                RemoteFailure { reason: FallbackReason::RateLimited, tripped: true }
            }
            CompletionError::Status { status: 404, .. } => {
                let tripped = self.limiter.mark_unavailable(fingerprint);
                tracing::warn!(
                    event_name = "suggestions.endpoint_unavailable",
                    "endpoint reported not found; routing to rule-based suggestions"
                );
                RemoteFailure { reason: FallbackReason::EndpointUnavailable, tripped }
            }
            CompletionError::Status { status, .. } => {
                FallbackReason::UnexpectedStatus(status).into()
            }
            CompletionError::Transport(message) => {
                tracing::warn!(
                    event_name = "suggestions.transport_failed",
                    error = %message,
                    "endpoint request failed"
                );
                FallbackReason::Transport.into()
            }
            CompletionError::Envelope(message) => {
                tracing::warn!(
                    event_name = "suggestions.malformed_reply",
                    reason = %message,
                    "endpoint envelope could not be read"
                );
                FallbackReason::MalformedResponse.into()
            }
        }
    }
}
