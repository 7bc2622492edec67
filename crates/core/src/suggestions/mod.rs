//! Complementary-garment suggestions.
//!
//! A [`SuggestionSource`] asks an external completion endpoint for ideas and
//! falls back to the rule-based [`mock_suggestion`] whenever the endpoint is
//! missing, throttled, unavailable, or answers with something unusable.

mod mock;
mod prompt;
mod rate_limit;
mod source;

pub use mock::mock_suggestion;
pub use prompt::{build_prompt, extract_json_object, parse_reply};
pub use rate_limit::{credential_fingerprint, Admission, RateLimiter, RateLimiterSettings};
pub use source::{
    CompletionClient, CompletionError, SourcedSuggestions, SuggestionOrigin, SuggestionSource,
};

/// Upper bound on suggestions kept from one reply.
pub const MAX_SUGGESTIONS: usize = 3;

/// External calls allowed per credential in one rolling window.
pub const DEFAULT_RATE_LIMIT_MAX_CALLS: usize = 60;

pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Minimum pause after the endpoint answers 429.
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;
