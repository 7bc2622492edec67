pub mod assembly;
pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod labels;
pub mod matcher;
pub mod notify;
pub mod planner;
pub mod stores;
pub mod suggestions;

pub use assembly::{assemble_planner, seed_credential, PlannerParts};
pub use cache::SuggestionCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::catalog::{Category, Subcategory};
pub use domain::item::{BodySlot, ClothingItem, ItemId, NewClothingItem, OwnerId};
pub use domain::outfit::{DayOfWeek, NewOutfit, Outfit, OutfitId, WeeklyPlan};
pub use domain::suggestion::Suggestion;
pub use errors::{
    ApplicationError, DomainError, FallbackReason, InterfaceError, PlanError, SourceError,
};
pub use labels::{label_for_color, ItemLabels, LabelCatalog};
pub use matcher::Matcher;
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use planner::{DayOutcome, DayPairing, DayReport, OutfitPlanner, PlanReport, RunState};
pub use stores::{
    CatalogStore, CredentialStore, OutfitStore, RepositoryError, SuggestionCacheStore,
    WardrobeStore,
};
pub use suggestions::{
    CompletionClient, CompletionError, RateLimiter, RateLimiterSettings, SourcedSuggestions,
    SuggestionOrigin, SuggestionSource,
};
