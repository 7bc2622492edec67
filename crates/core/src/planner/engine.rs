use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Datelike;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;

use super::guard::GenerationLocks;
use super::{DayOutcome, DayPairing, DayReport, PlanReport, RunState};
use crate::cache::SuggestionCache;
use crate::clock::Clock;
use crate::domain::item::{BodySlot, ClothingItem, OwnerId};
use crate::domain::outfit::{DayOfWeek, NewOutfit, Outfit, WeeklyPlan};
use crate::domain::suggestion::Suggestion;
use crate::errors::{FallbackReason, PlanError, SourceError};
use crate::labels::LabelCatalog;
use crate::matcher::Matcher;
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::stores::{OutfitStore, WardrobeStore};
use crate::suggestions::SuggestionSource;

struct Pools {
    uppers: Vec<ClothingItem>,
    bottoms: Vec<ClothingItem>,
}

struct DayPlan {
    outfit: NewOutfit,
    outcome: DayOutcome,
}

struct ResolvedSuggestions {
    suggestions: Vec<Suggestion>,
    from_cache: bool,
    fallback_reason: Option<FallbackReason>,
    tripped: bool,
}

/// Notices already raised during one run, so repeats across days collapse.
#[derive(Default)]
struct RunNotes {
    rate_limited: bool,
    unavailable: bool,
}

pub struct OutfitPlanner {
    wardrobe: Arc<dyn WardrobeStore>,
    outfits: Arc<dyn OutfitStore>,
    source: SuggestionSource,
    cache: SuggestionCache,
    labels: LabelCatalog,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    locks: GenerationLocks,
    plans: RwLock<HashMap<OwnerId, WeeklyPlan>>,
    states: Mutex<HashMap<OwnerId, RunState>>,
    rng: Mutex<StdRng>,
}

impl OutfitPlanner {
    pub fn new(
        wardrobe: Arc<dyn WardrobeStore>,
        outfits: Arc<dyn OutfitStore>,
        source: SuggestionSource,
        cache: SuggestionCache,
        labels: LabelCatalog,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            wardrobe,
            outfits,
            source,
            cache,
            labels,
            notifier,
            clock,
            locks: GenerationLocks::default(),
            plans: RwLock::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replaces the random source; runs become reproducible for a fixed seed.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn labels(&self) -> &LabelCatalog {
        &self.labels
    }

    pub fn suggestion_source(&self) -> &SuggestionSource {
        &self.source
    }

    pub async fn generate_weekly_plan(&self, owner_id: &OwnerId) -> Result<PlanReport, PlanError> {
        let Some(_guard) = self.locks.try_acquire(owner_id) else {
            return Err(self.reject_concurrent(owner_id));
        };
        self.set_state(owner_id, RunState::Running);
        tracing::info!(event_name = "planner.generate.started", owner_id = %owner_id);

        match self.run_week(owner_id).await {
            Ok(report) => {
                self.set_state(owner_id, report.state);
                tracing::info!(
                    event_name = "planner.generate.completed",
                    owner_id = %owner_id,
                    state = report.state.as_str(),
                    days = report.plan.len(),
                    "weekly plan generated"
                );
                let (level, message) = match report.state {
                    RunState::PartiallyCompleted => (
                        NoticeLevel::Warning,
                        "Weekly outfits generated; some days use a random pairing.",
                    ),
                    _ => (NoticeLevel::Success, "Weekly outfits generated."),
                };
                self.notify(owner_id, level, "plan.generated", message);
                Ok(report)
            }
            Err(error) => {
                self.fail(owner_id, "planner.generate.failed", &error);
                Err(error)
            }
        }
    }

    pub async fn regenerate_day(
        &self,
        owner_id: &OwnerId,
        day: DayOfWeek,
    ) -> Result<DayReport, PlanError> {
        let Some(_guard) = self.locks.try_acquire(owner_id) else {
            return Err(self.reject_concurrent(owner_id));
        };
        self.set_state(owner_id, RunState::Running);
        tracing::info!(
            event_name = "planner.regenerate.started",
            owner_id = %owner_id,
            day = day.as_str()
        );

        match self.run_day(owner_id, day).await {
            Ok(report) => {
                self.set_state(owner_id, report.state);
                tracing::info!(
                    event_name = "planner.regenerate.completed",
                    owner_id = %owner_id,
                    day = day.as_str(),
                    state = report.state.as_str(),
                    "day regenerated"
                );
                self.notify(
                    owner_id,
                    NoticeLevel::Success,
                    "plan.day_regenerated",
                    format!("Outfit for {day} regenerated."),
                );
                Ok(report)
            }
            Err(error) => {
                self.fail(owner_id, "planner.regenerate.failed", &error);
                Err(error)
            }
        }
    }

    /// The owner's plan, read from the outfit store on first access.
    pub async fn weekly_plan(&self, owner_id: &OwnerId) -> Result<WeeklyPlan, PlanError> {
        if let Some(plan) = self.plans.read().await.get(owner_id) {
            return Ok(plan.clone());
        }

        let mut plans = self.plans.write().await;
        if let Some(plan) = plans.get(owner_id) {
            return Ok(plan.clone());
        }
        let plan = WeeklyPlan::from_outfits(self.outfits.list_for_owner(owner_id).await?);
        plans.insert(owner_id.clone(), plan.clone());
        Ok(plan)
    }

    pub async fn outfit_for_day(
        &self,
        owner_id: &OwnerId,
        day: DayOfWeek,
    ) -> Result<Option<Outfit>, PlanError> {
        Ok(self.weekly_plan(owner_id).await?.get(day).cloned())
    }

    /// Today's outfit, with "today" taken from the injected clock in UTC.
    pub async fn current_day_outfit(&self, owner_id: &OwnerId) -> Result<Option<Outfit>, PlanError> {
        let today = DayOfWeek::from(self.clock.now().weekday());
        self.outfit_for_day(owner_id, today).await
    }

    pub async fn reset_suggestion_cache(&self, owner_id: &OwnerId) -> Result<(), PlanError> {
        match self.cache.reset(owner_id).await {
            Ok(()) => {
                self.notify(
                    owner_id,
                    NoticeLevel::Success,
                    "cache.reset",
                    "Saved outfit suggestions cleared.",
                );
                Ok(())
            }
            Err(error) => {
                self.notify(
                    owner_id,
                    NoticeLevel::Error,
                    "cache.reset_failed",
                    "Saved outfit suggestions could not be cleared.",
                );
                Err(PlanError::Persistence(error))
            }
        }
    }

    /// Clears endpoint cool-downs and "unavailable" flags, e.g. after the
    /// credential changes.
    pub fn reset_endpoint_state(&self) {
        self.source.reset_endpoint_state();
    }

    /// Drops the memoized plan so the next read goes back to the outfit
    /// store. Needed after item deletes cascade into stored outfits.
    pub async fn forget_plan(&self, owner_id: &OwnerId) {
        self.plans.write().await.remove(owner_id);
    }

    pub fn run_state(&self, owner_id: &OwnerId) -> RunState {
        self.states().get(owner_id).copied().unwrap_or_default()
    }

    async fn run_week(&self, owner_id: &OwnerId) -> Result<PlanReport, PlanError> {
        let pools = self.load_pools(owner_id).await?;
        let mut notes = RunNotes::default();
        let mut planned = Vec::with_capacity(DayOfWeek::ALL.len());
        for day in DayOfWeek::ALL {
            planned.push(self.plan_day(owner_id, day, &pools, &mut notes).await);
        }

        let (new_outfits, days): (Vec<_>, Vec<_>) =
            planned.into_iter().map(|plan| (plan.outfit, plan.outcome)).unzip();
        let persisted = self.outfits.replace_week(owner_id, new_outfits).await?;
        let plan = WeeklyPlan::from_outfits(persisted);
        self.plans.write().await.insert(owner_id.clone(), plan.clone());

        let mut fallback_reasons = Vec::new();
        for reason in days.iter().filter_map(|outcome| outcome.fallback_reason) {
            if !fallback_reasons.contains(&reason) {
                fallback_reasons.push(reason);
            }
        }
        Ok(PlanReport { state: run_outcome(&days), plan, days, fallback_reasons })
    }

    async fn run_day(&self, owner_id: &OwnerId, day: DayOfWeek) -> Result<DayReport, PlanError> {
        let pools = self.load_pools(owner_id).await?;
        self.weekly_plan(owner_id).await?;

        let mut notes = RunNotes::default();
        let DayPlan { outfit, outcome } = self.plan_day(owner_id, day, &pools, &mut notes).await;
        let persisted = self.outfits.replace_day(outfit).await?;

        // A plan forgotten mid-run stays absent; the next read reloads all
        // seven days from the store.
        if let Some(plan) = self.plans.write().await.get_mut(owner_id) {
            plan.upsert(persisted.clone());
        }

        let state = run_outcome(std::slice::from_ref(&outcome));
        Ok(DayReport { state, outfit: persisted, outcome })
    }

    async fn load_pools(&self, owner_id: &OwnerId) -> Result<Pools, PlanError> {
        let uppers = self.wardrobe.list_items(owner_id, Some(BodySlot::Upper)).await?;
        let bottoms = self.wardrobe.list_items(owner_id, Some(BodySlot::Bottom)).await?;
        if uppers.is_empty() || bottoms.is_empty() {
            return Err(PlanError::InsufficientWardrobe {
                uppers: uppers.len(),
                bottoms: bottoms.len(),
            });
        }
        Ok(Pools { uppers, bottoms })
    }

    async fn plan_day(
        &self,
        owner_id: &OwnerId,
        day: DayOfWeek,
        pools: &Pools,
        notes: &mut RunNotes,
    ) -> DayPlan {
        let mut rng = self.day_rng();
        let seed_slot = if rng.gen_bool(0.5) { BodySlot::Upper } else { BodySlot::Bottom };
        let (seeds, partners) = match seed_slot {
            BodySlot::Upper => (&pools.uppers, &pools.bottoms),
            BodySlot::Bottom => (&pools.bottoms, &pools.uppers),
        };

        let paired = match seeds.choose(&mut rng) {
            Some(seed) => self
                .pair_seed(owner_id, seed, partners, &mut rng, notes)
                .await
                .map(|(partner, resolved)| (seed, partner, resolved)),
            None => Err(SourceError::InvalidSeed("seed pool is empty".to_string())),
        };

        let (upper, bottom, outcome) = match paired {
            Ok((seed, (partner, pairing), resolved)) => {
                let (upper, bottom) = match seed_slot {
                    BodySlot::Upper => (seed, partner),
                    BodySlot::Bottom => (partner, seed),
                };
                let outcome = DayOutcome {
                    day,
                    seed_slot,
                    seed_id: seed.id.clone(),
                    pairing,
                    from_cache: resolved.from_cache,
                    fallback_reason: resolved.fallback_reason,
                };
                (upper, bottom, outcome)
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "planner.day_recovered",
                    owner_id = %owner_id,
                    day = day.as_str(),
                    error = %error,
                    "suggestion lookup failed, pairing at random"
                );
                let (upper, bottom) = random_pair(pools, &mut rng);
                let outcome = DayOutcome {
                    day,
                    seed_slot,
                    seed_id: match seed_slot {
                        BodySlot::Upper => upper.id.clone(),
                        BodySlot::Bottom => bottom.id.clone(),
                    },
                    pairing: DayPairing::Recovered,
                    from_cache: false,
                    fallback_reason: None,
                };
                (upper, bottom, outcome)
            }
        };

        DayPlan {
            outfit: NewOutfit {
                owner_id: owner_id.clone(),
                upper_id: upper.id.clone(),
                bottom_id: bottom.id.clone(),
                day,
                created_at: self.clock.now(),
            },
            outcome,
        }
    }

    async fn pair_seed<'p>(
        &self,
        owner_id: &OwnerId,
        seed: &ClothingItem,
        partners: &'p [ClothingItem],
        rng: &mut StdRng,
        notes: &mut RunNotes,
    ) -> Result<((&'p ClothingItem, DayPairing), ResolvedSuggestions), SourceError> {
        let resolved = self.resolve_suggestions(owner_id, seed, rng).await?;
        self.note_endpoint_state(owner_id, &resolved, notes);

        let matched = Matcher::new(&self.labels).find_matches(&resolved.suggestions, partners, rng);
        let pairing = match matched.first() {
            Some(first) => partners
                .iter()
                .find(|candidate| candidate.id == first.id)
                .map(|partner| (partner, DayPairing::Matched)),
            None => None,
        };
        let pairing = match pairing {
            Some(pairing) => pairing,
            None => {
                let partner = partners.choose(rng).ok_or_else(|| {
                    SourceError::InvalidSeed("partner pool is empty".to_string())
                })?;
                (partner, DayPairing::NoCandidates)
            }
        };
        Ok((pairing, resolved))
    }

    async fn resolve_suggestions(
        &self,
        owner_id: &OwnerId,
        seed: &ClothingItem,
        rng: &mut StdRng,
    ) -> Result<ResolvedSuggestions, SourceError> {
        if let Some(suggestions) = self.cache.get(owner_id, &seed.id).await {
            return Ok(ResolvedSuggestions {
                suggestions,
                from_cache: true,
                fallback_reason: None,
                tripped: false,
            });
        }

        let sourced = self.source.suggest(seed, &self.labels, rng).await?;
        if sourced.is_remote() {
            self.cache.put(owner_id, &seed.id, sourced.suggestions.clone()).await;
        }
        Ok(ResolvedSuggestions {
            fallback_reason: sourced.fallback_reason(),
            tripped: sourced.tripped,
            suggestions: sourced.suggestions,
            from_cache: false,
        })
    }

    fn note_endpoint_state(
        &self,
        owner_id: &OwnerId,
        resolved: &ResolvedSuggestions,
        notes: &mut RunNotes,
    ) {
        match resolved.fallback_reason {
            Some(FallbackReason::RateLimited) if !notes.rate_limited => {
                notes.rate_limited = true;
                self.notify(
                    owner_id,
                    NoticeLevel::Info,
                    "suggestions.rate_limited",
                    "Suggestion service is busy; using built-in suggestions for now.",
                );
            }
            Some(FallbackReason::EndpointUnavailable) if resolved.tripped && !notes.unavailable => {
                notes.unavailable = true;
                self.notify(
                    owner_id,
                    NoticeLevel::Warning,
                    "suggestions.endpoint_unavailable",
                    "Suggestion service is unavailable; using built-in suggestions.",
                );
            }
            _ => {}
        }
    }

    fn reject_concurrent(&self, owner_id: &OwnerId) -> PlanError {
        tracing::info!(
            event_name = "planner.rejected_in_progress",
            owner_id = %owner_id,
            "generation already running"
        );
        self.notify(
            owner_id,
            NoticeLevel::Info,
            "plan.in_progress",
            "Outfit generation is already running.",
        );
        PlanError::GenerationInProgress
    }

    fn fail(&self, owner_id: &OwnerId, event_name: &'static str, error: &PlanError) {
        self.set_state(owner_id, RunState::Failed);
        tracing::warn!(
            event_name = event_name,
            owner_id = %owner_id,
            error = %error,
            "plan run failed"
        );
        let (code, message) = match error {
            PlanError::InsufficientWardrobe { .. } => (
                "plan.insufficient_wardrobe",
                "Add at least one upper and one bottom item to generate outfits.",
            ),
            PlanError::Persistence(_) => {
                ("plan.persistence_failed", "Outfits could not be saved. Please try again.")
            }
            PlanError::GenerationInProgress => {
                ("plan.in_progress", "Outfit generation is already running.")
            }
        };
        self.notify(owner_id, NoticeLevel::Error, code, message);
    }

    fn notify(
        &self,
        owner_id: &OwnerId,
        level: NoticeLevel,
        code: &str,
        message: impl Into<String>,
    ) {
        self.notifier.notify(Notice::new(owner_id, level, code, message));
    }

    /// Each day draws from its own generator seeded off the shared one, so
    /// nothing holds the shared lock across an await.
    fn day_rng(&self) -> StdRng {
        let seed = match self.rng.lock() {
            Ok(mut rng) => rng.gen::<u64>(),
            Err(poisoned) => poisoned.into_inner().gen::<u64>(),
        };
        StdRng::seed_from_u64(seed)
    }

    fn set_state(&self, owner_id: &OwnerId, state: RunState) {
        self.states().insert(owner_id.clone(), state);
    }

    fn states(&self) -> std::sync::MutexGuard<'_, HashMap<OwnerId, RunState>> {
        match self.states.lock() {
            Ok(states) => states,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn run_outcome(days: &[DayOutcome]) -> RunState {
    if days.iter().any(|outcome| outcome.pairing == DayPairing::Recovered) {
        RunState::PartiallyCompleted
    } else {
        RunState::Completed
    }
}

fn random_pair<'p>(pools: &'p Pools, rng: &mut StdRng) -> (&'p ClothingItem, &'p ClothingItem) {
    // Pools are checked non-empty before any day is planned.
    let upper = pools.uppers.choose(rng).unwrap_or(&pools.uppers[0]);
    let bottom = pools.bottoms.choose(rng).unwrap_or(&pools.bottoms[0]);
    (upper, bottom)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use secrecy::SecretString;
    use tokio::sync::Notify;

    use super::OutfitPlanner;
    use crate::cache::SuggestionCache;
    use crate::clock::ManualClock;
    use crate::domain::item::{BodySlot, ClothingItem, ItemId, OwnerId};
    use crate::domain::outfit::DayOfWeek;
    use crate::errors::{FallbackReason, PlanError};
    use crate::labels::LabelCatalog;
    use crate::notify::InMemoryNotifier;
    use crate::planner::{DayPairing, RunState};
    use crate::stores::{
        InMemoryCredentialStore, InMemoryOutfitStore, InMemorySuggestionCacheStore,
        InMemoryWardrobeStore, OutfitStore,
    };
    use crate::suggestions::{
        CompletionClient, CompletionError, RateLimiter, RateLimiterSettings, SuggestionSource,
    };

    const JEANS_REPLY: &str =
        r#"{"suggestions": [{"type": "bottom", "category": "Jeans", "color": "blue"}]}"#;

    /// Answers every prompt with the same reply; the first call can be held
    /// open until the test releases it.
    struct FixedClient {
        reply: Result<String, CompletionError>,
        calls: AtomicUsize,
        hold_first: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl FixedClient {
        fn new(reply: Result<&str, CompletionError>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
                hold_first: AtomicBool::new(false),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(
            &self,
            _credential: &SecretString,
            _prompt: &str,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hold_first.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.reply.clone()
        }
    }

    struct Fixture {
        owner: OwnerId,
        clock: Arc<ManualClock>,
        wardrobe: Arc<InMemoryWardrobeStore>,
        outfits: Arc<InMemoryOutfitStore>,
        cache_store: Arc<InMemorySuggestionCacheStore>,
        notifier: InMemoryNotifier,
        client: Arc<FixedClient>,
        planner: OutfitPlanner,
    }

    fn wednesday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 8, 30, 0).single().expect("valid time")
    }

    fn fixture(credential: Option<&str>, reply: Result<&str, CompletionError>) -> Fixture {
        let owner = OwnerId("owner-1".to_string());
        let clock = Arc::new(ManualClock::new(wednesday_morning()));
        let wardrobe = Arc::new(InMemoryWardrobeStore::default());
        let outfits = Arc::new(InMemoryOutfitStore::default());
        let cache_store = Arc::new(InMemorySuggestionCacheStore::default());
        let notifier = InMemoryNotifier::default();
        let client = Arc::new(FixedClient::new(reply));
        let credentials = Arc::new(match credential {
            Some(value) => InMemoryCredentialStore::with_value(value),
            None => InMemoryCredentialStore::default(),
        });

        let endpoint: Arc<dyn CompletionClient> = client.clone();
        let limiter = Arc::new(RateLimiter::new(RateLimiterSettings::default(), clock.clone()));
        let source = SuggestionSource::new(Some(endpoint), credentials, limiter);
        let cache = SuggestionCache::new(cache_store.clone(), clock.clone(), Duration::hours(24));
        let planner = OutfitPlanner::new(
            wardrobe.clone(),
            outfits.clone(),
            source,
            cache,
            LabelCatalog::builtin(),
            Arc::new(notifier.clone()),
            clock.clone(),
        )
        .with_rng(StdRng::seed_from_u64(2026));

        Fixture { owner, clock, wardrobe, outfits, cache_store, notifier, client, planner }
    }

    fn item(id: &str, slot: BodySlot, category: &str, color: &str) -> ClothingItem {
        ClothingItem {
            id: ItemId(id.to_string()),
            owner_id: OwnerId("owner-1".to_string()),
            name: None,
            image_ref: format!("img/{}.jpg", id.trim()),
            slot,
            category_id: category.to_string(),
            subcategory_id: String::new(),
            color: color.to_string(),
            created_at: wednesday_morning(),
        }
    }

    async fn stock_basic_wardrobe(fixture: &Fixture) {
        fixture.wardrobe.insert(item("tee-white", BodySlot::Upper, "t-shirt", "#FFFFFF")).await;
        fixture.wardrobe.insert(item("jeans-blue", BodySlot::Bottom, "jeans", "#0000FF")).await;
    }

    async fn stock_large_wardrobe(fixture: &Fixture) {
        for (id, category, color) in [
            ("tee-white", "t-shirt", "#FFFFFF"),
            ("tee-black", "t-shirt", "#000000"),
            ("shirt-blue", "shirt", "#0000FF"),
            ("sweater-red", "sweater", "#FF0000"),
        ] {
            fixture.wardrobe.insert(item(id, BodySlot::Upper, category, color)).await;
        }
        for (id, category, color) in [
            ("jeans-blue", "jeans", "#0000FF"),
            ("pants-black", "pants", "#000000"),
            ("pants-beige", "pants", "#F5F5DC"),
            ("skirt-gray", "skirt", "#808080"),
        ] {
            fixture.wardrobe.insert(item(id, BodySlot::Bottom, category, color)).await;
        }
    }

    #[tokio::test]
    async fn generates_seven_days_and_persists_them() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        stock_large_wardrobe(&fixture).await;

        let report = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");

        assert_eq!(report.state, RunState::Completed);
        assert!(report.plan.is_complete());
        assert_eq!(report.days.len(), 7);
        assert_eq!(report.fallback_reasons, vec![FallbackReason::MissingCredential]);
        assert_eq!(fixture.outfits.write_count(), 1);
        assert_eq!(fixture.outfits.list_for_owner(&fixture.owner).await.expect("list").len(), 7);
        assert_eq!(fixture.planner.run_state(&fixture.owner), RunState::Completed);
        assert!(fixture.notifier.codes().contains(&"plan.generated".to_string()));

        for outfit in report.plan.outfits() {
            assert!(outfit.upper_id.0.starts_with("tee") || outfit.upper_id.0.starts_with("s"));
            assert!(["jeans-blue", "pants-black", "pants-beige", "skirt-gray"]
                .contains(&outfit.bottom_id.0.as_str()));
        }
    }

    #[tokio::test]
    async fn missing_bottoms_abort_before_touching_persistence() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        fixture.wardrobe.insert(item("tee-white", BodySlot::Upper, "t-shirt", "#FFFFFF")).await;

        let error = fixture
            .planner
            .generate_weekly_plan(&fixture.owner)
            .await
            .expect_err("no bottoms");

        assert_eq!(error, PlanError::InsufficientWardrobe { uppers: 1, bottoms: 0 });
        assert_eq!(fixture.outfits.write_count(), 0);
        assert_eq!(fixture.planner.run_state(&fixture.owner), RunState::Failed);
        assert_eq!(fixture.notifier.codes(), vec!["plan.insufficient_wardrobe"]);

        let regenerate = fixture.planner.regenerate_day(&fixture.owner, DayOfWeek::Monday).await;
        assert!(matches!(regenerate, Err(PlanError::InsufficientWardrobe { .. })));
        assert_eq!(fixture.outfits.write_count(), 0);
    }

    #[tokio::test]
    async fn white_upper_pairs_with_blue_jeans() {
        let fixture = fixture(Some("sk-live"), Ok(JEANS_REPLY));
        stock_basic_wardrobe(&fixture).await;

        let report = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");

        for outfit in report.plan.outfits() {
            assert_eq!(outfit.upper_id.0, "tee-white");
            assert_eq!(outfit.bottom_id.0, "jeans-blue");
        }
        for outcome in report.days.iter().filter(|outcome| outcome.seed_slot == BodySlot::Upper) {
            assert_eq!(outcome.pairing, DayPairing::Matched);
        }
    }

    #[tokio::test]
    async fn remote_suggestions_are_cached_and_reused() {
        let fixture = fixture(Some("sk-live"), Ok(JEANS_REPLY));
        stock_basic_wardrobe(&fixture).await;

        let first = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("first");
        let calls_after_first = fixture.client.calls();
        assert!((1..=2).contains(&calls_after_first));
        assert!(first.days.iter().any(|outcome| outcome.from_cache));
        assert!(fixture.cache_store.raw(&fixture.owner).await.is_some());

        let second = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("second");
        assert!(fixture.client.calls() <= 2);
        assert!(second
            .days
            .iter()
            .filter(|outcome| outcome.from_cache)
            .all(|outcome| outcome.fallback_reason.is_none()));
    }

    #[tokio::test]
    async fn fallback_suggestions_are_not_cached() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        stock_basic_wardrobe(&fixture).await;

        let report = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");

        assert!(report.days.iter().all(|outcome| !outcome.from_cache));
        assert!(fixture.cache_store.raw(&fixture.owner).await.is_none());
        assert_eq!(fixture.client.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_generation_is_rejected_without_persisting() {
        let fixture = fixture(Some("sk-live"), Ok(JEANS_REPLY));
        stock_basic_wardrobe(&fixture).await;
        fixture.client.hold_first.store(true, Ordering::SeqCst);

        let planner = &fixture.planner;
        let client = fixture.client.clone();
        let owner = fixture.owner.clone();
        let (first, second) = tokio::join!(planner.generate_weekly_plan(&owner), async {
            client.entered.notified().await;
            let second = planner.generate_weekly_plan(&owner).await;
            let regenerate = planner.regenerate_day(&owner, DayOfWeek::Friday).await;
            client.release.notify_one();
            (second, regenerate)
        });

        assert!(first.is_ok());
        assert_eq!(second.0, Err(PlanError::GenerationInProgress));
        assert!(matches!(second.1, Err(PlanError::GenerationInProgress)));
        assert_eq!(fixture.outfits.write_count(), 1);
        assert!(fixture.notifier.codes().contains(&"plan.in_progress".to_string()));
        assert_eq!(planner.run_state(&owner), RunState::Completed);
    }

    #[tokio::test]
    async fn regenerating_wednesday_leaves_other_days_untouched() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        stock_large_wardrobe(&fixture).await;
        let before = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan").plan;

        let report = fixture
            .planner
            .regenerate_day(&fixture.owner, DayOfWeek::Wednesday)
            .await
            .expect("regenerate");
        let after = fixture.planner.weekly_plan(&fixture.owner).await.expect("plan");

        assert_eq!(report.outfit.day, DayOfWeek::Wednesday);
        assert_eq!(after.get(DayOfWeek::Wednesday), Some(&report.outfit));
        assert_ne!(after.get(DayOfWeek::Wednesday), before.get(DayOfWeek::Wednesday));
        for day in DayOfWeek::ALL.into_iter().filter(|day| *day != DayOfWeek::Wednesday) {
            assert_eq!(after.get(day), before.get(day), "{day} changed");
        }
        assert_eq!(
            fixture.outfits.find_for_day(&fixture.owner, DayOfWeek::Wednesday).await.expect("find"),
            Some(report.outfit)
        );
    }

    #[tokio::test]
    async fn persistence_failure_keeps_previous_plan() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        stock_large_wardrobe(&fixture).await;
        let previous = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan").plan;

        fixture.outfits.set_fail_writes(true);
        let error = fixture
            .planner
            .generate_weekly_plan(&fixture.owner)
            .await
            .expect_err("store down");

        assert!(matches!(error, PlanError::Persistence(_)));
        assert_eq!(fixture.planner.run_state(&fixture.owner), RunState::Failed);
        assert_eq!(fixture.planner.weekly_plan(&fixture.owner).await.expect("plan"), previous);
        assert!(fixture.notifier.codes().contains(&"plan.persistence_failed".to_string()));

        let regenerate = fixture.planner.regenerate_day(&fixture.owner, DayOfWeek::Monday).await;
        assert!(matches!(regenerate, Err(PlanError::Persistence(_))));
        assert_eq!(fixture.planner.weekly_plan(&fixture.owner).await.expect("plan"), previous);
    }

    #[tokio::test]
    async fn failed_suggestion_lookups_recover_with_random_pairs() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        fixture.wardrobe.insert(item(" ", BodySlot::Upper, "t-shirt", "#FFFFFF")).await;
        fixture.wardrobe.insert(item("  ", BodySlot::Bottom, "jeans", "#0000FF")).await;

        let report = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");

        assert_eq!(report.state, RunState::PartiallyCompleted);
        assert!(report.days.iter().all(|outcome| outcome.pairing == DayPairing::Recovered));
        assert!(report.plan.is_complete());
        assert_eq!(fixture.planner.run_state(&fixture.owner), RunState::PartiallyCompleted);
    }

    #[tokio::test]
    async fn rate_limited_endpoint_notifies_once_per_run() {
        let fixture = fixture(
            Some("sk-live"),
            Err(CompletionError::Status { status: 429, retry_after_secs: None }),
        );
        stock_large_wardrobe(&fixture).await;

        let report = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");

        assert_eq!(fixture.client.calls(), 1);
        assert_eq!(report.fallback_reasons[0], FallbackReason::RateLimited);
        assert!(report.fallback_reasons.contains(&FallbackReason::CoolingDown));
        let rate_limited = fixture
            .notifier
            .codes()
            .into_iter()
            .filter(|code| code == "suggestions.rate_limited")
            .count();
        assert_eq!(rate_limited, 1);

        fixture.clock.advance(Duration::seconds(60));
        fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");
        assert_eq!(fixture.client.calls(), 2);
    }

    #[tokio::test]
    async fn unavailable_endpoint_warns_the_first_time_only() {
        let fixture = fixture(
            Some("sk-live"),
            Err(CompletionError::Status { status: 404, retry_after_secs: None }),
        );
        stock_large_wardrobe(&fixture).await;

        fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("first");
        fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("second");

        let warnings = fixture
            .notifier
            .codes()
            .into_iter()
            .filter(|code| code == "suggestions.endpoint_unavailable")
            .count();
        assert_eq!(warnings, 1);
        assert_eq!(fixture.client.calls(), 1);

        fixture.planner.reset_endpoint_state();
        fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("third");
        assert_eq!(fixture.client.calls(), 2);
    }

    #[tokio::test]
    async fn reads_come_from_the_store_on_first_access() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        stock_large_wardrobe(&fixture).await;
        let generated = fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");

        let planner = &fixture.planner;
        assert_eq!(
            planner.outfit_for_day(&fixture.owner, DayOfWeek::Friday).await.expect("friday"),
            generated.plan.get(DayOfWeek::Friday).cloned()
        );
        assert_eq!(
            planner.current_day_outfit(&fixture.owner).await.expect("today"),
            generated.plan.get(DayOfWeek::Wednesday).cloned()
        );

        let stranger = OwnerId("owner-2".to_string());
        assert!(planner.weekly_plan(&stranger).await.expect("empty").is_empty());
        assert_eq!(planner.run_state(&stranger), RunState::Idle);
    }

    #[tokio::test]
    async fn reset_suggestion_cache_clears_entries() {
        let fixture = fixture(Some("sk-live"), Ok(JEANS_REPLY));
        stock_basic_wardrobe(&fixture).await;
        fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");
        assert!(fixture.cache_store.raw(&fixture.owner).await.is_some());

        fixture.planner.reset_suggestion_cache(&fixture.owner).await.expect("reset");

        assert!(fixture.cache_store.raw(&fixture.owner).await.is_none());
        assert!(fixture.notifier.codes().contains(&"cache.reset".to_string()));
    }

    #[tokio::test]
    async fn forgotten_plan_is_reloaded_from_the_store() {
        let fixture = fixture(None, Ok(JEANS_REPLY));
        stock_basic_wardrobe(&fixture).await;
        fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");

        fixture.outfits.delete_for_owner(&fixture.owner).await.expect("delete");
        assert_eq!(fixture.planner.weekly_plan(&fixture.owner).await.expect("memo").len(), 7);

        fixture.planner.forget_plan(&fixture.owner).await;
        assert!(fixture.planner.weekly_plan(&fixture.owner).await.expect("reloaded").is_empty());
    }

    #[tokio::test]
    async fn plan_forgotten_during_regeneration_reloads_every_day() {
        let fixture = fixture(Some("sk-live"), Ok(JEANS_REPLY));
        stock_large_wardrobe(&fixture).await;
        fixture.planner.generate_weekly_plan(&fixture.owner).await.expect("plan");
        fixture.planner.reset_suggestion_cache(&fixture.owner).await.expect("reset");
        fixture.client.hold_first.store(true, Ordering::SeqCst);

        let planner = &fixture.planner;
        let client = fixture.client.clone();
        let owner = fixture.owner.clone();
        let (report, ()) = tokio::join!(planner.regenerate_day(&owner, DayOfWeek::Friday), async {
            client.entered.notified().await;
            planner.forget_plan(&owner).await;
            client.release.notify_one();
        });
        let report = report.expect("regenerate");

        let plan = planner.weekly_plan(&owner).await.expect("plan");
        let stored = fixture.outfits.list_for_owner(&owner).await.expect("stored");
        assert_eq!(stored.len(), 7);
        assert_eq!(plan.len(), 7);
        assert_eq!(plan.get(DayOfWeek::Friday), Some(&report.outfit));
    }
}
