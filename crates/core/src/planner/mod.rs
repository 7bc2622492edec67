//! Weekly plan generation and single-day regeneration.
//!
//! Both operations share a per-owner in-progress guard, pick a random seed
//! item per day, resolve suggestions for it (cache first, then the
//! suggestion source) and pair the seed with a matching item from the
//! opposite slot. Plans are persisted atomically and mirrored in memory.

mod engine;
mod guard;

pub use engine::OutfitPlanner;
pub use guard::{GenerationLockGuard, GenerationLocks};

use serde::Serialize;

use crate::domain::item::{BodySlot, ItemId};
use crate::domain::outfit::{DayOfWeek, Outfit, WeeklyPlan};
use crate::errors::FallbackReason;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    /// Finished and persisted, but at least one day was recovered with a
    /// random pairing.
    PartiallyCompleted,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::PartiallyCompleted => "partially_completed",
            Self::Failed => "failed",
        }
    }
}

/// How a day's partner item was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPairing {
    /// First item the matcher returned for the seed's suggestions.
    Matched,
    /// Nothing matched; a random item from the opposite slot was used.
    NoCandidates,
    /// Suggestion lookup failed; random upper and random bottom.
    Recovered,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayOutcome {
    pub day: DayOfWeek,
    pub seed_slot: BodySlot,
    pub seed_id: ItemId,
    pub pairing: DayPairing,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    pub state: RunState,
    pub plan: WeeklyPlan,
    pub days: Vec<DayOutcome>,
    pub fallback_reasons: Vec<FallbackReason>,
}

impl PlanReport {
    pub fn outcome(&self, day: DayOfWeek) -> Option<&DayOutcome> {
        self.days.iter().find(|outcome| outcome.day == day)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub state: RunState,
    pub outfit: Outfit,
    pub outcome: DayOutcome,
}
