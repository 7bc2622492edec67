use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::{ItemId, OwnerId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutfitId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Generation order for a weekly run.
    pub const ALL: [DayOfWeek; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == normalized)
            .ok_or(DomainError::InvalidDay(normalized))
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    pub id: OutfitId,
    pub owner_id: OwnerId,
    pub upper_id: ItemId,
    pub bottom_id: ItemId,
    pub day: DayOfWeek,
    pub created_at: DateTime<Utc>,
}

/// A pairing that has not been persisted yet; the outfit store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOutfit {
    pub owner_id: OwnerId,
    pub upper_id: ItemId,
    pub bottom_id: ItemId,
    pub day: DayOfWeek,
    pub created_at: DateTime<Utc>,
}

/// An owner's outfits keyed by day. Day labels are unique by construction;
/// the plan may hold fewer than seven entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    days: BTreeMap<DayOfWeek, Outfit>,
}

impl WeeklyPlan {
    pub fn from_outfits(outfits: impl IntoIterator<Item = Outfit>) -> Self {
        let mut plan = Self::default();
        for outfit in outfits {
            plan.upsert(outfit);
        }
        plan
    }

    /// Replaces whatever entry exists for the outfit's day.
    pub fn upsert(&mut self, outfit: Outfit) -> Option<Outfit> {
        self.days.insert(outfit.day, outfit)
    }

    pub fn get(&self, day: DayOfWeek) -> Option<&Outfit> {
        self.days.get(&day)
    }

    pub fn outfits(&self) -> impl Iterator<Item = &Outfit> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.days.len() == DayOfWeek::ALL.len()
    }
}
