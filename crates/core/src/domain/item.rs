use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a garment is worn. Fixed for the lifetime of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySlot {
    Upper,
    Bottom,
}

impl BodySlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Bottom => "bottom",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Upper => Self::Bottom,
            Self::Bottom => Self::Upper,
        }
    }
}

impl fmt::Display for BodySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodySlot {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "upper" => Ok(Self::Upper),
            "bottom" => Ok(Self::Bottom),
            other => Err(DomainError::InvalidBodySlot(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: ItemId,
    pub owner_id: OwnerId,
    pub name: Option<String>,
    pub image_ref: String,
    pub slot: BodySlot,
    pub category_id: String,
    pub subcategory_id: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl ClothingItem {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|name| !name.trim().is_empty()).unwrap_or(&self.id.0)
    }
}

/// Input for adding an item; the store assigns the id and timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClothingItem {
    pub name: Option<String>,
    pub image_ref: String,
    pub slot: BodySlot,
    pub category_id: String,
    pub subcategory_id: String,
    pub color: String,
}

impl NewClothingItem {
    pub fn into_item(self, owner_id: OwnerId, created_at: DateTime<Utc>) -> ClothingItem {
        ClothingItem {
            id: ItemId::generate(),
            owner_id,
            name: self.name,
            image_ref: self.image_ref,
            slot: self.slot,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
            color: self.color,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BodySlot;

    #[test]
    fn body_slot_parses_case_insensitively() {
        assert_eq!(" Upper ".parse::<BodySlot>().expect("parse upper"), BodySlot::Upper);
        assert_eq!("BOTTOM".parse::<BodySlot>().expect("parse bottom"), BodySlot::Bottom);
        assert!("shoes".parse::<BodySlot>().is_err());
    }

    #[test]
    fn opposite_slot_flips() {
        assert_eq!(BodySlot::Upper.opposite(), BodySlot::Bottom);
        assert_eq!(BodySlot::Bottom.opposite(), BodySlot::Upper);
    }
}
