use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::item::BodySlot;

/// Description of a garment that would complement a seed item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub slot: BodySlot,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Suggestion {
    pub fn new(slot: BodySlot, category: impl Into<String>) -> Self {
        Self { slot, category: category.into(), subcategory: None, color: None }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Lenient decode of one untrusted record. `type` and `category` must be
    /// strings and `type` must name a body slot; optional fields that are not
    /// non-empty strings are dropped.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let object = value.as_object().ok_or_else(|| "suggestion is not an object".to_string())?;
        let raw_slot = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "suggestion is missing string field `type`".to_string())?;
        let slot = raw_slot.parse::<BodySlot>().map_err(|error| error.to_string())?;
        let category = object
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .ok_or_else(|| "suggestion is missing string field `category`".to_string())?;

        Ok(Self {
            slot,
            category: category.to_string(),
            subcategory: optional_label(object.get("subcategory")),
            color: optional_label(object.get("color")),
        })
    }
}

fn optional_label(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

/// Decodes every well-formed record, logging and skipping the rest.
pub fn decode_suggestions(values: &[Value]) -> Vec<Suggestion> {
    values
        .iter()
        .filter_map(|value| match Suggestion::from_value(value) {
            Ok(suggestion) => Some(suggestion),
            Err(reason) => {
                tracing::warn!(
                    event_name = "suggestions.record_skipped",
                    reason = %reason,
                    "skipping malformed suggestion record"
                );
                None
            }
        })
        .collect()
}
