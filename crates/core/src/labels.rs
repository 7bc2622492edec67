//! Human-readable labels for item attributes.
//!
//! Matching and prompts work on labels, not raw ids: colors are stored as hex
//! strings and categories as ids, and both are resolved here. Lookups never
//! fail; anything unknown comes back as the (normalized) input.

use std::collections::HashMap;

use crate::domain::catalog::{default_categories, default_subcategories, Category, Subcategory};
use crate::domain::item::ClothingItem;
use crate::stores::CatalogStore;

const COLOR_NAMES: &[(&str, &str)] = &[
    ("#000000", "black"),
    ("#FFFFFF", "white"),
    ("#FF0000", "red"),
    ("#00FF00", "green"),
    ("#0000FF", "blue"),
    ("#FFFF00", "yellow"),
    ("#FFA500", "orange"),
    ("#800080", "purple"),
    ("#A52A2A", "brown"),
    ("#FFC0CB", "pink"),
    ("#808080", "gray"),
    ("#F0E68C", "khaki"),
    ("#F5F5DC", "beige"),
    ("#000080", "navy"),
];

/// Maps a stored color to its name. Unknown hex values come back uppercased
/// with the `#` kept; values without `#` are already names.
pub fn label_for_color(value: &str) -> String {
    let trimmed = value.trim();
    if !trimmed.starts_with('#') {
        return trimmed.to_lowercase();
    }

    let normalized = trimmed.to_ascii_uppercase();
    COLOR_NAMES
        .iter()
        .find(|(hex, _)| *hex == normalized)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(normalized)
}

#[derive(Clone, Debug, Default)]
pub struct LabelCatalog {
    categories: HashMap<String, String>,
    subcategories: HashMap<String, String>,
}

impl LabelCatalog {
    pub fn new(categories: Vec<Category>, subcategories: Vec<Subcategory>) -> Self {
        Self {
            categories: categories.into_iter().map(|c| (c.id, c.name)).collect(),
            subcategories: subcategories.into_iter().map(|s| (s.id, s.name)).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(default_categories(), default_subcategories())
    }

    /// Loads reference data, substituting the built-in set for any list that
    /// comes back empty or fails to load.
    pub async fn load(store: &dyn CatalogStore) -> Self {
        let categories = match store.categories().await {
            Ok(categories) if !categories.is_empty() => categories,
            Ok(_) => default_categories(),
            Err(error) => {
                tracing::warn!(
                    event_name = "labels.categories_fallback",
                    error = %error,
                    "category load failed, using built-in categories"
                );
                default_categories()
            }
        };
        let subcategories = match store.subcategories().await {
            Ok(subcategories) if !subcategories.is_empty() => subcategories,
            Ok(_) => default_subcategories(),
            Err(error) => {
                tracing::warn!(
                    event_name = "labels.subcategories_fallback",
                    error = %error,
                    "subcategory load failed, using built-in subcategories"
                );
                default_subcategories()
            }
        };
        Self::new(categories, subcategories)
    }

    pub fn category(&self, id: &str) -> String {
        self.categories.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn subcategory(&self, id: &str) -> String {
        self.subcategories.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn color(&self, value: &str) -> String {
        label_for_color(value)
    }

    pub fn describe(&self, item: &ClothingItem) -> ItemLabels {
        ItemLabels {
            color: self.color(&item.color),
            category: self.category(&item.category_id),
            subcategory: self.subcategory(&item.subcategory_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemLabels {
    pub color: String,
    pub category: String,
    pub subcategory: String,
}
