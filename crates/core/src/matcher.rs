use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::item::ClothingItem;
use crate::domain::suggestion::Suggestion;
use crate::labels::LabelCatalog;

/// Resolves abstract suggestions to concrete wardrobe items.
pub struct Matcher<'a> {
    labels: &'a LabelCatalog,
}

impl<'a> Matcher<'a> {
    pub fn new(labels: &'a LabelCatalog) -> Self {
        Self { labels }
    }

    /// At most one item per suggestion, in suggestion order. A suggestion
    /// with no surviving candidate contributes nothing.
    pub fn find_matches<R: Rng + ?Sized>(
        &self,
        suggestions: &[Suggestion],
        pool: &[ClothingItem],
        rng: &mut R,
    ) -> Vec<ClothingItem> {
        suggestions
            .iter()
            .filter_map(|suggestion| {
                let candidates = pool
                    .iter()
                    .filter(|item| self.satisfies(item, suggestion))
                    .collect::<Vec<_>>();
                candidates.choose(rng).map(|item| (*item).clone())
            })
            .collect()
    }

    pub fn satisfies(&self, item: &ClothingItem, suggestion: &Suggestion) -> bool {
        if item.slot != suggestion.slot {
            return false;
        }

        let category_ok = label_matches(
            &suggestion.category,
            &[item.category_id.as_str(), self.labels.category(&item.category_id).as_str()],
        );
        let subcategory_ok = suggestion.subcategory.as_deref().map_or(true, |wanted| {
            label_matches(
                wanted,
                &[
                    item.subcategory_id.as_str(),
                    self.labels.subcategory(&item.subcategory_id).as_str(),
                ],
            )
        });
        let color_ok = suggestion
            .color
            .as_deref()
            .map_or(true, |wanted| label_matches(wanted, &[self.labels.color(&item.color).as_str()]));

        category_ok && subcategory_ok && color_ok
    }
}

/// Empty constraints match everything; otherwise the wanted label must be a
/// case-insensitive substring of one of the haystacks.
fn label_matches(wanted: &str, haystacks: &[&str]) -> bool {
    let wanted = wanted.trim().to_lowercase();
    if wanted.is_empty() {
        return true;
    }
    haystacks.iter().any(|haystack| haystack.to_lowercase().contains(&wanted))
}
