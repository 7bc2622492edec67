use serde_json::Value;

use crate::domain::item::BodySlot;
use crate::domain::suggestion::{decode_suggestions, Suggestion};
use crate::labels::ItemLabels;

pub fn build_prompt(slot: BodySlot, labels: &ItemLabels) -> String {
    let wanted = slot.opposite();
    format!(
        "I have a {color} {subcategory} {category} ({slot} body garment) in my wardrobe. \
         Suggest 2 to 4 {wanted} body garments that would pair well with it. \
         Reply with a JSON object of the form \
         {{\"suggestions\": [{{\"type\": \"{wanted}\", \"category\": \"...\", \
         \"subcategory\": \"...\", \"color\": \"...\"}}]}} where `type` is \
         \"upper\" or \"bottom\" and `category` names a garment kind such as \
         Jeans, Pants, T-Shirt, Shirt or Sweater. Use plain color names.",
        color = labels.color,
        subcategory = labels.subcategory,
        category = labels.category,
        slot = slot,
        wanted = wanted,
    )
}

/// The slice from the first `{` to the last `}`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Pulls the `suggestions` array out of free-form reply text, keeping at most
/// `limit` records. Bad records are skipped; an empty result is an error.
pub fn parse_reply(text: &str, limit: usize) -> Result<Vec<Suggestion>, String> {
    let object = extract_json_object(text).ok_or_else(|| "reply has no JSON object".to_string())?;
    let value: Value =
        serde_json::from_str(object).map_err(|error| format!("reply JSON is invalid: {error}"))?;
    let records = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| "reply has no `suggestions` array".to_string())?;

    let mut suggestions = decode_suggestions(records);
    if suggestions.is_empty() {
        return Err("reply contained no valid suggestions".to_string());
    }
    suggestions.truncate(limit);
    Ok(suggestions)
}
