use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::item::BodySlot;
use crate::domain::suggestion::Suggestion;

const NEUTRAL_BOTTOM_COLORS: &[&str] = &["blue", "black", "beige", "gray"];

/// Rule-based suggestion for a seed described by its labels. Always yields
/// exactly one suggestion for the opposite slot.
pub fn mock_suggestion<R: Rng + ?Sized>(
    slot: BodySlot,
    color: &str,
    category: &str,
    rng: &mut R,
) -> Suggestion {
    let color = color.trim().to_lowercase();
    let category = category.to_lowercase();

    match slot {
        BodySlot::Upper => match color.as_str() {
            "black" | "white" => {
                let kind = pick(rng, &["Jeans", "Pants"]);
                let color = pick(rng, NEUTRAL_BOTTOM_COLORS);
                Suggestion::new(BodySlot::Bottom, kind).with_color(color)
            }
            "blue" => Suggestion::new(BodySlot::Bottom, "Jeans").with_color("blue"),
            _ => Suggestion::new(BodySlot::Bottom, "Pants").with_color("black"),
        },
        BodySlot::Bottom => {
            if category.contains("jeans") {
                Suggestion::new(BodySlot::Upper, "T-Shirt").with_color("white")
            } else if category.contains("pants") {
                let kind = pick(rng, &["Sweater", "Shirt"]);
                let color = pick(rng, &["black", "white"]);
                Suggestion::new(BodySlot::Upper, kind).with_color(color)
            } else {
                let contrast = if color == "black" { "white" } else { "black" };
                Suggestion::new(BodySlot::Upper, "T-Shirt").with_color(contrast)
            }
        }
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or(options[0])
}
