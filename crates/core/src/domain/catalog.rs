use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: String,
    pub category_id: String,
    pub name: String,
}

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("t-shirt", "T-Shirt"),
    ("shirt", "Shirt"),
    ("sweater", "Sweater"),
    ("hoodie", "Hoodie"),
    ("jacket", "Jacket"),
    ("jeans", "Jeans"),
    ("pants", "Pants"),
    ("shorts", "Shorts"),
    ("skirt", "Skirt"),
];

const DEFAULT_SUBCATEGORIES: &[(&str, &str, &str)] = &[
    ("crew-neck", "t-shirt", "Crew Neck"),
    ("v-neck", "t-shirt", "V-Neck"),
    ("oxford", "shirt", "Oxford"),
    ("flannel", "shirt", "Flannel"),
    ("cardigan", "sweater", "Cardigan"),
    ("pullover", "sweater", "Pullover"),
    ("zip-hoodie", "hoodie", "Zip Hoodie"),
    ("denim-jacket", "jacket", "Denim Jacket"),
    ("skinny", "jeans", "Skinny"),
    ("straight", "jeans", "Straight"),
    ("chinos", "pants", "Chinos"),
    ("cargo", "pants", "Cargo"),
    ("denim-shorts", "shorts", "Denim Shorts"),
    ("pleated", "skirt", "Pleated"),
];

/// Built-in reference data used when the catalog store has nothing to offer.
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, name)| Category { id: (*id).to_string(), name: (*name).to_string() })
        .collect()
}

pub fn default_subcategories() -> Vec<Subcategory> {
    DEFAULT_SUBCATEGORIES
        .iter()
        .map(|(id, category_id, name)| Subcategory {
            id: (*id).to_string(),
            category_id: (*category_id).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}
