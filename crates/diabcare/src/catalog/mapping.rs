use super::normalizer::normalize_category;
use std::collections::HashMap;
use std::sync::OnceLock;

static DISPLAY_CATEGORY_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

/// Translates a display category name into the name used by the catalog data.
///
/// Unmapped names fall back to the trimmed input.
pub(crate) fn catalog_category_for(display_name: &str) -> String {
    let normalized = normalize_category(display_name);
    display_category_map()
        .get(normalized.as_str())
        .map(|mapped| (*mapped).to_string())
        .unwrap_or(normalized)
}

fn display_category_map() -> &'static HashMap<&'static str, &'static str> {
    DISPLAY_CATEGORY_MAP.get_or_init(|| {
        const DISPLAY_TO_CATALOG: &[(&str, &str)] = &[
            ("Protein Hewani", "Protein hewani"),
            ("Protein Nabati", "Protein Nabati"),
            ("Karbohidrat", "Karbohidrat"),
            ("Sayur", "Sayur"),
            ("Buah", "Buah"),
            ("Biji-bijian", "Biji-bijian"),
            ("Kacang-kacangan", "Kacang-kacangan"),
        ];

        DISPLAY_TO_CATALOG.iter().copied().collect()
    })
}
