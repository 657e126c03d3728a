use serde::{Deserialize, Serialize};

/// Glycemic index assumed for rows whose GI is missing or unparseable.
///
/// It sits above every admissible threshold, so such rows never survive filtering.
pub const UNKNOWN_GLYCEMIC_INDEX: u16 = 100;

/// Immutable catalog row with nutrition facts per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub category: String,
    pub glycemic_index: Option<u16>,
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sodium: f64,
    pub sugar: f64,
    pub suitable_for_diabetes: bool,
}

impl FoodItem {
    /// GI used for filtering, ordering and weighting.
    pub fn effective_gi(&self) -> u16 {
        self.glycemic_index.unwrap_or(UNKNOWN_GLYCEMIC_INDEX)
    }

    pub fn nutrients(&self) -> NutrientVector {
        NutrientVector {
            glycemic_index: f64::from(self.effective_gi()),
            calories: self.calories,
            carbohydrates: self.carbohydrates,
            protein: self.protein,
            fat: self.fat,
            fiber: self.fiber,
            sodium: self.sodium,
        }
    }
}

/// Nutrient features consumed by the suitability scorers, in model input order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientVector {
    pub glycemic_index: f64,
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sodium: f64,
}

impl NutrientVector {
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.glycemic_index,
            self.calories,
            self.carbohydrates,
            self.protein,
            self.fat,
            self.fiber,
            self.sodium,
        ]
    }
}

/// Per-category counts exposed by the catalog listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub items: usize,
    pub low_gi_items: usize,
}
