use serde::{Deserialize, Serialize};

use super::risk::RiskTier;
use crate::catalog::FoodItem;

/// Maximum admissible glycemic index per risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiThresholds {
    pub high: u16,
    pub medium: u16,
    pub low: u16,
}

impl Default for GiThresholds {
    fn default() -> Self {
        Self {
            high: 35,
            medium: 50,
            low: 50,
        }
    }
}

impl GiThresholds {
    pub fn for_tier(&self, tier: RiskTier) -> u16 {
        match tier {
            RiskTier::High => self.high,
            RiskTier::Medium => self.medium,
            RiskTier::Low => self.low,
        }
    }

    pub fn describe(&self, tier: RiskTier) -> String {
        let threshold = self.for_tier(tier);
        let band = GiCategory::from_gi(threshold).label();
        format!(
            "GI ≤ {threshold} ({band}, {})",
            tier.label().to_ascii_lowercase()
        )
    }
}

/// Glycemic band reported alongside each recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiCategory {
    VeryLow,
    Low,
    Medium,
    High,
}

impl GiCategory {
    pub fn from_gi(gi: u16) -> Self {
        match gi {
            0..=35 => GiCategory::VeryLow,
            36..=50 => GiCategory::Low,
            51..=70 => GiCategory::Medium,
            _ => GiCategory::High,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GiCategory::VeryLow => "very low",
            GiCategory::Low => "low",
            GiCategory::Medium => "medium",
            GiCategory::High => "high",
        }
    }
}

/// Category rows surviving the tier threshold.
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub threshold: u16,
    pub before: usize,
    pub survivors: Vec<&'a FoodItem>,
}

/// Every candidate was above the threshold. The caller decides whether this fails the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyAfterFilter {
    pub threshold: u16,
    pub before: usize,
}

/// Keeps items with `effective_gi() <= threshold`; unknown GI counts as 100 and never passes.
pub fn filter_by_tier<'a>(
    candidates: &[&'a FoodItem],
    tier: RiskTier,
    thresholds: &GiThresholds,
) -> Result<FilterOutcome<'a>, EmptyAfterFilter> {
    let threshold = thresholds.for_tier(tier);
    let survivors: Vec<&FoodItem> = candidates
        .iter()
        .copied()
        .filter(|item| item.effective_gi() <= threshold)
        .collect();

    if survivors.is_empty() {
        return Err(EmptyAfterFilter {
            threshold,
            before: candidates.len(),
        });
    }

    Ok(FilterOutcome {
        threshold,
        before: candidates.len(),
        survivors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn food(name: &str, gi: Option<u16>) -> FoodItem {
        FoodItem {
            name: name.to_string(),
            category: "Buah".to_string(),
            glycemic_index: gi,
            calories: 40.0,
            carbohydrates: 9.0,
            protein: 0.5,
            fat: 0.1,
            fiber: 2.0,
            sodium: 1.0,
            sugar: 6.0,
            suitable_for_diabetes: true,
        }
    }

    #[test]
    fn high_risk_keeps_only_very_low_gi() {
        let foods = [
            food("Ceri", Some(22)),
            food("Apel", Some(36)),
            food("Pir", Some(35)),
        ];
        let refs: Vec<&FoodItem> = foods.iter().collect();
        let outcome =
            filter_by_tier(&refs, RiskTier::High, &GiThresholds::default()).expect("survivors");
        let names: Vec<&str> = outcome.survivors.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Ceri", "Pir"]);
        assert_eq!(outcome.threshold, 35);
        assert_eq!(outcome.before, 3);
    }

    #[test]
    fn unknown_gi_fails_closed() {
        let foods = [food("Durian", None)];
        let refs: Vec<&FoodItem> = foods.iter().collect();
        let err = filter_by_tier(&refs, RiskTier::Low, &GiThresholds::default())
            .expect_err("unknown gi filtered");
        assert_eq!(
            err,
            EmptyAfterFilter {
                threshold: 50,
                before: 1
            }
        );
    }

    #[test]
    fn medium_and_low_share_threshold() {
        let thresholds = GiThresholds::default();
        assert_eq!(thresholds.for_tier(RiskTier::Medium), 50);
        assert_eq!(thresholds.for_tier(RiskTier::Low), 50);
        assert_eq!(
            thresholds.describe(RiskTier::High),
            "GI ≤ 35 (very low, high risk)"
        );
    }

    #[test]
    fn gi_bands() {
        assert_eq!(GiCategory::from_gi(35), GiCategory::VeryLow);
        assert_eq!(GiCategory::from_gi(50), GiCategory::Low);
        assert_eq!(GiCategory::from_gi(70), GiCategory::Medium);
        assert_eq!(GiCategory::from_gi(71), GiCategory::High);
    }
}
