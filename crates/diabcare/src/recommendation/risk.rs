use serde::{Deserialize, Serialize};

use crate::profile::HealthProfile;

/// Coarse diabetes risk classification used to pick a GI filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::High => "High risk",
            RiskTier::Medium => "Medium risk",
            RiskTier::Low => "Low risk",
        }
    }

    pub fn from_points(points: u8) -> Self {
        if points >= 7 {
            RiskTier::High
        } else if points >= 4 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Where the tier of a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSource {
    /// Additive point system over the four measurements.
    Rules,
    /// Binary classifier label: positive maps to high, negative to low.
    Classifier,
}

impl RiskSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule_based" | "rule-based" => Some(Self::Rules),
            "classifier" | "model" | "ml" => Some(Self::Classifier),
            _ => None,
        }
    }
}

/// Tier decision plus the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    /// Rule points, always computed even when the classifier decides the tier.
    pub points: u8,
    pub source: RiskSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_label: Option<u8>,
    /// Set when the classifier was requested but failed or is not configured.
    pub classifier_unavailable: bool,
}

/// Additive risk points for a profile.
pub fn risk_points(profile: &HealthProfile) -> u8 {
    let glucose = profile.glucose();
    let glucose_points = if glucose >= 126.0 {
        4
    } else if glucose >= 100.0 {
        2
    } else if glucose >= 90.0 {
        1
    } else {
        0
    };

    let insulin = profile.insulin();
    let insulin_points = if insulin >= 25.0 {
        3
    } else if insulin >= 15.0 {
        2
    } else if insulin >= 10.0 {
        1
    } else {
        0
    };

    let bmi = profile.bmi();
    let bmi_points = if bmi >= 30.0 {
        2
    } else if bmi >= 25.0 {
        1
    } else {
        0
    };

    let age = profile.age();
    let age_points = if age >= 60.0 {
        2
    } else if age >= 45.0 {
        1
    } else {
        0
    };

    glucose_points + insulin_points + bmi_points + age_points
}

/// Rule-based tier. Pure and total.
pub fn assess_by_rules(profile: &HealthProfile) -> RiskAssessment {
    let points = risk_points(profile);
    RiskAssessment {
        tier: RiskTier::from_points(points),
        points,
        source: RiskSource::Rules,
        classifier_label: None,
        classifier_unavailable: false,
    }
}
