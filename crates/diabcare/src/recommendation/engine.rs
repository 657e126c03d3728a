use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::filter::{filter_by_tier, GiCategory};
use super::risk::{assess_by_rules, RiskAssessment, RiskSource, RiskTier};
use super::sampler::{GlycemicWeighted, WeightedSampler};
use super::scoring::{ScoreOutcome, ScoringEngine, ScoringMethod};
use super::seed::{derive_seed, TimeBucket};
use super::RecommendationConfig;
use crate::catalog::{CategoryMatch, FoodCatalog, FoodItem};
use crate::prediction::RiskClassifier;
use crate::profile::{HealthProfile, ProfileError};

/// One consumer request: a display category plus validated measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub category: String,
    pub profile: HealthProfile,
    pub top_n: Option<usize>,
}

impl RecommendationRequest {
    pub fn new(category: impl Into<String>, profile: HealthProfile) -> Self {
        Self {
            category: category.into(),
            profile,
            top_n: None,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

/// A catalog item enriched for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub category: String,
    pub glycemic_index: u16,
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar_content: f64,
    pub sodium_content: f64,
    pub suitable_for_diabetes: bool,
    /// `clamp(5 - gi / 10, 0, 5)`; depends on GI only.
    pub rating: f64,
    pub personalization_score: f64,
    pub gi_category: GiCategory,
    pub diabetes_friendly: bool,
    #[serde(rename = "recommendation_reason")]
    pub reason: String,
    pub benefits: String,
    pub model_used: ScoringMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GiRange {
    pub lowest: u16,
    pub highest: u16,
    pub average: f64,
}

/// Enough context to reproduce a response without server logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub category_requested: String,
    pub mapped_category: String,
    pub matched_category: Option<String>,
    pub candidates_in_category: usize,
    pub candidates_after_filter: usize,
    pub risk_points: u8,
    pub risk_source: RiskSource,
    pub classifier_unavailable: bool,
    pub gi_threshold: u16,
    pub seed: u32,
    pub time_bucket: TimeBucket,
    pub sampled: bool,
    pub draw_pool: usize,
    pub scoring_fallbacks: usize,
    pub gi_range: Option<GiRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub risk: RiskAssessment,
    pub gi_filter_description: String,
    pub model_used: ScoringMethod,
    pub diagnostics: Diagnostics,
}

impl RecommendationResponse {
    pub fn risk_tier(&self) -> RiskTier {
        self.risk.tier
    }
}

/// Pipeline stage reached before a request stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStage {
    CategoryResolved,
    RiskDetermined,
    Filtered,
    Scored,
    Sampled,
    Formatted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureContext {
    pub stage: RecommendationStage,
    pub category_requested: String,
    pub mapped_category: String,
    pub candidates_in_category: usize,
    pub candidates_after_filter: usize,
    pub risk_tier: Option<RiskTier>,
    pub gi_threshold: Option<u16>,
    pub reason: String,
    pub suggestion: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error(transparent)]
    InvalidProfile(#[from] ProfileError),
    #[error("top_n must be between 1 and {max}, got {requested}")]
    InvalidTopN { requested: usize, max: usize },
    #[error("no foods found for category '{}'", .0.category_requested)]
    EmptyCategory(Box<FailureContext>),
    #[error(
        "no foods in category '{}' pass the glycemic filter",
        .0.category_requested
    )]
    EmptyAfterFilter(Box<FailureContext>),
}

impl RecommendationError {
    pub fn context(&self) -> Option<&FailureContext> {
        match self {
            RecommendationError::EmptyCategory(context)
            | RecommendationError::EmptyAfterFilter(context) => Some(context),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScoredItem<'a> {
    item: &'a FoodItem,
    outcome: ScoreOutcome,
}

impl GlycemicWeighted for ScoredItem<'_> {
    fn glycemic_index(&self) -> u16 {
        self.item.effective_gi()
    }
}

/// Immutable recommendation context shared by every request.
///
/// Holds no mutable state. Each call to [`RecommendationEngine::recommend`] seeds its own
/// generator, so concurrent requests cannot disturb each other's draws.
pub struct RecommendationEngine {
    catalog: Arc<FoodCatalog>,
    config: RecommendationConfig,
    scoring: ScoringEngine,
    classifier: Option<Arc<dyn RiskClassifier>>,
    sampler: WeightedSampler,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<FoodCatalog>, config: RecommendationConfig) -> Self {
        let sampler = WeightedSampler::new(config.pool_multiplier);
        Self {
            catalog,
            config,
            scoring: ScoringEngine::rule_based(),
            classifier: None,
            sampler,
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn RiskClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn catalog(&self) -> &FoodCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Rule points are always reported; the tier comes from the configured source.
    /// A missing or failing classifier yields the low tier instead of an error.
    pub fn assess_risk(&self, profile: &HealthProfile) -> RiskAssessment {
        let rules = assess_by_rules(profile);
        if self.config.risk_source == RiskSource::Rules {
            return rules;
        }

        let unavailable = RiskAssessment {
            tier: RiskTier::Low,
            points: rules.points,
            source: RiskSource::Classifier,
            classifier_label: None,
            classifier_unavailable: true,
        };

        let Some(classifier) = &self.classifier else {
            warn!("risk classifier requested but not configured; defaulting to low risk");
            return unavailable;
        };

        match classifier.predict(profile) {
            Ok(prediction) => RiskAssessment {
                tier: if prediction.is_positive() {
                    RiskTier::High
                } else {
                    RiskTier::Low
                },
                points: rules.points,
                source: RiskSource::Classifier,
                classifier_label: Some(prediction.label),
                classifier_unavailable: false,
            },
            Err(error) => {
                warn!(error = %error, "risk classifier failed; defaulting to low risk");
                unavailable
            }
        }
    }

    /// Runs the full pipeline for one request.
    ///
    /// Identical requests within the same hour bucket of `now` produce identical responses.
    pub fn recommend(
        &self,
        request: &RecommendationRequest,
        now: DateTime<Utc>,
    ) -> Result<RecommendationResponse, RecommendationError> {
        let top_n = request.top_n.unwrap_or(self.config.default_top_n);
        if top_n == 0 || top_n > self.config.max_top_n {
            return Err(RecommendationError::InvalidTopN {
                requested: top_n,
                max: self.config.max_top_n,
            });
        }

        let profile = &request.profile;
        let found = self.catalog.resolve(&request.category);
        if found.is_empty() {
            return Err(RecommendationError::EmptyCategory(Box::new(
                self.empty_category_context(&found),
            )));
        }
        debug!(
            stage = "category_resolved",
            mapped = %found.mapped,
            candidates = found.items.len()
        );

        let risk = self.assess_risk(profile);
        debug!(stage = "risk_determined", tier = risk.tier.label(), points = risk.points);

        let filtered = match filter_by_tier(&found.items, risk.tier, &self.config.thresholds) {
            Ok(outcome) => outcome,
            Err(empty) => {
                return Err(RecommendationError::EmptyAfterFilter(Box::new(
                    FailureContext {
                        stage: RecommendationStage::Filtered,
                        category_requested: found.requested.clone(),
                        mapped_category: found.mapped.clone(),
                        candidates_in_category: empty.before,
                        candidates_after_filter: 0,
                        risk_tier: Some(risk.tier),
                        gi_threshold: Some(empty.threshold),
                        reason: format!(
                            "all {} foods in this category exceed GI {}",
                            empty.before, empty.threshold
                        ),
                        suggestion: "Choose a category with lower glycemic foods".to_string(),
                    },
                )));
            }
        };
        debug!(stage = "filtered", survivors = filtered.survivors.len());

        let bucket = TimeBucket::at(now, self.config.utc_offset_hours);
        let seed = derive_seed(profile, &request.category, &bucket);

        let mut scored: Vec<ScoredItem<'_>> = filtered
            .survivors
            .iter()
            .map(|&item| ScoredItem {
                item,
                outcome: self.scoring.score(profile, &item.nutrients(), seed),
            })
            .collect();
        scored.sort_by(|a, b| {
            a.item
                .effective_gi()
                .cmp(&b.item.effective_gi())
                .then_with(|| b.outcome.score.total_cmp(&a.outcome.score))
                .then_with(|| a.item.name.cmp(&b.item.name))
        });
        let mut seen = HashSet::new();
        scored.retain(|entry| seen.insert(entry.item.name.as_str()));
        let scoring_fallbacks = scored.iter().filter(|entry| entry.outcome.fell_back).count();
        debug!(stage = "scored", scored = scored.len(), fallbacks = scoring_fallbacks);

        let sample = self.sampler.select(&scored, top_n, seed);
        debug!(stage = "sampled", selected = sample.selected.len(), draws = sample.draws);

        let recommendations: Vec<Recommendation> = sample
            .selected
            .iter()
            .map(|entry| format_recommendation(entry.item, &entry.outcome))
            .collect();
        let model_used = if sample
            .selected
            .iter()
            .any(|entry| entry.outcome.method == ScoringMethod::SuitabilityModel)
        {
            ScoringMethod::SuitabilityModel
        } else {
            ScoringMethod::RuleBased
        };

        let diagnostics = Diagnostics {
            category_requested: found.requested.clone(),
            mapped_category: found.mapped.clone(),
            matched_category: found.matched.clone(),
            candidates_in_category: filtered.before,
            candidates_after_filter: filtered.survivors.len(),
            risk_points: risk.points,
            risk_source: risk.source,
            classifier_unavailable: risk.classifier_unavailable,
            gi_threshold: filtered.threshold,
            seed,
            time_bucket: bucket,
            sampled: sample.sampled,
            draw_pool: sample.draw_pool,
            scoring_fallbacks,
            gi_range: gi_range(&recommendations),
        };

        Ok(RecommendationResponse {
            recommendations,
            gi_filter_description: self.config.thresholds.describe(risk.tier),
            risk,
            model_used,
            diagnostics,
        })
    }

    fn empty_category_context(&self, found: &CategoryMatch<'_>) -> FailureContext {
        let available: Vec<String> = self
            .catalog
            .categories()
            .into_iter()
            .map(|summary| summary.name)
            .collect();
        FailureContext {
            stage: RecommendationStage::CategoryResolved,
            category_requested: found.requested.clone(),
            mapped_category: found.mapped.clone(),
            candidates_in_category: 0,
            candidates_after_filter: 0,
            risk_tier: None,
            gi_threshold: None,
            reason: format!("no catalog rows for '{}' or '{}'", found.mapped, found.requested.trim()),
            suggestion: format!("Try another category: {}", available.join(", ")),
        }
    }
}

fn format_recommendation(item: &FoodItem, outcome: &ScoreOutcome) -> Recommendation {
    let gi = item.effective_gi();
    let gi_category = GiCategory::from_gi(gi);
    let safety = match gi_category {
        GiCategory::VeryLow => "Sangat aman",
        GiCategory::Low => "Aman",
        _ => "Terbatas",
    };

    Recommendation {
        name: item.name.clone(),
        category: item.category.clone(),
        glycemic_index: gi,
        calories: round_to(item.calories, 1),
        carbohydrates: round_to(item.carbohydrates, 1),
        protein: round_to(item.protein, 1),
        fat: round_to(item.fat, 1),
        fiber: round_to(item.fiber, 1),
        sugar_content: round_to(item.sugar, 1),
        sodium_content: round_to(item.sodium, 1),
        suitable_for_diabetes: item.suitable_for_diabetes,
        rating: round_to((5.0 - f64::from(gi) / 10.0).clamp(0.0, 5.0), 1),
        personalization_score: round_to(outcome.score, 3),
        gi_category,
        diabetes_friendly: gi <= 50,
        reason: format!("GI {gi} - {safety} untuk diabetes"),
        benefits: nutritional_benefits(item),
        model_used: outcome.method,
    }
}

/// Compact nutrition summary, e.g. `IG: 30 | Kalori: 52 | Serat: 2.4g`.
fn nutritional_benefits(item: &FoodItem) -> String {
    let mut parts = vec![
        format!("IG: {}", item.effective_gi()),
        format!("Kalori: {}", item.calories.trunc()),
    ];
    if item.fiber > 0.0 {
        parts.push(format!("Serat: {}g", round_to(item.fiber, 1)));
    }
    if item.protein > 0.0 {
        parts.push(format!("Protein: {}g", round_to(item.protein, 1)));
    }
    if item.carbohydrates > 0.0 {
        parts.push(format!("Karbo: {}g", round_to(item.carbohydrates, 1)));
    }
    if item.fat > 0.0 {
        parts.push(format!("Lemak: {}g", round_to(item.fat, 1)));
    }
    if item.sodium > 0.0 {
        parts.push(format!("Sodium: {}mg", item.sodium.trunc()));
    }
    parts.join(" | ")
}

fn gi_range(recommendations: &[Recommendation]) -> Option<GiRange> {
    let lowest = recommendations.iter().map(|r| r.glycemic_index).min()?;
    let highest = recommendations.iter().map(|r| r.glycemic_index).max()?;
    let total: f64 = recommendations
        .iter()
        .map(|r| f64::from(r.glycemic_index))
        .sum();
    Some(GiRange {
        lowest,
        highest,
        average: round_to(total / recommendations.len() as f64, 1),
    })
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
