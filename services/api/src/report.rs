use crate::infra::build_components;
use chrono::{DateTime, Utc};
use clap::Args;
use diabcare::catalog::{CategorySummary, FoodCatalog};
use diabcare::config::AppConfig;
use diabcare::error::AppError;
use diabcare::profile::HealthProfile;
use diabcare::recommendation::{RecommendationRequest, RecommendationResponse};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Food category, e.g. "Buah" or "Protein Hewani"
    #[arg(long)]
    pub(crate) category: String,
    /// Age in years
    #[arg(long)]
    pub(crate) age: f64,
    /// Body mass index
    #[arg(long)]
    pub(crate) bmi: f64,
    /// Fasting glucose (mg/dL)
    #[arg(long)]
    pub(crate) glucose: f64,
    /// Insulin (µU/mL)
    #[arg(long)]
    pub(crate) insulin: f64,
    /// Number of foods to return (defaults to DIABCARE_DEFAULT_TOP_N)
    #[arg(long)]
    pub(crate) top_n: Option<usize>,
    /// Evaluate as of this RFC 3339 instant instead of now
    #[arg(long, value_parser = parse_instant)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Catalog CSV overriding DIABCARE_FOOD_CSV
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CategoriesArgs {
    /// Catalog CSV overriding DIABCARE_FOOD_CSV
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let RecommendArgs {
        category,
        age,
        bmi,
        glucose,
        insulin,
        top_n,
        at,
        csv,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(csv) = csv {
        config.models.food_csv = csv;
    }

    let profile = HealthProfile::new(age, bmi, glucose, insulin)?;
    let components = build_components(&config)?;
    let request = RecommendationRequest {
        category,
        profile,
        top_n,
    };
    let at = at.unwrap_or_else(Utc::now);

    let response = components.engine.recommend(&request, at)?;
    print!("{}", render_recommendations(&request, &response, at));
    Ok(())
}

pub(crate) fn run_categories(args: CategoriesArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let path = args.csv.unwrap_or(config.models.food_csv);
    let catalog = FoodCatalog::from_path(&path)?;

    print!("{}", render_categories(&catalog.categories(), catalog.len()));
    Ok(())
}

pub(crate) fn render_recommendations(
    request: &RecommendationRequest,
    response: &RecommendationResponse,
    at: DateTime<Utc>,
) -> String {
    let profile = &request.profile;
    let diagnostics = &response.diagnostics;
    let mut out = String::new();

    let _ = writeln!(out, "Food recommendations for '{}'", request.category);
    let _ = writeln!(
        out,
        "Profile: age {} | BMI {} | glucose {} | insulin {}",
        profile.age(),
        profile.bmi(),
        profile.glucose(),
        profile.insulin()
    );
    let _ = writeln!(
        out,
        "Risk: {} ({} points, source {:?})",
        response.risk.tier.label(),
        response.risk.points,
        response.risk.source
    );
    let _ = writeln!(out, "Filter: {}", response.gi_filter_description);
    let _ = writeln!(
        out,
        "Evaluated at {} (bucket {}, seed {})",
        at.to_rfc3339(),
        diagnostics.time_bucket.as_str(),
        diagnostics.seed
    );

    let _ = writeln!(
        out,
        "\n{} of {} eligible foods ({} in category)",
        response.recommendations.len(),
        diagnostics.candidates_after_filter,
        diagnostics.candidates_in_category
    );
    for (position, rec) in response.recommendations.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<28} GI {:>3}  rating {:.1}  score {:.3}",
            position + 1,
            rec.name,
            rec.glycemic_index,
            rec.rating,
            rec.personalization_score
        );
        let _ = writeln!(out, "     {}", rec.reason);
        let _ = writeln!(out, "     {}", rec.benefits);
    }

    if let Some(range) = diagnostics.gi_range {
        let _ = writeln!(
            out,
            "\nGI range: {}-{} (average {:.1})",
            range.lowest, range.highest, range.average
        );
    }
    if diagnostics.scoring_fallbacks > 0 {
        let _ = writeln!(
            out,
            "Scoring fell back to rules for {} foods",
            diagnostics.scoring_fallbacks
        );
    }

    out
}

pub(crate) fn render_categories(categories: &[CategorySummary], total_items: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} categories, {} foods",
        categories.len(),
        total_items
    );
    for category in categories {
        let _ = writeln!(
            out,
            "  {:<20} {:>4} foods, {:>4} with GI ≤ 50",
            category.name, category.items, category.low_gi_items
        );
    }
    out
}
