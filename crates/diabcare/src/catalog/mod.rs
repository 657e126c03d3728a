//! Read-only food catalog loaded once at startup and shared across requests.

mod domain;
mod mapping;
mod normalizer;
mod parser;

pub use domain::{CategorySummary, FoodItem, NutrientVector, UNKNOWN_GLYCEMIC_INDEX};

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use tracing::info;

/// Failure to build the catalog. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read food catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid food catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("food catalog contains no items")]
    Empty,
}

/// Immutable table of food items queried by category.
#[derive(Debug, Clone)]
pub struct FoodCatalog {
    items: Vec<FoodItem>,
}

/// Outcome of looking up a requested category in the catalog.
#[derive(Debug, Clone)]
pub struct CategoryMatch<'a> {
    pub requested: String,
    pub mapped: String,
    /// Catalog name that produced the rows, if any matched.
    pub matched: Option<String>,
    pub items: Vec<&'a FoodItem>,
}

impl CategoryMatch<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FoodCatalog {
    /// Categories are normalized the same way CSV rows are.
    pub fn from_items(mut items: Vec<FoodItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }
        for item in &mut items {
            item.category = normalizer::normalize_category(&item.category);
        }
        Ok(Self { items })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path.as_ref())?;
        let catalog = Self::from_reader(file)?;
        info!(
            path = %path.as_ref().display(),
            items = catalog.len(),
            "food catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let items = parser::parse_items(reader)?;
        Self::from_items(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    /// Rows whose trimmed category equals `category` exactly.
    pub fn in_category(&self, category: &str) -> Vec<&FoodItem> {
        let wanted = normalizer::normalize_category(category);
        self.items
            .iter()
            .filter(|item| item.category == wanted)
            .collect()
    }

    /// Looks up the mapped catalog name first, then retries with the raw input.
    pub fn resolve(&self, requested: &str) -> CategoryMatch<'_> {
        let raw = normalizer::normalize_category(requested);
        let mapped = mapping::catalog_category_for(requested);

        let mut items = self.in_category(&mapped);
        let mut matched = Some(mapped.clone());
        if items.is_empty() && raw != mapped {
            items = self.in_category(&raw);
            matched = Some(raw);
        }
        if items.is_empty() {
            matched = None;
        }

        CategoryMatch {
            requested: requested.to_string(),
            mapped,
            matched,
            items,
        }
    }

    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for item in &self.items {
            let entry = counts.entry(item.category.as_str()).or_default();
            entry.0 += 1;
            if item.effective_gi() <= 50 {
                entry.1 += 1;
            }
        }

        counts
            .into_iter()
            .map(|(name, (items, low_gi_items))| CategorySummary {
                name: name.to_string(),
                items,
                low_gi_items,
            })
            .collect()
    }
}
