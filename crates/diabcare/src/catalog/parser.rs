use super::domain::FoodItem;
use super::normalizer::normalize_category;
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub(crate) fn parse_items<R: Read>(reader: R) -> Result<Vec<FoodItem>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();

    for record in csv_reader.deserialize::<FoodRow>() {
        let row = record?;
        items.push(row.into_item());
    }

    Ok(items)
}

#[derive(Debug, Deserialize)]
struct FoodRow {
    #[serde(rename = "Food Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "Kategori", default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    #[serde(
        rename = "Glycemic Index",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    glycemic_index: Option<String>,
    #[serde(rename = "Calories", default, deserialize_with = "empty_string_as_none")]
    calories: Option<String>,
    #[serde(
        rename = "Carbohydrates",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    carbohydrates: Option<String>,
    #[serde(rename = "Protein", default, deserialize_with = "empty_string_as_none")]
    protein: Option<String>,
    #[serde(rename = "Fat", default, deserialize_with = "empty_string_as_none")]
    fat: Option<String>,
    #[serde(
        rename = "Fiber Content",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    fiber: Option<String>,
    #[serde(
        rename = "Sodium Content",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    sodium: Option<String>,
    #[serde(
        rename = "Sugar Content",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    sugar: Option<String>,
    #[serde(
        rename = "Suitable for Diabetes",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    suitable_for_diabetes: Option<String>,
}

impl FoodRow {
    fn into_item(self) -> FoodItem {
        FoodItem {
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            category: self
                .category
                .as_deref()
                .map(normalize_category)
                .unwrap_or_default(),
            glycemic_index: self.glycemic_index.as_deref().and_then(parse_glycemic_index),
            calories: amount(&self.calories),
            carbohydrates: amount(&self.carbohydrates),
            protein: amount(&self.protein),
            fat: amount(&self.fat),
            fiber: amount(&self.fiber),
            sodium: amount(&self.sodium),
            sugar: amount(&self.sugar),
            suitable_for_diabetes: self
                .suitable_for_diabetes
                .as_deref()
                .map(parse_flag)
                .unwrap_or(false),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Nutrient amounts default to zero when absent or malformed.
fn amount(value: &Option<String>) -> f64 {
    value
        .as_deref()
        .and_then(parse_number)
        .map(|number| number.max(0.0))
        .unwrap_or(0.0)
}

/// Fractional values round up so an item never slips under a GI threshold.
fn parse_glycemic_index(value: &str) -> Option<u16> {
    parse_number(value)
        .filter(|gi| *gi >= 0.0)
        .map(|gi| gi.ceil().min(f64::from(u16::MAX)) as u16)
}

fn parse_flag(value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "ya" => true,
        other => parse_number(other).map(|n| n >= 1.0).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::{filter_by_tier, GiThresholds, RiskTier};
    use std::io::Cursor;

    const HEADER: &str = "Food Name,Kategori,Glycemic Index,Calories,Carbohydrates,Protein,Fat,Fiber Content,Sodium Content,Sugar Content,Suitable for Diabetes\n";

    #[test]
    fn parses_dataset_columns() {
        let csv = format!("{HEADER}Apel Hijau, Buah ,36,52,14,0.3,0.2,2.4,1,10.4,1\n");
        let items = parse_items(Cursor::new(csv)).expect("csv parses");
        assert_eq!(items.len(), 1);
        let apple = &items[0];
        assert_eq!(apple.name, "Apel Hijau");
        assert_eq!(apple.category, "Buah");
        assert_eq!(apple.glycemic_index, Some(36));
        assert!((apple.fiber - 2.4).abs() < f64::EPSILON);
        assert!(apple.suitable_for_diabetes);
    }

    #[test]
    fn missing_or_malformed_gi_is_left_unknown() {
        let csv = format!("{HEADER}Mystery,Buah,,10,1,1,1,1,1,1,0\nOdd,Buah,n/a,10,1,1,1,1,1,1,0\n");
        let items = parse_items(Cursor::new(csv)).expect("csv parses");
        assert!(items.iter().all(|item| item.glycemic_index.is_none()));
        assert_eq!(items[0].effective_gi(), 100);
    }

    #[test]
    fn fractional_gi_rounds_up_and_bad_amounts_default_to_zero() {
        let csv = format!("{HEADER}Tempe,Protein Nabati,14.2,abc,-3,18,9,1.4,,,\n");
        let items = parse_items(Cursor::new(csv)).expect("csv parses");
        let tempe = &items[0];
        assert_eq!(tempe.glycemic_index, Some(15));
        assert_eq!(tempe.calories, 0.0);
        assert_eq!(tempe.carbohydrates, 0.0);
        assert_eq!(tempe.sodium, 0.0);
        assert!(!tempe.suitable_for_diabetes);
    }

    #[test]
    fn fractional_gi_above_threshold_is_filtered_for_high_risk() {
        let csv = format!(
            "{HEADER}Pir,Buah,35.9,57,15,0.4,0.1,3.1,1,9.8,1\nCeri,Buah,22,63,16,1.1,0.2,2.1,0,12.8,1\n"
        );
        let items = parse_items(Cursor::new(csv)).expect("csv parses");
        assert_eq!(items[0].glycemic_index, Some(36));

        let candidates: Vec<&FoodItem> = items.iter().collect();
        let outcome = filter_by_tier(&candidates, RiskTier::High, &GiThresholds::default())
            .expect("one item passes");
        let names: Vec<&str> = outcome.survivors.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Ceri"]);

        let exact = parse_glycemic_index("35.0");
        assert_eq!(exact, Some(35));
    }

    #[test]
    fn flags_accept_textual_and_numeric_forms() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1.0"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("no"));
    }
}
