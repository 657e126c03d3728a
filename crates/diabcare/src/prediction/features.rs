use std::collections::BTreeMap;

use super::ModelError;
use crate::profile::HealthProfile;

/// Order used by the four-feature classifier when the artifact does not specify one.
pub const DEFAULT_FEATURE_ORDER: [&str; 4] = ["Glucose", "Insulin", "BMI", "Age"];

/// Thirteen-feature contract of the engineered classifier.
pub const ENGINEERED_FEATURE_ORDER: [&str; 13] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
    "BMI_Category",
    "Age_Category",
    "Glucose_Category",
    "BMI_Age_Ratio",
    "Glucose_BMI_Ratio",
];

// Population defaults for measurements the intake form does not collect.
const DEFAULT_PREGNANCIES: f64 = 0.0;
const DEFAULT_BLOOD_PRESSURE: f64 = 70.0;
const DEFAULT_SKIN_THICKNESS: f64 = 20.0;
const DEFAULT_PEDIGREE: f64 = 0.3;

/// Every named feature a classifier artifact may ask for.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: BTreeMap<&'static str, f64>,
}

impl FeatureVector {
    pub fn from_profile(profile: &HealthProfile) -> Self {
        let (age, bmi, glucose, insulin) = (
            profile.age(),
            profile.bmi(),
            profile.glucose(),
            profile.insulin(),
        );

        let bmi_category = if bmi < 18.5 {
            0.0
        } else if bmi < 25.0 {
            1.0
        } else if bmi < 30.0 {
            2.0
        } else {
            3.0
        };
        let age_category = if age < 30.0 {
            0.0
        } else if age < 50.0 {
            1.0
        } else {
            2.0
        };
        let glucose_category = if glucose < 100.0 {
            0.0
        } else if glucose < 125.0 {
            1.0
        } else {
            2.0
        };

        let values = BTreeMap::from([
            ("Pregnancies", DEFAULT_PREGNANCIES),
            ("Glucose", glucose),
            ("BloodPressure", DEFAULT_BLOOD_PRESSURE),
            ("SkinThickness", DEFAULT_SKIN_THICKNESS),
            ("Insulin", insulin),
            ("BMI", bmi),
            ("DiabetesPedigreeFunction", DEFAULT_PEDIGREE),
            ("Age", age),
            ("BMI_Category", bmi_category),
            ("Age_Category", age_category),
            ("Glucose_Category", glucose_category),
            ("BMI_Age_Ratio", bmi / age),
            ("Glucose_BMI_Ratio", glucose / bmi),
        ]);

        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Values laid out in `order`, failing on names the vector does not know.
    pub fn ordered<S: AsRef<str>>(&self, order: &[S]) -> Result<Vec<f64>, ModelError> {
        order
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .ok_or_else(|| ModelError::UnknownFeature(name.as_ref().to_string()))
            })
            .collect()
    }

    pub fn is_known(name: &str) -> bool {
        ENGINEERED_FEATURE_ORDER.contains(&name)
    }
}
