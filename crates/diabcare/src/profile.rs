use serde::{Deserialize, Serialize};

/// Validated health measurements for one request.
///
/// Fields are private so a profile can only exist after range checks pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthProfile {
    age: f64,
    bmi: f64,
    glucose: f64,
    insulin: f64,
}

/// Out-of-range or missing measurement. Fatal to the request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("missing user data field: {0}")]
    Missing(&'static str),
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be {bounds}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        bounds: &'static str,
    },
}

impl HealthProfile {
    pub fn new(age: f64, bmi: f64, glucose: f64, insulin: f64) -> Result<Self, ProfileError> {
        check("age", age, "greater than 0 and below 150", |v| v > 0.0 && v < 150.0)?;
        check("bmi", bmi, "between 10 and 60 (exclusive)", |v| v > 10.0 && v < 60.0)?;
        check("glucose", glucose, "between 50 and 500 (exclusive)", |v| v > 50.0 && v < 500.0)?;
        check("insulin", insulin, "at least 0 and below 1000", |v| (0.0..1000.0).contains(&v))?;

        Ok(Self {
            age,
            bmi,
            glucose,
            insulin,
        })
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn glucose(&self) -> f64 {
        self.glucose
    }

    pub fn insulin(&self) -> f64 {
        self.insulin
    }

    /// `[age, bmi, glucose, insulin]`, the user half of the suitability model input.
    pub fn as_array(&self) -> [f64; 4] {
        [self.age, self.bmi, self.glucose, self.insulin]
    }
}

fn check(
    field: &'static str,
    value: f64,
    bounds: &'static str,
    within: impl Fn(f64) -> bool,
) -> Result<(), ProfileError> {
    if !value.is_finite() {
        return Err(ProfileError::NotFinite { field });
    }
    if !within(value) {
        return Err(ProfileError::OutOfRange {
            field,
            value,
            bounds,
        });
    }
    Ok(())
}

/// Unvalidated measurements as they arrive over HTTP or the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub glucose: Option<f64>,
    #[serde(default)]
    pub insulin: Option<f64>,
}

impl ProfileInput {
    pub fn new(age: f64, bmi: f64, glucose: f64, insulin: f64) -> Self {
        Self {
            age: Some(age),
            bmi: Some(bmi),
            glucose: Some(glucose),
            insulin: Some(insulin),
        }
    }
}

impl TryFrom<ProfileInput> for HealthProfile {
    type Error = ProfileError;

    fn try_from(input: ProfileInput) -> Result<Self, Self::Error> {
        HealthProfile::new(
            input.age.ok_or(ProfileError::Missing("age"))?,
            input.bmi.ok_or(ProfileError::Missing("bmi"))?,
            input.glucose.ok_or(ProfileError::Missing("glucose"))?,
            input.insulin.ok_or(ProfileError::Missing("insulin"))?,
        )
    }
}
