use chrono::{DateTime, FixedOffset, Offset, Utc};
use md5::{Digest, Md5};
use serde::Serialize;

use crate::profile::HealthProfile;

/// Hour-granular bucket (`YYYYMMDDHH`) in a fixed timezone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TimeBucket(String);

impl TimeBucket {
    pub fn at(instant: DateTime<Utc>, utc_offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self(
            instant
                .with_timezone(&offset)
                .format("%Y%m%d%H")
                .to_string(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Canonical string hashed into the seed.
pub fn seed_input(profile: &HealthProfile, category: &str, bucket: &TimeBucket) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}",
        profile.age(),
        profile.bmi(),
        profile.glucose(),
        profile.insulin(),
        category,
        bucket.as_str()
    )
}

/// First 32 bits (big-endian, i.e. the first eight hex digits) of the MD5 of [`seed_input`].
pub fn derive_seed(profile: &HealthProfile, category: &str, bucket: &TimeBucket) -> u32 {
    let digest = Md5::digest(seed_input(profile, category, bucket).as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
