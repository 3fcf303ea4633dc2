use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use skinai_contracts::history::{HistoryRecord, MetricReading, SKIN_METRICS};

use crate::image::image_bytes;

/// Cosmetic metric profile attached to recorded assessments.
///
/// No model produces these numbers. They are derived from the photo digest so
/// that the same photo always yields the same profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinProfile {
    pub skin_concerns: IndexMap<String, MetricReading>,
    pub overall_score: i64,
    pub skin_age: i64,
}

pub fn skin_profile(image_data: &str) -> SkinProfile {
    let mut hasher = Sha256::new();
    hasher.update(image_bytes(image_data));
    let digest = hasher.finalize();

    let mut skin_concerns = IndexMap::new();
    let mut total = 0i64;
    for (idx, metric) in SKIN_METRICS.iter().enumerate() {
        let level = 60 + i64::from(digest[idx] % 40);
        total += level;
        skin_concerns.insert(
            (*metric).to_string(),
            MetricReading {
                level,
                status: status_for(level).to_string(),
                description: Some(describe(metric, level).to_string()),
            },
        );
    }

    let overall_score = (total as f64 / SKIN_METRICS.len() as f64).round() as i64;
    let skin_age = (25 + i64::from(digest[SKIN_METRICS.len()] % 20)).clamp(18, 65);

    SkinProfile {
        skin_concerns,
        overall_score,
        skin_age,
    }
}

pub fn attach_skin_profile(record: &mut HistoryRecord) {
    let profile = skin_profile(&record.image_data);
    record.skin_concerns = profile.skin_concerns;
    record.overall_score = Some(profile.overall_score);
    record.skin_age = Some(profile.skin_age);
}

fn status_for(level: i64) -> &'static str {
    if level >= 85 {
        "excellent"
    } else if level >= 70 {
        "good"
    } else {
        "needs attention"
    }
}

fn describe(metric: &str, level: i64) -> &'static str {
    let (high, mid, low) = match metric {
        "hydration" => (
            "Well hydrated skin",
            "Moderately hydrated",
            "Needs more moisture",
        ),
        "texture" => (
            "Smooth, even texture",
            "Some texture irregularities",
            "Rough or uneven texture",
        ),
        "pigmentation" => (
            "Even skin tone",
            "Mild discoloration",
            "Noticeable pigmentation issues",
        ),
        "oiliness" => (
            "Well-balanced oil production",
            "Slightly oily areas",
            "Excess oil production",
        ),
        "pores" => (
            "Fine, barely visible pores",
            "Moderately visible pores",
            "Enlarged or clogged pores",
        ),
        _ => (
            "Minimal signs of aging",
            "Few fine lines",
            "Visible signs of aging",
        ),
    };
    if level >= 80 {
        high
    } else if level >= 65 {
        mid
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use skinai_contracts::history::SKIN_METRICS;

    use super::{skin_profile, status_for};

    #[test]
    fn same_photo_same_profile() {
        let first = skin_profile("data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==");
        let second = skin_profile("data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==");
        assert_eq!(first, second);
        let other = skin_profile("data:image/jpeg;base64,/9j/4AAQSkZJRgABAg==");
        assert_ne!(first, other);
    }

    #[test]
    fn profile_stays_in_range() {
        for seed in 0..32 {
            let profile = skin_profile(&format!("payload-{seed}"));
            assert_eq!(profile.skin_concerns.len(), SKIN_METRICS.len());
            let keys: Vec<&str> = profile.skin_concerns.keys().map(String::as_str).collect();
            assert_eq!(keys, SKIN_METRICS.to_vec());
            for reading in profile.skin_concerns.values() {
                assert!((60..=99).contains(&reading.level));
                assert_eq!(reading.status, status_for(reading.level));
            }
            assert!((60..=99).contains(&profile.overall_score));
            assert!((25..=44).contains(&profile.skin_age));
        }
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(status_for(85), "excellent");
        assert_eq!(status_for(84), "good");
        assert_eq!(status_for(70), "good");
        assert_eq!(status_for(69), "needs attention");
    }
}
