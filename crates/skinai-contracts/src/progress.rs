use serde::{Deserialize, Serialize};

use crate::history::HistoryRecord;

/// Metric changes within this many points either way are not reported.
pub const METRIC_DEAD_ZONE: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub before_id: String,
    pub after_id: String,
    pub days_difference: i64,
    pub improvements: Vec<String>,
    pub concerns: Vec<String>,
    /// `None` when either record lacks an overall score.
    pub overall_progress: Option<i64>,
}

/// Diffs two records ordered by time. Pure; recomputed on every call.
pub fn compare(before: &HistoryRecord, after: &HistoryRecord) -> ComparisonResult {
    let days_difference = (after.assessment.timestamp - before.assessment.timestamp).num_days();
    let mut improvements = Vec::new();
    let mut concerns = Vec::new();

    for (metric, before_reading) in &before.skin_concerns {
        let Some(after_reading) = after.skin_concerns.get(metric) else {
            continue;
        };
        let delta = after_reading.level - before_reading.level;
        if delta > METRIC_DEAD_ZONE {
            improvements.push(format!("{} improved by {delta} points", capitalize(metric)));
        } else if delta < -METRIC_DEAD_ZONE {
            concerns.push(format!(
                "{} decreased by {} points",
                capitalize(metric),
                delta.abs()
            ));
        }
    }

    let overall_progress = match (before.overall_score, after.overall_score) {
        (Some(before_score), Some(after_score)) => Some(after_score - before_score),
        _ => None,
    };
    match overall_progress {
        Some(delta) if delta > 0 => {
            improvements.push(format!("Overall skin score improved by {delta} points"));
        }
        Some(delta) if delta < 0 => {
            concerns.push(format!(
                "Overall skin score decreased by {} points",
                delta.abs()
            ));
        }
        _ => {}
    }

    if let (Some(before_age), Some(after_age)) = (before.skin_age, after.skin_age) {
        let age_delta = after_age - before_age;
        if age_delta < 0 {
            improvements.push(format!("Skin appears {} years younger", age_delta.abs()));
        } else if age_delta > 1 {
            concerns.push(format!("Skin aging has progressed by {age_delta} years"));
        }
    }

    ComparisonResult {
        before_id: before.id().to_string(),
        after_id: after.id().to_string(),
        days_difference,
        improvements,
        concerns,
        overall_progress,
    }
}

/// Adjacent pairs of a newest-first list, each compared older to newer.
pub fn consecutive_comparisons(records: &[HistoryRecord]) -> Vec<ComparisonResult> {
    records
        .windows(2)
        .map(|pair| compare(&pair[1], &pair[0]))
        .collect()
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{compare, consecutive_comparisons};
    use crate::history::fixtures::{record, scored};
    use crate::history::HistoryRecord;

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap() + Duration::days(offset)
    }

    fn snapshot(id: &str, offset: i64, overall: i64, age: i64, levels: &[(&str, i64)]) -> HistoryRecord {
        scored(record(id, "Acne", day(offset)), overall, age, levels)
    }

    #[test]
    fn overall_gain_over_ten_days() {
        let before = snapshot("before", 0, 70, 30, &[]);
        let after = snapshot("after", 10, 82, 30, &[]);
        let result = compare(&before, &after);
        assert_eq!(result.days_difference, 10);
        assert_eq!(result.overall_progress, Some(12));
        assert!(result
            .improvements
            .contains(&"Overall skin score improved by 12 points".to_string()));
        assert!(result.concerns.is_empty());
        assert_eq!(result.before_id, "before");
        assert_eq!(result.after_id, "after");
    }

    #[test]
    fn dead_zone_is_inclusive_at_five() {
        let before = snapshot("b", 0, 70, 30, &[("hydration", 70), ("texture", 70)]);
        let after = snapshot("a", 1, 70, 30, &[("hydration", 75), ("texture", 65)]);
        let result = compare(&before, &after);
        assert!(result.improvements.is_empty());
        assert!(result.concerns.is_empty());
        assert_eq!(result.overall_progress, Some(0));
    }

    #[test]
    fn six_points_either_way_is_reported() {
        let before = snapshot("b", 0, 80, 30, &[("hydration", 70), ("pores", 70)]);
        let after = snapshot("a", 3, 79, 30, &[("hydration", 76), ("pores", 64)]);
        let result = compare(&before, &after);
        assert_eq!(result.improvements, vec!["Hydration improved by 6 points"]);
        assert_eq!(
            result.concerns,
            vec![
                "Pores decreased by 6 points",
                "Overall skin score decreased by 1 points"
            ]
        );
    }

    #[test]
    fn skin_age_rules() {
        let younger = compare(
            &snapshot("b", 0, 70, 35, &[]),
            &snapshot("a", 1, 70, 32, &[]),
        );
        assert_eq!(younger.improvements, vec!["Skin appears 3 years younger"]);

        let one_year = compare(
            &snapshot("b", 0, 70, 35, &[]),
            &snapshot("a", 1, 70, 36, &[]),
        );
        assert!(one_year.concerns.is_empty());

        let older = compare(
            &snapshot("b", 0, 70, 35, &[]),
            &snapshot("a", 1, 70, 38, &[]),
        );
        assert_eq!(older.concerns, vec!["Skin aging has progressed by 3 years"]);
    }

    #[test]
    fn metrics_missing_from_either_side_are_skipped() {
        let before = snapshot("b", 0, 70, 30, &[("oiliness", 60)]);
        let after = snapshot("a", 1, 70, 30, &[("wrinkles", 95)]);
        let result = compare(&before, &after);
        assert!(result.improvements.is_empty());

        let unscored = compare(&record("x", "Acne", day(0)), &record("y", "Acne", day(2)));
        assert_eq!(unscored.overall_progress, None);
        assert_eq!(unscored.days_difference, 2);
    }

    #[test]
    fn comparison_is_idempotent() -> anyhow::Result<()> {
        let before = snapshot("b", 0, 61, 40, &[("texture", 60), ("wrinkles", 90)]);
        let after = snapshot("a", 7, 88, 29, &[("texture", 90), ("wrinkles", 70)]);
        let first = serde_json::to_string(&compare(&before, &after))?;
        let second = serde_json::to_string(&compare(&before, &after))?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn consecutive_pairs_run_older_to_newer() {
        let newest_first = vec![
            snapshot("c", 20, 90, 30, &[]),
            snapshot("b", 10, 80, 30, &[]),
            snapshot("a", 0, 70, 30, &[]),
        ];
        let comparisons = consecutive_comparisons(&newest_first);
        assert_eq!(comparisons.len(), 2);
        assert_eq!(comparisons[0].before_id, "b");
        assert_eq!(comparisons[0].after_id, "c");
        assert_eq!(comparisons[1].before_id, "a");
        assert_eq!(comparisons[1].overall_progress, Some(10));
        assert!(consecutive_comparisons(&newest_first[..1]).is_empty());
    }
}
