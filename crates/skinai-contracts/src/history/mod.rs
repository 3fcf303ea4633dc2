mod store;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::assessment::AssessmentResult;

pub use store::{HistoryStore, HISTORY_CAPACITY, HISTORY_FILE};

/// Metric keys tracked on every recorded assessment, in display order.
pub const SKIN_METRICS: [&str; 6] = [
    "hydration",
    "texture",
    "pigmentation",
    "oiliness",
    "pores",
    "wrinkles",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricReading {
    pub level: i64,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One persisted assessment together with the photo it was made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(flatten)]
    pub assessment: AssessmentResult,
    #[serde(rename = "imageData")]
    pub image_data: String,
    #[serde(rename = "skinConcerns", default)]
    pub skin_concerns: IndexMap<String, MetricReading>,
    #[serde(
        rename = "overallScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub overall_score: Option<i64>,
    #[serde(rename = "skinAge", default, skip_serializing_if = "Option::is_none")]
    pub skin_age: Option<i64>,
}

impl HistoryRecord {
    pub fn new(assessment: AssessmentResult, image_data: impl Into<String>) -> Self {
        Self {
            assessment,
            image_data: image_data.into(),
            skin_concerns: IndexMap::new(),
            overall_score: None,
            skin_age: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.assessment.analysis_id
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};
    use indexmap::IndexMap;

    use super::{HistoryRecord, MetricReading};
    use crate::assessment::{AssessmentResult, PatientInfo, Severity, Urgency, DISCLAIMER};

    pub(crate) fn record(id: &str, condition: &str, timestamp: DateTime<Utc>) -> HistoryRecord {
        HistoryRecord::new(
            AssessmentResult {
                condition: condition.to_string(),
                confidence: 82.0,
                severity: Severity::Mild,
                description: format!("{condition} on the cheek"),
                differential_diagnoses: vec!["Rosacea".to_string()],
                recommendations: vec!["Use a gentle cleanser".to_string()],
                urgency: Urgency::Routine,
                follow_up: Some("4 weeks".to_string()),
                red_flags: None,
                analysis_id: id.to_string(),
                timestamp,
                patient_info: PatientInfo::default(),
                medical_knowledge: None,
                safety_warnings: Vec::new(),
                disclaimer: DISCLAIMER.to_string(),
            },
            "data:image/jpeg;base64,/9j/AA==",
        )
    }

    pub(crate) fn scored(
        mut record: HistoryRecord,
        overall: i64,
        skin_age: i64,
        levels: &[(&str, i64)],
    ) -> HistoryRecord {
        let mut concerns = IndexMap::new();
        for (key, level) in levels {
            concerns.insert(
                (*key).to_string(),
                MetricReading {
                    level: *level,
                    status: "good".to_string(),
                    description: None,
                },
            );
        }
        record.skin_concerns = concerns;
        record.overall_score = Some(overall);
        record.skin_age = Some(skin_age);
        record
    }
}
