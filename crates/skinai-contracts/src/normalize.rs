use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::assessment::{AssessmentResult, PatientInfo, Severity, Urgency, DISCLAIMER};
use crate::errors::AssessmentError;
use crate::knowledge;

pub const CONFIDENCE_MIN: f64 = 60.0;
pub const CONFIDENCE_MAX: f64 = 95.0;
pub const CONFIDENCE_DEFAULT: f64 = 70.0;

const SERIOUS_CONDITION_WARNING: &str =
    "This analysis suggests a potentially serious condition. Please seek immediate medical attention.";
const RED_FLAG_WARNING: &str = "Red flag symptoms detected. Urgent medical evaluation recommended.";

/// Fields the model is instructed to return.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelAssessment {
    pub condition: String,
    #[serde(default)]
    pub confidence: Option<Value>,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub differential_diagnoses: Option<Vec<String>>,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    #[serde(default)]
    pub follow_up: Option<String>,
    #[serde(default)]
    pub red_flags: Option<Vec<String>>,
}

/// Greedy span from the first `{` to the last `}` in free-form model text.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

pub fn parse_model_output(raw: &str) -> Result<ModelAssessment, AssessmentError> {
    let Some(candidate) = extract_json_object(raw) else {
        return Err(AssessmentError::MalformedResponse(
            "No JSON found in response".to_string(),
        ));
    };
    let value: Value = serde_json::from_str(candidate)
        .map_err(|err| AssessmentError::MalformedResponse(format!("invalid JSON: {err}")))?;
    serde_json::from_value(value).map_err(|err| {
        AssessmentError::MalformedResponse(format!("unexpected assessment shape: {err}"))
    })
}

/// Clamps into the confidence band. Missing, zero or non-numeric input
/// falls back to the default before clamping.
pub fn clamp_confidence(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    let value = parsed
        .filter(|value| value.is_finite() && *value != 0.0)
        .unwrap_or(CONFIDENCE_DEFAULT);
    value.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX)
}

pub fn new_analysis_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("analysis_{}_{}", now.timestamp_millis(), &suffix[..9])
}

pub fn safety_warnings(
    severity: Severity,
    urgency: Urgency,
    red_flags: Option<&[String]>,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if severity == Severity::Severe || urgency == Urgency::Urgent {
        warnings.push(SERIOUS_CONDITION_WARNING.to_string());
    }
    if red_flags.map(|flags| !flags.is_empty()).unwrap_or(false) {
        warnings.push(RED_FLAG_WARNING.to_string());
    }
    warnings
}

/// Builds the final result. Identity fields are always attached here and
/// never taken from the model.
pub fn normalize_assessment(
    parsed: ModelAssessment,
    patient: &PatientInfo,
    analysis_id: String,
    timestamp: DateTime<Utc>,
) -> AssessmentResult {
    let confidence = clamp_confidence(parsed.confidence.as_ref());
    let safety_warnings =
        safety_warnings(parsed.severity, parsed.urgency, parsed.red_flags.as_deref());
    let medical_knowledge = knowledge::lookup(&parsed.condition);
    AssessmentResult {
        condition: parsed.condition,
        confidence,
        severity: parsed.severity,
        description: parsed.description,
        differential_diagnoses: parsed.differential_diagnoses.unwrap_or_default(),
        recommendations: parsed.recommendations,
        urgency: parsed.urgency,
        follow_up: parsed.follow_up,
        red_flags: parsed.red_flags,
        analysis_id,
        timestamp,
        patient_info: patient.clone(),
        medical_knowledge,
        safety_warnings,
        disclaimer: DISCLAIMER.to_string(),
    }
}

pub fn normalize_model_output(
    raw: &str,
    patient: &PatientInfo,
) -> Result<AssessmentResult, AssessmentError> {
    let parsed = parse_model_output(raw)?;
    let now = Utc::now();
    Ok(normalize_assessment(
        parsed,
        patient,
        new_analysis_id(now),
        now,
    ))
}
