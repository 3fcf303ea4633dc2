use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AssessmentError;
use crate::knowledge::ConditionKnowledge;

pub const DISCLAIMER: &str = "This AI analysis is for informational purposes only and should not replace professional medical advice. Always consult with a qualified healthcare provider for proper diagnosis and treatment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PatientSex {
    Male,
    Female,
    Other,
    Unspecified,
}

impl PatientSex {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for PatientSex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientSex {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            "" | "unspecified" | "not specified" => Ok(Self::Unspecified),
            other => Err(format!("unknown patient sex '{other}'")),
        }
    }
}

impl TryFrom<String> for PatientSex {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Severity as reported by the model. `low|medium|high` from older call
/// sites are accepted and folded into the canonical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mild" | "low" | "none" | "normal" => Ok(Self::Mild),
            "moderate" | "medium" => Ok(Self::Moderate),
            "severe" | "high" => Ok(Self::Severe),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Urgency {
    Routine,
    SemiUrgent,
    Urgent,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::SemiUrgent => "semi-urgent",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "routine" | "none" => Ok(Self::Routine),
            "semi-urgent" => Ok(Self::SemiUrgent),
            "urgent" | "immediate" => Ok(Self::Urgent),
            other => Err(format!("unknown urgency '{other}'")),
        }
    }
}

impl TryFrom<String> for Urgency {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Patient context captured alongside a photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<PatientSex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    #[serde(default)]
    pub image_data: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub patient_age: Option<String>,
    #[serde(default)]
    pub patient_sex: Option<PatientSex>,
    #[serde(default)]
    pub medical_history: Option<String>,
}

impl AssessmentRequest {
    pub fn new(image_data: impl Into<String>) -> Self {
        Self {
            image_data: image_data.into(),
            ..Self::default()
        }
    }

    /// Snapshot of the patient fields, with blank strings treated as absent.
    pub fn patient_info(&self) -> PatientInfo {
        PatientInfo {
            age: non_blank(self.patient_age.as_deref()),
            sex: self.patient_sex,
            medical_history: non_blank(self.medical_history.as_deref()),
        }
    }

    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.image_data.trim().is_empty() {
            return Err(AssessmentError::Validation(
                "imageData is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalized assessment, immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub condition: String,
    pub confidence: f64,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub differential_diagnoses: Vec<String>,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flags: Option<Vec<String>>,
    #[serde(rename = "analysisId")]
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "patientInfo", default)]
    pub patient_info: PatientInfo,
    #[serde(
        rename = "medicalKnowledge",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub medical_knowledge: Option<ConditionKnowledge>,
    #[serde(rename = "safetyWarnings", default)]
    pub safety_warnings: Vec<String>,
    pub disclaimer: String,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
