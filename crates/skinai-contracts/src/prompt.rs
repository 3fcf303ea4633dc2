use crate::assessment::PatientInfo;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const NO_HISTORY: &str = "No significant history provided";

const OUTPUT_SCHEMA: &str = r#"{
  "condition": "primary_diagnosis_name",
  "confidence": 85,
  "severity": "mild|moderate|severe",
  "description": "Detailed description of findings and characteristics observed",
  "differential_diagnoses": ["alternative_diagnosis_1", "alternative_diagnosis_2"],
  "recommendations": [
    "Specific treatment recommendation 1",
    "Specific treatment recommendation 2",
    "Specific care instruction 3"
  ],
  "urgency": "routine|semi-urgent|urgent",
  "follow_up": "Recommended timeframe for follow-up care",
  "red_flags": ["any concerning features that require immediate attention"]
}"#;

const GUIDELINES: &str = "IMPORTANT GUIDELINES:
- Focus on visible characteristics like color, texture, size, distribution
- Consider patient age and sex in your assessment
- Provide realistic confidence levels (60-95%)
- Be specific with recommendations
- Include both immediate care and long-term management
- Flag any concerning features that need urgent attention
- If the image shows normal skin, indicate that clearly";

/// Renders the dermatology instruction sent alongside the photo.
///
/// Absent patient fields are replaced with fixed placeholders so the model
/// always sees the same three lines of context.
pub fn build_assessment_prompt(patient: &PatientInfo) -> String {
    let age = patient.age.as_deref().unwrap_or(NOT_SPECIFIED);
    let sex = patient
        .sex
        .map(|sex| sex.as_str())
        .filter(|sex| *sex != "unspecified")
        .unwrap_or(NOT_SPECIFIED);
    let history = patient.medical_history.as_deref().unwrap_or(NO_HISTORY);

    format!(
        "You are an expert dermatologist AI assistant. Analyze this skin image and provide a detailed medical assessment.

PATIENT INFORMATION:
- Age: {age}
- Sex: {sex}
- Medical History: {history}

ANALYSIS REQUIREMENTS:
Please provide your analysis in this EXACT JSON format:
{OUTPUT_SCHEMA}

{GUIDELINES}

Analyze the image thoroughly and respond with only the JSON object."
    )
}

#[cfg(test)]
mod tests {
    use crate::assessment::{PatientInfo, PatientSex};

    use super::{build_assessment_prompt, NOT_SPECIFIED, NO_HISTORY};

    #[test]
    fn empty_patient_uses_placeholders() {
        let prompt = build_assessment_prompt(&PatientInfo::default());
        assert!(prompt.contains(&format!("- Age: {NOT_SPECIFIED}\n")));
        assert!(prompt.contains(&format!("- Sex: {NOT_SPECIFIED}\n")));
        assert!(prompt.contains(&format!("- Medical History: {NO_HISTORY}\n")));
    }

    #[test]
    fn present_fields_are_interpolated() {
        let prompt = build_assessment_prompt(&PatientInfo {
            age: Some("34".to_string()),
            sex: Some(PatientSex::Other),
            medical_history: Some("Psoriasis since 2019".to_string()),
        });
        assert!(prompt.contains("- Age: 34\n"));
        assert!(prompt.contains("- Sex: other\n"));
        assert!(prompt.contains("- Medical History: Psoriasis since 2019\n"));
        assert!(!prompt.contains(NO_HISTORY));
    }

    #[test]
    fn unspecified_sex_renders_placeholder() {
        let prompt = build_assessment_prompt(&PatientInfo {
            sex: Some(PatientSex::Unspecified),
            ..PatientInfo::default()
        });
        assert!(prompt.contains("- Sex: Not specified\n"));
    }

    #[test]
    fn prompt_fixes_schema_and_confidence_band() {
        let prompt = build_assessment_prompt(&PatientInfo::default());
        for field in [
            "\"condition\"",
            "\"confidence\"",
            "\"severity\"",
            "\"description\"",
            "\"differential_diagnoses\"",
            "\"recommendations\"",
            "\"urgency\"",
            "\"follow_up\"",
            "\"red_flags\"",
        ] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("(60-95%)"));
        assert!(prompt.contains("normal skin"));
        assert!(prompt.ends_with("respond with only the JSON object."));
    }
}
