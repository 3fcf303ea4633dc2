use serde_json::json;
use skinai_contracts::errors::AssessmentError;

use super::{GenerationRequest, GenerationResponse, GenerativeProvider};

/// Offline provider with canned replies. Photo requests get an assessment
/// shaped like a real model answer; text requests get a fixed chat reply.
pub struct DryrunProvider;

const DRYRUN_ASSESSMENT: &str = r#"Dry-run assessment follows.
{
  "condition": "Normal skin",
  "confidence": 75,
  "severity": "mild",
  "description": "Offline placeholder assessment. No model looked at this photo.",
  "differential_diagnoses": [],
  "recommendations": [
    "Configure a Gemini API key for a real assessment",
    "Keep a regular skincare routine with daily sun protection"
  ],
  "urgency": "routine",
  "follow_up": "As needed",
  "red_flags": []
}"#;

const DRYRUN_CHAT_REPLY: &str = "This is an offline placeholder reply. Configure a Gemini API key to talk to the health assistant. For any skin concern that worries you, please consult a dermatologist.";

impl GenerativeProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, AssessmentError> {
        let text = if request.image.is_some() {
            DRYRUN_ASSESSMENT
        } else {
            DRYRUN_CHAT_REPLY
        };
        Ok(GenerationResponse {
            text: text.to_string(),
            provider_response: json!({
                "status": "ok",
                "model": request.model,
            }),
        })
    }
}
