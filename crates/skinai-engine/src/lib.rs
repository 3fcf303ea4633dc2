pub mod config;
pub mod image;
pub mod placeholder;
pub mod profile_client;
pub mod providers;

use chrono::Utc;
use serde_json::{json, Value};
use skinai_contracts::assessment::{AssessmentRequest, AssessmentResult};
use skinai_contracts::chat::{render_chat_prompt, ChatReply, ChatRequest, CHAT_CONTEXT_WINDOW};
use skinai_contracts::errors::AssessmentError;
use skinai_contracts::events::{
    EventWriter, ASSESSMENT_COMPLETED, ASSESSMENT_FAILED, ASSESSMENT_STARTED,
    CHAT_COMPLETED, CHAT_FAILED,
};
use skinai_contracts::history::HistoryRecord;
use skinai_contracts::models::{
    ModelSelection, ModelSelector, ModelSpec, CAPABILITY_TEXT, CAPABILITY_VISION,
};
use skinai_contracts::normalize::normalize_model_output;
use skinai_contracts::prompt::build_assessment_prompt;

use crate::config::{EngineConfig, ASSESSMENT_GENERATION, CHAT_GENERATION};
use crate::image::{image_digest, split_data_uri};
use crate::placeholder::attach_skin_profile;
use crate::providers::{
    default_provider_registry, GenerationRequest, GenerativeProvider, ProviderRegistry,
};

/// Runs assessments and chat turns against the configured providers.
///
/// Each call makes at most one upstream request and keeps no state between
/// calls, so a single engine can be shared across threads.
pub struct AssessmentEngine {
    config: EngineConfig,
    providers: ProviderRegistry,
    model_selector: ModelSelector,
    assessment_model: String,
    chat_model: String,
    events: Option<EventWriter>,
}

impl AssessmentEngine {
    pub fn from_config(config: EngineConfig) -> anyhow::Result<Self> {
        let providers = default_provider_registry(&config)?;
        Ok(Self::with_providers(config, providers))
    }

    pub fn with_providers(config: EngineConfig, providers: ProviderRegistry) -> Self {
        let mut model_selector = ModelSelector::default();
        for name in [&config.assessment_model, &config.chat_model] {
            model_selector.ensure_known(name, &[CAPABILITY_VISION, CAPABILITY_TEXT]);
        }
        Self {
            assessment_model: config.assessment_model.clone(),
            chat_model: config.chat_model.clone(),
            config,
            providers,
            model_selector,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn assessment_model(&self) -> &str {
        &self.assessment_model
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// `None` restores the configured model. Unknown names are taken to be Gemini models.
    pub fn set_assessment_model(&mut self, model: Option<String>) {
        self.assessment_model = model.unwrap_or_else(|| self.config.assessment_model.clone());
        self.model_selector
            .ensure_known(&self.assessment_model, &[CAPABILITY_VISION, CAPABILITY_TEXT]);
    }

    pub fn set_chat_model(&mut self, model: Option<String>) {
        self.chat_model = model.unwrap_or_else(|| self.config.chat_model.clone());
        self.model_selector
            .ensure_known(&self.chat_model, &[CAPABILITY_VISION, CAPABILITY_TEXT]);
    }

    pub fn models(&self) -> Vec<ModelSpec> {
        self.model_selector.registry().list().cloned().collect()
    }

    /// Builds the prompt, sends one vision request and normalizes the reply.
    pub fn assess(&self, request: &AssessmentRequest) -> Result<AssessmentResult, AssessmentError> {
        request.validate()?;
        let patient = request.patient_info();
        let image = split_data_uri(&request.image_data);
        let (selection, provider) = self.resolve(&self.assessment_model, CAPABILITY_VISION)?;

        self.emit(
            ASSESSMENT_STARTED,
            json!({
                "model": selection.model.name,
                "provider": provider.name(),
                "image_sha256": image_digest(&request.image_data),
                "mime_type": image.mime_type,
                "patient_info": patient,
            }),
        );

        let generation = GenerationRequest {
            model: selection.model.name.clone(),
            prompt: build_assessment_prompt(&patient),
            image: Some(image),
            settings: ASSESSMENT_GENERATION,
        };
        let outcome = provider
            .generate(&generation)
            .and_then(|response| normalize_model_output(&response.text, &patient));

        match &outcome {
            Ok(result) => {
                tracing::info!(
                    analysis_id = %result.analysis_id,
                    condition = %result.condition,
                    severity = %result.severity,
                    urgency = %result.urgency,
                    "assessment completed"
                );
                self.emit(
                    ASSESSMENT_COMPLETED,
                    json!({
                        "model": selection.model.name,
                        "analysis_id": result.analysis_id,
                        "condition": result.condition,
                        "confidence": result.confidence,
                        "severity": result.severity,
                        "urgency": result.urgency,
                        "safety_warnings": result.safety_warnings.len(),
                        "fallback_reason": selection.fallback_reason,
                    }),
                );
            }
            Err(err) => {
                tracing::warn!(kind = err.kind().code(), "assessment failed: {err}");
                self.emit(
                    ASSESSMENT_FAILED,
                    json!({
                        "model": selection.model.name,
                        "error_kind": err.kind().code(),
                        "error": err.to_string(),
                    }),
                );
            }
        }
        outcome
    }

    /// Relays one chat turn. The reply text is returned verbatim.
    pub fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AssessmentError> {
        request.validate()?;
        let (selection, provider) = self.resolve(&self.chat_model, CAPABILITY_TEXT)?;
        let context_turns = request.conversation_history.len().min(CHAT_CONTEXT_WINDOW);
        let generation = GenerationRequest {
            model: selection.model.name.clone(),
            prompt: render_chat_prompt(&request.conversation_history, &request.message),
            image: None,
            settings: CHAT_GENERATION,
        };

        match provider.generate(&generation) {
            Ok(response) => {
                tracing::info!(model = %selection.model.name, context_turns, "chat reply received");
                self.emit(
                    CHAT_COMPLETED,
                    json!({
                        "model": selection.model.name,
                        "context_turns": context_turns,
                        "reply_chars": response.text.chars().count(),
                    }),
                );
                Ok(ChatReply {
                    response: response.text,
                    timestamp: Utc::now(),
                })
            }
            Err(err) => {
                tracing::warn!(kind = err.kind().code(), "chat relay failed: {err}");
                self.emit(
                    CHAT_FAILED,
                    json!({
                        "model": selection.model.name,
                        "error_kind": err.kind().code(),
                        "error": err.to_string(),
                    }),
                );
                Err(err)
            }
        }
    }

    fn resolve(
        &self,
        requested: &str,
        capability: &str,
    ) -> Result<(ModelSelection, &dyn GenerativeProvider), AssessmentError> {
        let selection = self
            .model_selector
            .select(requested, capability)
            .map_err(|message| AssessmentError::Upstream {
                status: None,
                body: message,
            })?;
        if let Some(reason) = selection.fallback_reason.as_deref() {
            tracing::warn!(model = %selection.model.name, "{reason}");
        }
        let Some(provider) = self.providers.get(&selection.model.provider) else {
            return Err(AssessmentError::NotConfigured(selection.model.provider.clone()));
        };
        Ok((selection, provider))
    }

    fn emit(&self, event_type: &str, payload: Value) {
        if let Some(events) = &self.events {
            events.record(event_type, payload);
        }
    }
}

/// History entry for a finished assessment, with the placeholder skin profile.
pub fn history_record(result: &AssessmentResult, image_data: &str) -> HistoryRecord {
    let mut record = HistoryRecord::new(result.clone(), image_data);
    attach_skin_profile(&mut record);
    record
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};
    use skinai_contracts::assessment::{AssessmentRequest, PatientSex, Severity};
    use skinai_contracts::chat::{ChatMessage, ChatRequest, ChatRole};
    use skinai_contracts::errors::{AssessmentError, ErrorKind};
    use skinai_contracts::events::EventWriter;

    use super::{history_record, AssessmentEngine};
    use crate::config::EngineConfig;
    use crate::providers::{
        DryrunProvider, GenerationRequest, GenerationResponse, GenerativeProvider,
        ProviderRegistry,
    };

    const PHOTO: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, AssessmentError>>>,
        seen: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    impl GenerativeProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "gemini"
        }

        fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, AssessmentError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            let next = self
                .replies
                .lock()
                .map_err(|_| AssessmentError::Upstream {
                    status: None,
                    body: "script lock poisoned".to_string(),
                })?
                .remove(0);
            next.map(|text| GenerationResponse {
                text,
                provider_response: Value::Null,
            })
        }
    }

    fn scripted(
        replies: Vec<Result<String, AssessmentError>>,
    ) -> (AssessmentEngine, Arc<Mutex<Vec<GenerationRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut providers = ProviderRegistry::new();
        providers.register(DryrunProvider);
        providers.register(ScriptedProvider {
            replies: Mutex::new(replies),
            seen: Arc::clone(&seen),
        });
        (
            AssessmentEngine::with_providers(EngineConfig::default(), providers),
            seen,
        )
    }

    fn seen_requests(seen: &Arc<Mutex<Vec<GenerationRequest>>>) -> Vec<GenerationRequest> {
        seen.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn journal_types(path: &std::path::Path) -> anyhow::Result<Vec<Value>> {
        let raw = fs::read_to_string(path)?;
        Ok(raw
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .collect())
    }

    #[test]
    fn assess_sends_one_vision_request_and_normalizes() -> anyhow::Result<()> {
        let reply = json!({
            "condition": "Acne",
            "confidence": 99,
            "severity": "moderate",
            "description": "Inflamed papules on the forehead.",
            "differential_diagnoses": ["Rosacea"],
            "recommendations": ["Benzoyl peroxide wash"],
            "urgency": "routine",
            "follow_up": "6 weeks",
            "red_flags": []
        });
        let (engine, seen) = scripted(vec![Ok(format!("```json\n{reply}\n```"))]);
        let temp = tempfile::tempdir()?;
        let journal = temp.path().join("events.jsonl");
        let engine = engine.with_events(EventWriter::new(&journal, "test-session"));

        let mut request = AssessmentRequest::new(PHOTO);
        request.patient_age = Some("27".to_string());
        request.patient_sex = Some(PatientSex::Female);
        let result = engine.assess(&request)?;

        assert_eq!(result.condition, "Acne");
        assert_eq!(result.confidence, 95.0);
        assert_eq!(result.severity, Severity::Moderate);
        assert_eq!(result.patient_info.age.as_deref(), Some("27"));
        assert!(result.medical_knowledge.is_some());

        let requests = seen_requests(&seen);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-1.5-pro");
        assert!(requests[0].prompt.contains("- Age: 27\n"));
        assert!(requests[0].prompt.contains("- Sex: female\n"));
        let image = requests[0].image.clone().unwrap_or_else(|| panic!("image missing"));
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgoAAAANSUhEUg==");

        let events = journal_types(&journal)?;
        assert_eq!(events[0]["type"], json!("assessment_started"));
        assert_eq!(events[1]["type"], json!("assessment_completed"));
        assert_eq!(events[1]["analysis_id"], json!(result.analysis_id));
        let raw = fs::read_to_string(&journal)?;
        assert!(!raw.contains("iVBORw0KGgo"));
        assert_eq!(events[0]["image_sha256"].as_str().map(str::len), Some(64));
        Ok(())
    }

    #[test]
    fn quota_failure_is_classified_and_journaled() -> anyhow::Result<()> {
        let (engine, _) = scripted(vec![Err(AssessmentError::from_upstream(
            Some(429),
            "Resource has been exhausted (e.g. check quota).",
        ))]);
        let temp = tempfile::tempdir()?;
        let journal = temp.path().join("events.jsonl");
        let engine = engine.with_events(EventWriter::new(&journal, "test-session"));

        let err = engine.assess(&AssessmentRequest::new(PHOTO)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
        assert_eq!(err.http_status(), 429);

        let events = journal_types(&journal)?;
        assert_eq!(events[1]["type"], json!("assessment_failed"));
        assert_eq!(events[1]["error_kind"], json!("quota_exceeded"));
        Ok(())
    }

    #[test]
    fn missing_image_never_reaches_provider() {
        let (engine, seen) = scripted(Vec::new());
        let err = engine.assess(&AssessmentRequest::new("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalValidation);
        assert!(seen_requests(&seen).is_empty());
    }

    #[test]
    fn prose_reply_is_malformed() {
        let (engine, _) = scripted(vec![Ok("I am unable to assess this image.".to_string())]);
        let err = engine.assess(&AssessmentRequest::new(PHOTO)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedAiResponse);
    }

    #[test]
    fn chat_renders_only_last_ten_turns() -> anyhow::Result<()> {
        let (engine, seen) = scripted(vec![Ok("  Keep the area clean.\n".to_string())]);
        let history: Vec<ChatMessage> = (0..12)
            .map(|index| ChatMessage {
                role: if index % 2 == 0 {
                    ChatRole::User
                } else {
                    ChatRole::Assistant
                },
                content: format!("message {index}"),
            })
            .collect();
        let reply = engine.chat(&ChatRequest {
            message: "Should I pop it?".to_string(),
            conversation_history: history,
        })?;
        assert_eq!(reply.response, "  Keep the area clean.\n");

        let requests = seen_requests(&seen);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-1.5-flash");
        assert!(requests[0].image.is_none());
        let prompt = &requests[0].prompt;
        assert!(!prompt.contains("message 0\n"));
        assert!(!prompt.contains("message 1\n"));
        assert!(prompt.contains("User: message 2\n"));
        assert!(prompt.ends_with("User: Should I pop it?\nAssistant:"));
        Ok(())
    }

    #[test]
    fn chat_failure_carries_fallback_reply() {
        let (engine, _) = scripted(vec![Err(AssessmentError::from_upstream(
            Some(503),
            "The model is overloaded.",
        ))]);
        let err = engine
            .chat(&ChatRequest {
                message: "hello".to_string(),
                conversation_history: Vec::new(),
            })
            .unwrap_err();
        let payload = err.chat_response();
        assert_eq!(payload.error, "AI service unavailable");
        assert!(payload.response.is_some());
    }

    #[test]
    fn text_only_model_falls_back_within_its_provider() -> anyhow::Result<()> {
        let (mut engine, seen) = scripted(Vec::new());
        engine.set_assessment_model(Some("dryrun-text-1".to_string()));
        let result = engine.assess(&AssessmentRequest::new(PHOTO))?;
        assert_eq!(result.condition, "Normal skin");
        assert!(seen_requests(&seen).is_empty());
        Ok(())
    }

    #[test]
    fn model_override_accepts_new_gemini_names() -> anyhow::Result<()> {
        let (mut engine, seen) = scripted(vec![Ok(json!({
            "condition": "Warts",
            "severity": "mild",
            "description": "Rough papule.",
            "recommendations": ["Cryotherapy"],
            "urgency": "routine"
        })
        .to_string())]);
        engine.set_assessment_model(Some("gemini-2.5-flash".to_string()));
        engine.assess(&AssessmentRequest::new(PHOTO))?;
        assert_eq!(seen_requests(&seen)[0].model, "gemini-2.5-flash");

        engine.set_assessment_model(None);
        assert_eq!(engine.assessment_model(), "gemini-1.5-pro");
        Ok(())
    }

    #[test]
    fn dryrun_model_works_offline() -> anyhow::Result<()> {
        let (mut engine, seen) = scripted(Vec::new());
        engine.set_assessment_model(Some("dryrun-vision-1".to_string()));
        let result = engine.assess(&AssessmentRequest::new(PHOTO))?;
        assert_eq!(result.condition, "Normal skin");
        assert!(seen_requests(&seen).is_empty());

        let record = history_record(&result, PHOTO);
        assert_eq!(record.id(), result.analysis_id);
        assert_eq!(record.skin_concerns.len(), 6);
        assert!(record.overall_score.is_some());
        Ok(())
    }

    #[test]
    fn configured_unknown_model_is_registered() -> anyhow::Result<()> {
        let config = EngineConfig {
            assessment_model: "gemini-2.5-pro".to_string(),
            ..EngineConfig::default()
        };
        let engine = AssessmentEngine::from_config(config)?;
        assert!(engine.models().iter().any(|model| model.name == "gemini-2.5-pro"));
        Ok(())
    }
}
