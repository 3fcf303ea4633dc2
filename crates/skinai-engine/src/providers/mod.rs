mod dryrun;
mod gemini;

use std::collections::BTreeMap;

use serde_json::Value;
use skinai_contracts::errors::AssessmentError;

use crate::config::{EngineConfig, GenerationSettings};
use crate::image::InlineImage;

pub use dryrun::DryrunProvider;
pub use gemini::{build_payload, extract_text, GeminiProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub settings: GenerationSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
    pub provider_response: Value,
}

/// One upstream text-generation backend. Exactly one call per `generate`;
/// implementations do not retry.
pub trait GenerativeProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, AssessmentError>;
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn GenerativeProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: GenerativeProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn GenerativeProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

pub fn default_provider_registry(config: &EngineConfig) -> anyhow::Result<ProviderRegistry> {
    let mut providers = ProviderRegistry::new();
    providers.register(DryrunProvider);
    providers.register(GeminiProvider::new(config)?);
    Ok(providers)
}
