use super::registry::{ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: String,
    pub fallback_reason: Option<String>,
}

/// Picks the model for one call. An unsuitable request falls back to a
/// model of the same provider first, so an offline session stays offline.
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Registers `name` as a Gemini model unless it is already known.
    pub fn ensure_known(&mut self, name: &str, capabilities: &[&str]) {
        if self.registry.get(name).is_some() {
            return;
        }
        self.registry.register(ModelSpec {
            name: name.to_string(),
            provider: "gemini".to_string(),
            capabilities: capabilities.iter().map(|item| (*item).to_string()).collect(),
            context_window: None,
        });
    }

    pub fn select(&self, requested: &str, capability: &str) -> Result<ModelSelection, String> {
        if let Some(model) = self.registry.ensure(requested, capability) {
            return Ok(ModelSelection {
                model,
                requested: requested.to_string(),
                fallback_reason: None,
            });
        }

        let candidates = self.registry.by_capability(capability);
        let same_provider = self
            .registry
            .get(requested)
            .map(|known| known.provider.clone())
            .and_then(|provider| {
                candidates
                    .iter()
                    .find(|candidate| candidate.provider == provider)
                    .cloned()
            });
        let Some(model) = same_provider.or_else(|| candidates.first().cloned()) else {
            return Err(format!("no model supports '{capability}'"));
        };
        let fallback_reason = format!(
            "model '{requested}' cannot serve '{capability}' requests; using '{}'",
            model.name
        );
        Ok(ModelSelection {
            model,
            requested: requested.to_string(),
            fallback_reason: Some(fallback_reason),
        })
    }
}
