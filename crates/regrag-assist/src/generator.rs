use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use regrag_core::config::{LlmProvider, LlmSettings};
use regrag_core::traits::Capability;

/// Black-box text completion.
pub trait Generator: Send + Sync {
    fn id(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Local Ollama server (`/api/generate`, non-streaming).
pub struct OllamaGenerator {
    agent: ureq::Agent,
    base_url: String,
    model: String,
    id: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    /// Connect and health-check once; an unreachable server is an error here, not per call.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new().timeout(Duration::from_secs(settings.timeout_secs)).build();
        let generator = Self { agent, id: format!("ollama:{}", settings.model), model: settings.model.clone(), base_url };
        generator.health_check()?;
        Ok(generator)
    }

    fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .agent
            .get(&url)
            .timeout(Duration::from_millis(800))
            .call()
            .map_err(|e| anyhow!("Ollama unreachable at {}: {e}", self.base_url))?;
        if resp.status() != 200 {
            bail!("Ollama health check failed: status={}", resp.status());
        }
        Ok(())
    }
}

impl Generator for OllamaGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let req = GenerateRequest { model: &self.model, prompt, stream: false };
        let resp = self.agent.post(&url).send_json(serde_json::to_value(req)?)?;
        let body: GenerateResponse = resp.into_json()?;
        let text = body.response.trim();
        if text.is_empty() {
            bail!("{} returned an empty response", self.id);
        }
        Ok(text.to_string())
    }
}

/// Negotiate the configured generative backend once.
pub fn load_generator(settings: &LlmSettings) -> Capability<Box<dyn Generator>> {
    let cap: Capability<Box<dyn Generator>> = match settings.provider {
        LlmProvider::Disabled => Capability::unavailable("generation disabled by configuration"),
        LlmProvider::Ollama => OllamaGenerator::new(settings).map(|g| Box::new(g) as Box<dyn Generator>).into(),
    };
    match &cap {
        Capability::Available(g) => tracing::info!(generator = g.id(), "generation backend available"),
        Capability::Unavailable(reason) => tracing::info!(%reason, "generation backend unavailable"),
    }
    cap
}
