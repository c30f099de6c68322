//! Runtime configuration.
//!
//! Defaults match a local Ollama daemon. Every field can be overridden from
//! the environment with [`RuntimeConfig::from_env`]; durations accept
//! humantime syntax (`2s`, `1m 30s`) and serialize as whole seconds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use polyrisk_core::LengthBounds;

use crate::providers::{
    CompletionConfig, OllamaProvider, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, OLLAMA_MODEL_ENV,
};

/// Goal sent to the agent when a request carries none.
pub const DEFAULT_GOAL: &str = "Analyze cardiometabolic risks";

/// Complete runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    /// Word bounds for pipeline summaries
    #[serde(default)]
    pub summary: LengthBounds,

    /// Word bounds for biomedical summaries
    #[serde(default = "default_biomed_bounds")]
    pub biomed: LengthBounds,

    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_biomed_bounds() -> LengthBounds {
    LengthBounds::new(50, 256)
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            agent: AgentConfig::default(),
            summary: LengthBounds::default(),
            biomed: default_biomed_bounds(),
            cache: CacheConfig::default(),
        }
    }
}

/// Inference backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Registered provider type
    pub provider: String,

    pub base_url: String,

    pub model: String,

    /// Bound on the availability probe
    #[serde(with = "duration_secs")]
    pub probe_timeout: Duration,

    /// Bound on a single generation call
    #[serde(with = "duration_secs")]
    pub generation_timeout: Duration,

    pub max_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            probe_timeout: Duration::from_secs(2),
            generation_timeout: Duration::from_secs(60),
            max_tokens: 512,
        }
    }
}

impl BackendConfig {
    /// Health endpoint probed before any backend use.
    pub fn health_endpoint(&self) -> String {
        OllamaProvider::health_url(&self.base_url)
    }

    /// JSON handed to the provider factory.
    pub fn provider_config(&self) -> serde_json::Value {
        serde_json::json!({
            "base_url": self.base_url,
            "model": self.model,
        })
    }

    /// Per-call completion settings. Sampling is always off.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            timeout: self.generation_timeout,
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard cap on reasoning steps per run
    pub max_steps: usize,

    pub default_goal: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 6,
            default_goal: DEFAULT_GOAL.to_string(),
        }
    }
}

/// Summary cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: u64,

    #[serde(with = "duration_secs")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by environment variables.
    ///
    /// - `POLYRISK_BACKEND_URL` - backend base URL
    /// - `OLLAMA_MODEL` - model identifier
    /// - `POLYRISK_PROBE_TIMEOUT` - probe timeout (humantime)
    /// - `POLYRISK_GENERATION_TIMEOUT` - generation timeout (humantime)
    /// - `POLYRISK_AGENT_MAX_STEPS` - agent step cap
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("POLYRISK_BACKEND_URL") {
            config.backend.base_url = url;
        }

        if let Ok(model) = std::env::var(OLLAMA_MODEL_ENV) {
            if !model.trim().is_empty() {
                config.backend.model = model;
            }
        }

        if let Some(timeout) = env_duration("POLYRISK_PROBE_TIMEOUT") {
            config.backend.probe_timeout = timeout;
        }

        if let Some(timeout) = env_duration("POLYRISK_GENERATION_TIMEOUT") {
            config.backend.generation_timeout = timeout;
        }

        if let Ok(steps) = std::env::var("POLYRISK_AGENT_MAX_STEPS") {
            match steps.parse::<usize>() {
                Ok(steps) if steps > 0 => config.agent.max_steps = steps,
                _ => tracing::warn!(value = %steps, "Ignoring invalid POLYRISK_AGENT_MAX_STEPS"),
            }
        }

        config
    }
}

fn env_duration(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match humantime::parse_duration(raw.trim()) {
        Ok(duration) => Some(duration),
        Err(e) => {
            tracing::warn!(variable = name, value = %raw, error = %e, "Ignoring invalid duration");
            None
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
