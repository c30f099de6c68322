//! Session setup and per-request run control.
//!
//! The orchestrator implements:
//! - One-time strategy selection (probe, then handle construction)
//! - An immutable [`SessionContext`] holding the chosen executor
//! - Per-request dispatch and agent output normalization
//!
//! The session is built once and never re-evaluated. A backend that goes
//! down mid-session is noticed by the summarization fallback chain or, on
//! the agent path, fails the run.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use polyrisk_core::{DomainConfig, ExtractiveSummarizer, LocalSummarizer, RunResult};

use crate::agents::{normalize_agent_output, ChatToolLoop};
use crate::backend::BackendConnector;
use crate::cache::SummaryCache;
use crate::config::{AgentConfig, RuntimeConfig};
use crate::error::PipelineError;
use crate::executor::{
    AgentExecutor, DeterministicExecutor, Executor, ExecutorOutput, RunRequest, Strategy,
};
use crate::probe::{BackendProbe, HttpHealthProbe};
use crate::providers::ProviderRegistry;
use crate::resilience::SummarizationFallbackChain;
use crate::tools::ToolSet;

/// Immutable per-session state: the chosen executor and what it runs on.
///
/// Rebuilt only by restarting the session.
pub struct SessionContext {
    strategy: Strategy,
    executor: Arc<dyn Executor>,
    model: Option<String>,
    built_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(executor: Arc<dyn Executor>, model: Option<String>) -> Self {
        Self {
            strategy: executor.strategy(),
            executor,
            model,
            built_at: Utc::now(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Model driving the agent, if the agent strategy was selected.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("strategy", &self.strategy)
            .field("model", &self.model)
            .field("built_at", &self.built_at)
            .finish()
    }
}

/// Chooses between the agent and deterministic executors.
pub struct StrategySelector {
    probe: Arc<dyn BackendProbe>,
    connector: Option<BackendConnector>,
    tools: Arc<ToolSet>,
    agent: AgentConfig,
}

impl StrategySelector {
    pub fn new(probe: Arc<dyn BackendProbe>, tools: Arc<ToolSet>, agent: AgentConfig) -> Self {
        Self {
            probe,
            connector: None,
            tools,
            agent,
        }
    }

    pub fn with_connector(mut self, connector: BackendConnector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Agent if the backend is reachable and a handle can be built;
    /// deterministic otherwise.
    pub async fn select(&self) -> SessionContext {
        let Some(connector) = &self.connector else {
            tracing::info!(strategy = %Strategy::Deterministic, "No inference backend configured");
            return self.deterministic();
        };

        if !self.probe.is_available().await {
            tracing::info!(
                strategy = %Strategy::Deterministic,
                endpoint = self.probe.endpoint(),
                "Inference backend unavailable"
            );
            return self.deterministic();
        }

        match connector.connect() {
            Ok(handle) => {
                let model = handle.model().to_string();
                let executor = AgentExecutor::new(
                    self.tools.clone(),
                    Arc::new(ChatToolLoop::new(handle)),
                    self.agent.max_steps,
                    self.agent.default_goal.clone(),
                );
                tracing::info!(strategy = %Strategy::Agent, model = %model, "Selected execution strategy");
                SessionContext::new(Arc::new(executor), Some(model))
            }
            Err(e) => {
                tracing::warn!(
                    strategy = %Strategy::Deterministic,
                    error = %e,
                    "Backend handle construction failed"
                );
                self.deterministic()
            }
        }
    }

    fn deterministic(&self) -> SessionContext {
        SessionContext::new(Arc::new(DeterministicExecutor::new(self.tools.clone())), None)
    }
}

/// Entry point for runs.
///
/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct RunController {
    session: Arc<SessionContext>,
}

impl RunController {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    pub fn builder() -> RunControllerBuilder {
        RunControllerBuilder::new()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Run one request. Agent output that is not `{scores, summary}`
    /// degrades to the raw text with no scores.
    pub async fn handle(&self, request: &RunRequest) -> Result<RunResult, PipelineError> {
        let started = Instant::now();
        let strategy = self.session.strategy();

        let result = match self.session.executor().run(request).await {
            Ok(ExecutorOutput::Structured(result)) => Ok(result),
            Ok(ExecutorOutput::Raw(raw)) => Ok(normalize_agent_output(&raw)),
            Err(e) => Err(e),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(run) => tracing::info!(
                strategy = %strategy,
                scores = run.scores.len(),
                elapsed_ms,
                "Run completed"
            ),
            Err(e) => tracing::warn!(
                strategy = %strategy,
                kind = %e.kind(),
                error = %e,
                elapsed_ms,
                "Run failed"
            ),
        }

        result
    }
}

/// Builder for [`RunController`].
pub struct RunControllerBuilder {
    config: RuntimeConfig,
    domain: Option<DomainConfig>,
    registry: Option<Arc<ProviderRegistry>>,
    probe: Option<Arc<dyn BackendProbe>>,
    local: Option<Arc<dyn LocalSummarizer>>,
    offline: bool,
}

impl RunControllerBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            domain: None,
            registry: None,
            probe: None,
            local: None,
            offline: false,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Analysis domain; the built-in cardiometabolic panel by default.
    pub fn domain(mut self, domain: DomainConfig) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Provider registry; built-in providers by default.
    pub fn registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Availability probe; an HTTP health probe on the configured backend by default.
    pub fn probe(mut self, probe: Arc<dyn BackendProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn local_summarizer(mut self, local: Arc<dyn LocalSummarizer>) -> Self {
        self.local = Some(local);
        self
    }

    /// Never use a backend: deterministic executor, local summaries only.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Wire collaborators and select the strategy. Probes the backend once.
    pub async fn build(self) -> RunController {
        let config = self.config;
        let probe = self.probe.unwrap_or_else(|| {
            Arc::new(HttpHealthProbe::new(
                config.backend.health_endpoint(),
                config.backend.probe_timeout,
            ))
        });
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ProviderRegistry::with_defaults()));
        let connector =
            (!self.offline).then(|| BackendConnector::new(registry, &config.backend));
        let local = self
            .local
            .unwrap_or_else(|| Arc::new(ExtractiveSummarizer::new()));

        let mut chain = SummarizationFallbackChain::new(probe.clone(), local, config.summary)
            .with_cache(Arc::new(SummaryCache::from_config(&config.cache)));
        if let Some(connector) = &connector {
            chain = chain.with_connector(connector.clone());
        }

        let domain = self.domain.unwrap_or_else(DomainConfig::cardiometabolic);
        let tools = Arc::new(ToolSet::new(Arc::new(domain), Arc::new(chain)));

        let mut selector = StrategySelector::new(probe, tools, config.agent);
        if let Some(connector) = connector {
            selector = selector.with_connector(connector);
        }

        RunController::new(selector.select().await)
    }
}

impl Default for RunControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
