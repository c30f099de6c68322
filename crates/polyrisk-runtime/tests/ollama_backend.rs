//! Runtime against an Ollama-compatible HTTP server on an ephemeral port.

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use polyrisk_core::{compute_scores, validate, DomainConfig, ExtractiveSummarizer, ScoreSet};
use polyrisk_runtime::{
    BackendConfig, BackendConnector, BackendProbe, HttpHealthProbe, ProviderRegistry,
    RunController, RunRequest, RuntimeConfig, Strategy, SummarizationFallbackChain, SummaryTier,
    ToolName,
};

fn chat_reply(model: &Value, content: &str) -> Json<Value> {
    Json(json!({
        "model": model,
        "message": {"role": "assistant", "content": content},
        "done": true,
        "done_reason": "stop",
        "prompt_eval_count": 12,
        "eval_count": 8
    }))
}

async fn serve(chat: Router) -> String {
    let app = Router::new()
        .route("/api/tags", get(|| async { Json(json!({"models": []})) }))
        .merge(chat);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Start a fake daemon. `reply` of `None` makes every chat call fail with 500.
async fn spawn_fake_ollama(reply: Option<&'static str>) -> String {
    let chat = move |Json(body): Json<Value>| async move {
        match reply {
            Some(content) => (StatusCode::OK, chat_reply(&body["model"], content)),
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "model not loaded"})),
            ),
        }
    };
    serve(Router::new().route("/api/chat", post(chat))).await
}

/// Start a fake daemon that calls the four stages in order, then answers
/// with `answer`. Single-message requests are summary generations.
async fn spawn_fake_agent(answer: &'static str) -> String {
    let chat = move |Json(body): Json<Value>| async move {
        let turns = body["messages"].as_array().map_or(0, Vec::len);
        if turns <= 1 {
            return chat_reply(&body["model"], "Summary from the model.");
        }
        let content = match ToolName::ORDER.get((turns - 2) / 2) {
            Some(tool) => json!({"tool": tool.as_str()}).to_string(),
            None => answer.to_string(),
        };
        chat_reply(&body["model"], &content)
    };
    serve(Router::new().route("/api/chat", post(chat))).await
}

fn backend(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        model: "mediphi-lite".to_string(),
        generation_timeout: Duration::from_secs(5),
        ..BackendConfig::default()
    }
}

fn probe(config: &BackendConfig) -> Arc<dyn BackendProbe> {
    Arc::new(HttpHealthProbe::new(
        config.health_endpoint(),
        config.probe_timeout,
    ))
}

fn genome() -> String {
    let mut text = String::from("# This data file generated by 23andMe\n");
    text.push_str("# rsid\tchromosome\tposition\tgenotype\n");
    text.push_str("rs7903146\t10\t114758349\tCT\n");
    text.push_str("rs429358\t19\t45411941\tCC\n");
    text.push_str("rs1333049\t9\t22125503\tCG\n");
    text.push_str("rs964184\t11\t116648917\tGG\n");
    text
}

fn scores() -> ScoreSet {
    let domain = DomainConfig::cardiometabolic();
    let variants = validate(&genome()).unwrap();
    compute_scores(&domain.select_targets(&variants), &variants, &domain.catalog).unwrap()
}

fn chain(config: &BackendConfig) -> SummarizationFallbackChain {
    SummarizationFallbackChain::new(
        probe(config),
        Arc::new(ExtractiveSummarizer),
        Default::default(),
    )
    .with_connector(BackendConnector::new(
        Arc::new(ProviderRegistry::with_defaults()),
        config,
    ))
}

#[tokio::test]
async fn test_probe_sees_running_daemon() {
    let base = spawn_fake_ollama(Some("ok")).await;
    assert!(probe(&backend(&base)).is_available().await);
}

#[tokio::test]
async fn test_probe_reports_missing_daemon() {
    let config = backend("http://127.0.0.1:9");
    assert!(!probe(&config).is_available().await);
}

#[tokio::test]
async fn test_ollama_completion() {
    let base = spawn_fake_ollama(Some("Risk is average.")).await;
    let handle = BackendConnector::new(
        Arc::new(ProviderRegistry::with_defaults()),
        &backend(&base),
    )
    .connect()
    .unwrap();

    assert_eq!(handle.provider_name(), "ollama");
    assert_eq!(handle.generate("Summarize").await.unwrap(), "Risk is average.");
}

#[tokio::test]
async fn test_chain_uses_backend_summary() {
    let base = spawn_fake_ollama(Some("Elevated type 2 diabetes risk.")).await;

    let outcome = chain(&backend(&base)).summarize(&scores()).await;

    assert_eq!(outcome.tier, SummaryTier::PreferredBackend);
    assert_eq!(outcome.summary.as_str(), "Elevated type 2 diabetes risk.");
}

#[tokio::test]
async fn test_chain_falls_back_on_server_error() {
    let base = spawn_fake_ollama(None).await;

    let outcome = chain(&backend(&base)).summarize(&scores()).await;

    assert_eq!(outcome.tier, SummaryTier::LocalFallback);
    assert!(!outcome.summary.is_unavailable());
}

#[tokio::test]
async fn test_controller_over_live_backend() {
    let text = "Your results look broadly typical.";
    let base = spawn_fake_agent(text).await;
    let config = RuntimeConfig {
        backend: backend(&base),
        ..RuntimeConfig::default()
    };

    let controller = RunController::builder().config(config).build().await;
    assert_eq!(controller.session().strategy(), Strategy::Agent);
    assert_eq!(controller.session().model(), Some("mediphi-lite"));

    let result = controller.handle(&RunRequest::new(genome())).await.unwrap();
    assert!(result.scores.is_empty());
    assert_eq!(result.summary.as_str(), text);
}

#[tokio::test]
async fn test_controller_without_backend() {
    let config = RuntimeConfig {
        backend: backend("http://127.0.0.1:9"),
        ..RuntimeConfig::default()
    };

    let controller = RunController::builder().config(config).build().await;
    assert_eq!(controller.session().strategy(), Strategy::Deterministic);

    let result = controller.handle(&RunRequest::new(genome())).await.unwrap();
    assert_eq!(result.scores.len(), 9);
    assert!(!result.summary.is_unavailable());
}
