//! polyrisk binary entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use polyrisk_runtime::{RunRequest, RuntimeConfig};
use polyrisk_server::{build_controller, serve_biomed, serve_pipeline, ServerConfig};

/// Polygenic risk analysis with optional LLM orchestration
#[derive(Parser, Debug)]
#[command(name = "polyrisk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Score a genome against a trait panel and summarize the results", long_about = None)]
struct Cli {
    /// Host to bind to (overrides POLYRISK_HOST)
    #[arg(global = true, long)]
    host: Option<String>,

    /// Domain YAML file (overrides POLYRISK_DOMAIN_FILE)
    #[arg(global = true, long = "domain")]
    domain_file: Option<PathBuf>,

    /// Inference backend base URL (overrides POLYRISK_BACKEND_URL)
    #[arg(global = true, long = "backend-url")]
    backend_url: Option<String>,

    /// Model identifier (overrides OLLAMA_MODEL)
    #[arg(global = true, long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the pipeline server (POST /run, GET /health)
    Serve {
        /// Port to listen on (overrides POLYRISK_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Start the biomedical summary server (POST /summarize)
    Biomed {
        /// Port to listen on (overrides POLYRISK_BIOMED_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one genome file and print the result as JSON
    Run {
        /// 23andMe raw data file
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,

        /// Goal passed to the agent
        #[arg(long)]
        goal: Option<String>,

        /// Skip the inference backend entirely
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut server = ServerConfig::from_env();
    if let Some(host) = cli.host {
        server.host = host;
    }
    if let Some(path) = cli.domain_file {
        server.domain_file = Some(path);
    }

    let mut runtime = RuntimeConfig::from_env();
    if let Some(url) = cli.backend_url {
        runtime.backend.base_url = url;
    }
    if let Some(model) = cli.model {
        runtime.backend.model = model;
    }

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                server.port = port;
            }
            serve_pipeline(server, runtime).await
        }
        Commands::Biomed { port } => {
            if let Some(port) = port {
                server.biomed_port = port;
            }
            serve_biomed(server, runtime).await
        }
        Commands::Run {
            input,
            goal,
            offline,
        } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let controller = build_controller(&server, runtime, offline).await?;
            let mut request = RunRequest::new(raw);
            if let Some(goal) = goal {
                request = request.with_goal(goal);
            }

            let result = controller.handle(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}
