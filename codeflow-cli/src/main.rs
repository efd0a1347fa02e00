//! Codeflow CLI: solves one coding request against a local Ollama server.
//!
//! Logs go to stderr; stdout carries only the artifact (or the JSON reply).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use codeflow::config::{CodeflowConfig, LogFormat};
use codeflow::observability::init_logging;
use codeflow::pipeline::{Pipeline, PipelineRequest};
use codeflow::stages::StagePorts;
use serde_json::json;
use tracing::debug;

/// Turn a coding request into generated, debugged or optimized Python.
#[derive(Debug, Parser)]
#[command(name = "codeflow", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Image to analyze alongside the query (screenshot of code, traceback, diagram).
    #[arg(short, long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Correlation id for the run. Generated when omitted.
    #[arg(long, value_name = "ID")]
    trace_id: Option<String>,

    /// Print the reply as JSON.
    #[arg(long)]
    json: bool,

    /// Log in JSON instead of text.
    #[arg(long)]
    json_logs: bool,

    /// The request. Multiple words are joined with spaces.
    #[arg(value_name = "QUERY", num_args = 0..)]
    query: Vec<String>,
}

impl Cli {
    fn request(&self) -> PipelineRequest {
        let mut request = PipelineRequest::new(self.query.join(" "));
        if let Some(ref image) = self.image {
            request = request.with_image(image.to_string_lossy());
        }
        if let Some(ref trace_id) = self.trace_id {
            request = request.with_trace_id(trace_id);
        }
        request
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CodeflowConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.json_logs {
        config.logging.format = LogFormat::Json;
    }
    init_logging(&config.logging).context("failed to initialize logging")?;
    debug!(?config, "configuration loaded");

    if cli.query.is_empty() && cli.image.is_none() {
        anyhow::bail!("nothing to do: pass a QUERY, an --image, or both");
    }

    let ports = StagePorts::ollama(&config).context("failed to create model clients")?;
    let pipeline = Pipeline::standard(ports, &config).context("failed to build pipeline")?;

    let reply = pipeline
        .handle(cli.request())
        .await
        .context("pipeline run failed")?;

    if cli.json {
        let body = json!({
            "reply": reply.final_artifact,
            "intent": reply.intent,
            "trace_id": reply.trace_id,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", reply.final_artifact);
    }
    Ok(())
}
