use anyhow::{Context, Result};
use chatprobe_config::ChatprobeConfig;
use chatprobe_core::{ArtifactSink, AskPipeline, AskRequest};
use chatprobe_drivers::WebDriverLauncher;
use chatprobe_server::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

fn launcher(cfg: &ChatprobeConfig) -> Result<WebDriverLauncher> {
    WebDriverLauncher::new(cfg.target.clone())
}

fn sink(cfg: &ChatprobeConfig, enabled: bool) -> Result<Option<ArtifactSink>> {
    if !(enabled && cfg.output.artifacts) {
        return Ok(None);
    }
    let sink = ArtifactSink::create(&cfg.output.dir)
        .with_context(|| format!("cannot create output dir {}", cfg.output.dir.display()))?;
    info!(dir = %sink.dir().display(), timestamp = sink.timestamp(), "saving artifacts");
    Ok(Some(sink))
}

pub async fn ask(
    cfg: &ChatprobeConfig,
    question: String,
    follow_up: Option<usize>,
    artifacts: bool,
    json: bool,
) -> Result<()> {
    let launcher = launcher(cfg)?;
    let sink = sink(cfg, artifacts)?;
    let mut request = AskRequest::new(question);
    request.follow_up = follow_up;

    let outcome = AskPipeline::from_config(cfg)
        .ask(&launcher, &request, sink.as_ref())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    if outcome.response.is_empty() {
        warn!("no answer found on the page");
    }
    println!("{}", outcome.response.text);
    if let Some(f) = &outcome.follow_up {
        println!("\n# {}\n{}", f.question, f.response.text);
    }
    Ok(())
}

pub async fn probe(cfg: &ChatprobeConfig, question: Option<&str>) -> Result<()> {
    let launcher = launcher(cfg)?;
    let sink = sink(cfg, true)?;
    let report = AskPipeline::from_config(cfg)
        .probe(&launcher, question, sink.as_ref())
        .await?;

    for r in &report.results {
        let mark = if r.valid { "ok " } else if r.exists { "-- " } else { "   " };
        println!("{mark}{:>5}  {}", r.length, r.selector);
    }
    match report.best() {
        Some(best) => println!("\nbest: {} ({} chars)", best.selector, best.length),
        None => println!("\nno selector exceeded {} chars", report.min_chars),
    }
    Ok(())
}

pub async fn serve(cfg: ChatprobeConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let port = port.unwrap_or(cfg.server.port);
    let bind = format!("{host}:{port}");
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("cannot bind {bind}"))?;

    let mut state = AppState::new(AskPipeline::from_config(&cfg), Arc::new(launcher(&cfg)?));
    if cfg.output.artifacts {
        state = state.with_artifacts(cfg.output.dir.clone());
    }
    chatprobe_server::serve(listener, state).await
}
