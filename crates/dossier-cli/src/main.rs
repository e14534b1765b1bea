mod config;

use clap::{Parser, Subcommand};
use config::DossierConfig;
use dossier_agent::{AgentHandle, HeuristicPolicy, HttpAgentBackend};
use dossier_client::{ChatState, LegacyMerger, ResearchClient, ERROR_MARKER};
use dossier_core::StreamEvent;
use dossier_gateway::{AuthConfig, GatewayServer, StreamOrchestrator, StreamSettings};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dossier", about = "Dossier: streaming people-research gateway")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "dossier.toml")]
    config: PathBuf,

    /// Human-readable logs instead of JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Research a person through a running gateway and print the result
    Ask {
        /// Full name of the person, or any chat message
        query: String,
        /// Gateway base URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,
        /// Bearer key for the research route
        #[arg(long)]
        api_key: Option<String>,
        /// Deduplicate and repair text from gateways that re-send fragments
        #[arg(long)]
        legacy_merge: bool,
    },
}

fn init_tracing(pretty: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if pretty {
        builder.init();
    } else {
        builder.json().init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.pretty);

    match cli.command {
        Commands::Serve { host, port } => {
            let config = DossierConfig::load(&cli.config)?;
            config.validate()?;
            serve(config, host, port).await
        }
        Commands::Ask {
            query,
            url,
            api_key,
            legacy_merge,
        } => ask(&query, &url, api_key, legacy_merge).await,
    }
}

async fn serve(config: DossierConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);

    let backend = HttpAgentBackend::new(config.agent.clone())?;
    let agent = AgentHandle::new(Arc::new(backend));
    let settings = StreamSettings::from(&config.stream);
    let orchestrator = Arc::new(StreamOrchestrator::new(
        agent,
        Arc::new(HeuristicPolicy),
        settings,
        config.agent.model_id.clone(),
    ));

    let auth_config = AuthConfig::new(config.server.api_keys);
    if auth_config.is_enabled() {
        info!(keys = auth_config.api_keys.len(), "API key auth enabled");
    }
    if config.agent.api_key.is_empty() {
        warn!("No agent API key configured; set DOSSIER_AGENT_API_KEY");
    }

    let app = GatewayServer::build_with_auth(orchestrator, auth_config);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        agent_url = %config.agent.base_url(),
        model = %config.agent.model_id,
        "Starting Dossier gateway on {addr}"
    );

    GatewayServer::serve(listener, app, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested; draining open streams");
}

async fn ask(
    query: &str,
    url: &str,
    api_key: Option<String>,
    legacy_merge: bool,
) -> anyhow::Result<()> {
    let mut client = ResearchClient::new(url);
    if let Some(key) = api_key.or_else(|| std::env::var("DOSSIER_CLIENT_KEY").ok()) {
        client = client.with_api_key(key);
    }
    let mut state = if legacy_merge {
        ChatState::with_legacy_merge(LegacyMerger::default())
    } else {
        ChatState::new()
    };

    let mut transcript = Transcript::new(std::io::stdout(), legacy_merge);
    let id = client
        .research(query, &mut state, |event| transcript.on_event(event))
        .await?;
    transcript.finish(&state, id);

    match transcript.failure {
        Some(message) => anyhow::bail!("research failed: {message}"),
        None => Ok(()),
    }
}

/// Prints a research stream as it arrives.
///
/// In legacy-merge mode raw text chunks are not echoed: the merged answer is
/// printed from [`ChatState`] once the stream ends, followed by the held
/// terminal line.
struct Transcript<W: Write> {
    out: W,
    legacy: bool,
    held_terminal: Option<StreamEvent>,
    failure: Option<String>,
}

impl<W: Write> Transcript<W> {
    fn new(out: W, legacy: bool) -> Self {
        Self {
            out,
            legacy,
            held_terminal: None,
            failure: None,
        }
    }

    fn on_event(&mut self, event: &StreamEvent) {
        if let StreamEvent::Error { message, .. } = event {
            self.failure = Some(message.clone());
        }
        if self.legacy {
            match event {
                StreamEvent::AssistantText { .. } => return,
                StreamEvent::Complete { .. } | StreamEvent::Error { .. } => {
                    self.held_terminal = Some(event.clone());
                    return;
                }
                _ => {}
            }
        }
        render(&mut self.out, event);
    }

    fn finish(&mut self, state: &ChatState, id: Uuid) {
        if self.legacy {
            let answer = state.message(id).map(|m| m.content.as_str()).unwrap_or("");
            let body = answer.split(ERROR_MARKER).next().unwrap_or("").trim_end();
            let _ = write!(self.out, "{body}");
            if let Some(terminal) = self.held_terminal.take() {
                render(&mut self.out, &terminal);
            }
        }
        let _ = writeln!(self.out);

        if !state.tools().is_empty() {
            let _ = writeln!(self.out, "\nSources consulted:");
            for tool in state.tools() {
                let _ = writeln!(self.out, "  [{:?}] {}", tool.status, tool.display_name);
            }
        }
        let _ = self.out.flush();
    }
}

fn render(out: &mut impl Write, event: &StreamEvent) {
    let _ = match event {
        StreamEvent::AssistantText { content, .. } => write!(out, "{content}"),
        StreamEvent::Status { message, .. } => writeln!(out, "… {message}"),
        StreamEvent::ToolStart { display_name, .. } => writeln!(out, "→ {display_name}"),
        StreamEvent::ToolComplete {
            display_name,
            duration_ms,
            ..
        } => writeln!(out, "✓ {display_name} ({duration_ms} ms)"),
        StreamEvent::ToolError {
            display_name,
            error,
            ..
        } => writeln!(out, "✗ {display_name}: {error}"),
        StreamEvent::Complete {
            duration_ms,
            tool_count,
            ..
        } => writeln!(out, "\n\nDone in {duration_ms} ms, {tool_count} tool call(s)."),
        StreamEvent::Error { message, .. } => writeln!(out, "\n\nError: {message}"),
    };
    let _ = out.flush();
}
