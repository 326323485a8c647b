//! idk2 CLI
//!
//! Drives the plugin nodes from the command line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use blueprint_runtime::NodeRegistry;
use blueprint_types::LogVerbosity;

use idk2::http::{AsyncRequestProxy, HttpRequest, PendingRequests, ProxyOptions, UreqTransport};
use idk2::{
    Idk2Config, NodeServices, PrintParams, PrintSinks, ScreenOverlay, TracingLogSink,
    print_with_verbosity, register_idk2_nodes,
};

/// idk2 node plugin
#[derive(Parser, Debug)]
#[command(name = "idk2")]
#[command(about = "Print With Verbosity and HTTP request nodes", long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "idk2.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a GET and report how it resolved
    Get {
        url: String,

        /// Overrides `[http] timeout_ms`
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print a message through the print node
    Print {
        message: String,

        #[arg(long, default_value = "Display")]
        verbosity: LogVerbosity,

        #[arg(long)]
        no_screen: bool,

        #[arg(long)]
        no_log: bool,

        #[arg(long)]
        key: Option<String>,

        /// Overlay seconds
        #[arg(long, default_value_t = 2.0)]
        duration: f32,
    },
    /// List registered nodes as JSON
    Nodes,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("idk2=info,LogBlueprintUserMessages=trace")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Idk2Config::load(&args.config)
        .await
        .with_context(|| format!("loading {}", args.config.display()))?;

    match args.command {
        Command::Get { url, timeout_ms } => {
            let timeout = timeout_ms.map(Duration::from_millis).or(config.http.timeout());
            run_get(url, timeout, config.http.user_agent.as_deref()).await
        }
        Command::Print {
            message,
            verbosity,
            no_screen,
            no_log,
            key,
            duration,
        } => {
            let overlay = Arc::new(ScreenOverlay::new());
            let sinks = PrintSinks::new(Arc::new(TracingLogSink::non_fatal()), overlay.clone())
                .with_config(config.print);
            let params = PrintParams {
                print_to_screen: !no_screen,
                print_to_log: !no_log,
                key,
                duration,
                ..PrintParams::new(message, verbosity)
            };
            print_with_verbosity(&sinks, &params);

            for slot in overlay.visible(Instant::now()) {
                println!("[screen {}] {}", slot.color.to_hex(), slot.text);
            }
            Ok(())
        }
        Command::Nodes => {
            let services = NodeServices {
                print: PrintSinks::new(
                    Arc::new(TracingLogSink::non_fatal()),
                    Arc::new(ScreenOverlay::new()),
                )
                .with_config(config.print),
                transport: Arc::new(UreqTransport::new(
                    config.http.timeout(),
                    config.http.user_agent.as_deref(),
                )),
                proxy_options: ProxyOptions {
                    timeout: config.http.timeout(),
                },
                pending: PendingRequests::new(),
            };
            let mut registry = NodeRegistry::new();
            register_idk2_nodes(&mut registry, &services);

            let listing = json!({
                "menu": registry.menu_actions(),
                "definitions": registry.definitions().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
    }
}

async fn run_get(url: String, timeout: Option<Duration>, user_agent: Option<&str>) -> Result<()> {
    let transport = Arc::new(UreqTransport::new(timeout, user_agent));
    let handle = AsyncRequestProxy::create(HttpRequest::get(url), transport, ProxyOptions {
        timeout,
    });

    handle.on_complete(|| info!("Request complete"));

    match handle.completed().await {
        Ok(()) => {
            println!("completed {}", handle.request().url);
            Ok(())
        }
        Err(e) => {
            error!(request_id = %handle.id(), "{}", e);
            Err(e.into())
        }
    }
}
