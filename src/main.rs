//! Action router demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ host server (axum, one handler per exact path)
//!                         │
//!                         ▼
//!                     Router ── (path, method) → Action, else (path, *) → Action
//!                         │
//!                         ▼
//!                     Action work(ctx) → Outcome { data, view, layout, vars }
//!                         │
//!                         ▼
//!                     views/<view>  →  buffer  →  layout/<layout> { content }
//!                         │
//!     Client Response     ▼
//!     ◀────────────── 200 body | 302 Location | 500 "Error: ..."
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use action_router::config::{load_config, RouterConfig};
use action_router::http::HostServer;
use action_router::lifecycle::{startup, Shutdown};
use action_router::observability::{logging, metrics};
use action_router::routing::ActionResult;
use action_router::{Outcome, RequestContext};
use axum::http::Extensions;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "action-router", version, about = "Action router demo server")]
struct Args {
    /// Path to a TOML config file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Site name shared by every page through the base context.
#[derive(Clone)]
struct SiteName(&'static str);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("action-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        template_root = %config.templates.root,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let templates = startup::prepare_templates(&config)?;
    let mut router = startup::build_router(&config, templates);

    let mut base = Extensions::new();
    base.insert(SiteName("action-router"));

    router.get("/", home, base.clone());
    router.get("/hello", hello, base.clone());
    router.post("/hello", hello, base.clone());
    router.post("/login", login, base.clone());
    router.any("/health", |_ctx| async { Ok(Outcome::empty()) }, Extensions::new());

    let router = Arc::new(router);
    let mut server = HostServer::from_config(&config);
    router.bind(&mut server)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn home(ctx: RequestContext) -> ActionResult {
    let site = ctx.get::<SiteName>().map(|s| s.0).unwrap_or("site");
    Ok(Outcome::new(json!({ "site": site }))
        .view("home")
        .layout("main")
        .layout_var("title", "Home"))
}

async fn hello(ctx: RequestContext) -> ActionResult {
    let name = ctx.param("name").unwrap_or("stranger");
    Ok(Outcome::new(json!({ "name": name }))
        .view("hello")
        .layout("main")
        .layout_var("title", format!("Hello, {}", name)))
}

async fn login(ctx: RequestContext) -> ActionResult {
    let user = ctx.param("user").unwrap_or_default();
    if user.is_empty() {
        return Err("missing user".into());
    }

    let location = format!(
        "/hello?name={}",
        url::form_urlencoded::byte_serialize(user.as_bytes()).collect::<String>()
    );
    Ok(Outcome::empty().redirect(&location))
}
