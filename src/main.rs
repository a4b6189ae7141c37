//! content-dispatch demo server.
//!
//! Serves a small people API whose routes negotiate between JSON, plain
//! text and CSV representations.
//!
//! ```text
//! curl -H 'Accept: text/plain' localhost:8080/people/hank
//! curl -H 'Accept: application/json' localhost:8080/people/hank
//! ```

use std::path::PathBuf;

use axum::http::header::CONTENT_TYPE;
use axum::Json;
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;

use content_dispatch::config::{load_config, ServerConfig};
use content_dispatch::lifecycle::signals::shutdown_on_signal;
use content_dispatch::observability::{logging, metrics};
use content_dispatch::{App, Handlers, HttpServer, Negotiation, RegistryError, Route, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "content-dispatch", version, about = "Content negotiation demo server")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Serialize)]
struct Person {
    first: &'static str,
    last: &'static str,
}

const HANK: Person = Person {
    first: "Hank",
    last: "Leupen",
};

async fn hank() -> Json<Person> {
    Json(HANK)
}

async fn hank_card(negotiation: Negotiation) -> axum::response::Response {
    negotiation
        .respond(
            Handlers::new()
                .on("text/vcard", |_| async {
                    (
                        [(CONTENT_TYPE, "text/vcard")],
                        format!("BEGIN:VCARD\nN:{};{}\nEND:VCARD\n", HANK.last, HANK.first),
                    )
                })
                .on("application/json", |_| async { Json(HANK) }),
        )
        .await
}

fn build_app(config: ServerConfig) -> Result<App, RegistryError> {
    let mut app = App::new(config);

    app.route(Route::get("/people/hank", hank).id("hank").negotiate(
        Handlers::new().on("text/plain", |_| async {
            ([(CONTENT_TYPE, "text/plain")], "Hank is the best")
        }),
    ))?
    .route(Route::get("/people/hank/card", hank_card).id("hank-card"))?;

    app.negotiate(
        "hank",
        Handlers::new().on("text/csv", |_| async {
            (
                [(CONTENT_TYPE, "text/csv")],
                format!("first,last\n{},{}\n", HANK.first, HANK.last),
            )
        }),
    )?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("content-dispatch v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        vary_accept = config.negotiation.vary_accept,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let app = build_app(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    HttpServer::new(app).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
