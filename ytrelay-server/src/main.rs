use std::ffi::OsString;
use std::num::NonZeroU16;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueHint};
use log::LevelFilter;
use tokio::signal;

mod cleanup;
mod error;
mod process;
mod routes;
mod submission;
mod upload;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .filter(Some("tower_http"), LevelFilter::Debug)
        .filter(Some("ytrelay_server"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    let CliArgs {
        host,
        port,
        tool,
        tool_args,
        tool_dir,
        upload_dir,
        static_dir,
        max_upload_bytes,
        upload_max_age,
    } = CliArgs::parse();

    log::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_version = ytrelay_api::api::VERSION;
        "Initializing server"
    );

    let upload_dir = upload_dir.unwrap_or_else(upload::default_upload_directory);
    tokio::fs::create_dir_all(&upload_dir).await?;
    log::info!(path:debug = upload_dir; "storing uploads");

    if let Some(secs) = upload_max_age {
        cleanup::start_cleanup_task(upload_dir.clone(), Duration::from_secs(secs));
    }

    let tool = process::ExternalTool {
        program: tool,
        args: tool_args,
        current_dir: tool_dir,
    };
    log::info!(tool:debug; "relaying to external tool");

    log::info!(path:debug = static_dir; "serving static assets");
    let state = routes::AppState {
        tool: Arc::new(tool),
        upload_dir: Arc::new(upload_dir),
    };
    let router = routes::routes(state, static_dir, max_upload_bytes);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        addr:display = host,
        port = port;
        "listening to TCP"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[derive(Parser)]
struct CliArgs {
    /// The host address for the relay server.
    #[arg(
        long,
        value_name = "URI",
        value_hint = ValueHint::Hostname,
        default_value = "0.0.0.0",
        env = "YTRELAY_HOST",
    )]
    host: String,
    /// The host port for the relay server.
    #[arg(
        short,
        long,
        value_name = "PORT",
        value_hint = ValueHint::Other,
        default_value = "3000",
        env = "YTRELAY_PORT",
    )]
    port: NonZeroU16,
    /// The external tool every submission is handed to.
    #[arg(
        long,
        value_name = "PROGRAM",
        value_hint = ValueHint::CommandName,
        default_value = "python",
        env = "YTRELAY_TOOL",
    )]
    tool: OsString,
    /// Leading arguments for the tool, the submission is appended after them.
    #[arg(
        long = "tool-arg",
        value_name = "ARG",
        default_value = "../ytcli.py",
    )]
    tool_args: Vec<OsString>,
    /// Working directory of the tool. Defaults to the server's.
    #[arg(
        long,
        value_name = "DIR",
        value_hint = ValueHint::DirPath,
        env = "YTRELAY_TOOL_DIR",
    )]
    tool_dir: Option<PathBuf>,
    /// Where uploads are kept while the tool runs. Defaults to a folder in the temp directory.
    #[arg(
        long,
        value_name = "DIR",
        value_hint = ValueHint::DirPath,
        env = "YTRELAY_UPLOAD_DIR",
    )]
    upload_dir: Option<PathBuf>,
    /// The directory the client form is served from.
    ///
    /// Pass `--static-dir .` to serve the working directory itself, including anything else in it.
    #[arg(
        long,
        value_name = "DIR",
        value_hint = ValueHint::DirPath,
        default_value = "static",
        env = "YTRELAY_STATIC_DIR",
    )]
    static_dir: PathBuf,
    /// Maximum request body size in bytes. Unlimited if unset.
    #[arg(long, value_name = "BYTES", env = "YTRELAY_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,
    /// Periodically delete uploads older than this many seconds.
    ///
    /// Clamped to at least 60. Must be longer than any tool run, otherwise in-flight uploads are removed.
    #[arg(long, value_name = "SECONDS", env = "YTRELAY_UPLOAD_MAX_AGE")]
    upload_max_age: Option<u64>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT (ctrl+c) handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => log::info!("received SIGINT (ctrl+c), shutting down"),
        () = terminate => log::info!("received SIGTERM, shutting down"),
    }
}
