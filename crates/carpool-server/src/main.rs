use carpool_core::BookingEngine;
use carpool_schema::{parse_policy_file, BookingPolicy};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "carpool-server", about = "Car-pooling booking engine over HTTP")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8321)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Number of worker threads serving requests.
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Booking policy file (TOML). Built-in defaults apply when omitted.
    #[arg(long)]
    policy: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let policy = match &cli.policy {
        Some(path) => match parse_policy_file(path) {
            Ok(policy) => {
                info!("loaded booking policy from {}", path.display());
                policy
            }
            Err(e) => {
                error!("invalid policy file {}: {e}", path.display());
                return ExitCode::from(2);
            }
        },
        None => BookingPolicy::default(),
    };

    let addr = format!("{}:{}", cli.bind, cli.port);
    let server = match carpool_server::bind(&addr) {
        Ok(server) => server,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    info!("starting carpool-server on {addr}");
    info!(
        "policy: lead {}m, start grace {}m, cancel grace {}m, overbooking {}",
        policy.lead_time_minutes,
        policy.start_grace_minutes,
        policy.cancel_grace_minutes,
        if policy.allow_overbooking { "allowed" } else { "refused" }
    );

    let workers = cli.workers.max(1);
    let stopper = Arc::clone(&server);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nshutdown requested, draining workers...");
        carpool_server::shutdown(&stopper, workers);
    }) {
        error!("failed to install signal handler: {e}");
    }

    let engine = Arc::new(BookingEngine::new(policy));
    carpool_server::run_server(&engine, &server, workers);
    ExitCode::SUCCESS
}
