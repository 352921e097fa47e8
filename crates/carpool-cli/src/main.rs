mod client;
mod commands;
mod time;

use clap::{Parser, Subcommand};
use client::CarpoolClient;
use commands::trips::TripArgs;
use commands::users::ProfileArgs;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "carpool", version, about = "Command-line client for the carpool booking server")]
struct Cli {
    /// Base URL of the carpool server.
    #[arg(
        long,
        env = "CARPOOL_SERVER",
        default_value = "http://127.0.0.1:8321",
        global = true
    )]
    server: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage registered users.
    #[command(subcommand)]
    Users(UserCommand),
    /// Publish, join and run trips.
    #[command(subcommand)]
    Trips(TripCommand),
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// List all users.
    List,
    /// Show one user.
    Show { user_id: String },
    /// Register a new user.
    Create {
        user_id: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Replace a user's profile.
    Update {
        user_id: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Delete a user (only once the account is old enough).
    Delete { user_id: String },
}

#[derive(Debug, Subcommand)]
enum TripCommand {
    /// List all trips.
    List,
    /// Show one trip.
    Show { trip_id: String },
    /// Publish a new trip.
    Create {
        trip_id: String,
        #[command(flatten)]
        trip: TripArgs,
    },
    /// Change a published trip. Enrolled passengers are kept.
    Update {
        trip_id: String,
        #[command(flatten)]
        trip: TripArgs,
    },
    /// Enroll a passenger in a trip.
    Enroll { trip_id: String, user_id: String },
    /// Start a trip.
    Start {
        trip_id: String,
        /// Car owner starting the trip.
        #[arg(long = "as")]
        caller: String,
    },
    /// Cancel a trip that has not started.
    Cancel { trip_id: String },
    /// Show whether a trip has started and who is on it.
    Status { trip_id: String },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CARPOOL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let client = CarpoolClient::new(&cli.server);
    let json = cli.json;

    let result = match cli.command {
        Commands::Users(cmd) => match cmd {
            UserCommand::List => commands::users::list(&client, json),
            UserCommand::Show { user_id } => commands::users::show(&client, &user_id, json),
            UserCommand::Create { user_id, profile } => {
                commands::users::create(&client, &user_id, profile, json)
            }
            UserCommand::Update { user_id, profile } => {
                commands::users::update(&client, &user_id, profile, json)
            }
            UserCommand::Delete { user_id } => commands::users::delete(&client, &user_id, json),
        },
        Commands::Trips(cmd) => match cmd {
            TripCommand::List => commands::trips::list(&client, json),
            TripCommand::Show { trip_id } => commands::trips::show(&client, &trip_id, json),
            TripCommand::Create { trip_id, trip } => {
                commands::trips::save(&client, true, &trip_id, trip, json)
            }
            TripCommand::Update { trip_id, trip } => {
                commands::trips::save(&client, false, &trip_id, trip, json)
            }
            TripCommand::Enroll { trip_id, user_id } => {
                commands::trips::enroll(&client, &trip_id, &user_id, json)
            }
            TripCommand::Start { trip_id, caller } => {
                commands::trips::start(&client, &trip_id, &caller, json)
            }
            TripCommand::Cancel { trip_id } => commands::trips::cancel(&client, &trip_id, json),
            TripCommand::Status { trip_id } => commands::trips::status(&client, &trip_id, json),
        },
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            if json {
                let body = serde_json::json!({
                    "error": err.kind().unwrap_or("client_error"),
                    "message": err.to_string(),
                });
                eprintln!("{body}");
            } else {
                eprintln!("error: {err}");
            }
            ExitCode::from(commands::exit_code(&err))
        }
    }
}
