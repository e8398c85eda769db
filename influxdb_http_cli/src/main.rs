//! Entrypoint of the influxdb-http binary

use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

mod commands {
    pub(crate) mod common;
    pub(crate) mod database;
    pub(crate) mod ping;
    pub(crate) mod query;
    pub(crate) mod retention_policy;
    pub(crate) mod user;
    pub(crate) mod write;
}

enum ReturnCode {
    Failure = 1,
}

#[derive(Debug, clap::Parser)]
#[clap(
    name = "influxdb-http",
    version,
    about = "Command line tools for the InfluxDB 0.9 HTTP API",
    long_about = r#"Command line tools for the InfluxDB 0.9 HTTP API

Examples:
    # Check that the server is up
    influxdb-http ping --host http://localhost:8086

    # Run a query against a database
    influxdb-http query -d telemetry "SELECT * FROM cpu LIMIT 10"

    # Write a file of line protocol in batches of 5000 lines
    influxdb-http write -d telemetry --file metrics.lp --batch-size 5000

    # Show every request sent to the server
    influxdb-http -vv database list

    # Full debug logging specified with LOG_FILTER
    LOG_FILTER=debug influxdb-http database list
"#
)]
struct Config {
    /// Log more, repeat for even more
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// Check that a server is up and report its version
    Ping(commands::ping::Config),

    /// Run an InfluxQL query against a running server
    Query(commands::query::Config),

    /// Write line protocol from a file to a running server
    Write(commands::write::Config),

    /// Manage databases
    Database(commands::database::Config),

    /// Manage users and their privileges
    User(commands::user::Config),

    /// Manage the retention policies of a database
    RetentionPolicy(commands::retention_policy::Config),
}

fn main() -> Result<(), std::io::Error> {
    // load all environment variables from .env before doing anything
    load_dotenv();

    let config: Config = clap::Parser::parse();

    if let Err(e) = init_logs(config.verbose) {
        eprintln!("Initializing logs failed: {e}");
        std::process::exit(ReturnCode::Failure as _);
    }

    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tokio_runtime.block_on(async move {
        match config.command {
            None => println!("command required, -h/--help for help"),
            Some(Command::Ping(config)) => {
                if let Err(e) = commands::ping::command(config).await {
                    eprintln!("Ping command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Query(config)) => {
                if let Err(e) = commands::query::command(config).await {
                    eprintln!("Query command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Write(config)) => {
                if let Err(e) = commands::write::command(config).await {
                    eprintln!("Write command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Database(config)) => {
                if let Err(e) = commands::database::command(config).await {
                    eprintln!("Database command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::User(config)) => {
                if let Err(e) = commands::user::command(config).await {
                    eprintln!("User command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::RetentionPolicy(config)) => {
                if let Err(e) = commands::retention_policy::command(config).await {
                    eprintln!("Retention policy command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
        }
    });

    Ok(())
}

/// Source the .env file before initialising the Config struct - this sets
/// any envs in the file, which the Config struct then uses.
///
/// Precedence is given to existing env variables.
fn load_dotenv() {
    match dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            // a missing env file is not an error
        }
        Err(e) => {
            eprintln!("FATAL Error loading config from: {e}");
            eprintln!("Aborting");
            std::process::exit(ReturnCode::Failure as _);
        }
    };
}

/// `LOG_FILTER` takes precedence over the verbosity flag
fn init_logs(verbose: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_env("LOG_FILTER") {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_log_filter(verbose)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}

fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
