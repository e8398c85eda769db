use std::num::NonZeroUsize;

use clap::Parser;
use influxdb_http_client::Precision;
use tokio::{fs, io};
use tracing::info;

use super::common::{DatabaseConfig, InfluxDbConfig};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Client(#[from] influxdb_http_client::Error),

    #[error("error reading file: {0}")]
    Io(#[from] io::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
#[clap(visible_alias = "w")]
pub(crate) struct Config {
    /// Common InfluxDB config
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    #[clap(flatten)]
    database: DatabaseConfig,

    /// File path to load the line protocol from
    #[clap(short = 'f', long = "file")]
    file_path: String,

    /// Send the lines in batches of this many, one request per batch
    #[clap(long = "batch-size")]
    batch_size: Option<NonZeroUsize>,

    /// Precision of the timestamps in the file: n, u, ms, s, m or h
    #[clap(long = "precision")]
    precision: Option<Precision>,

    /// Write into this retention policy instead of the database default
    #[clap(long = "retention-policy")]
    retention_policy: Option<String>,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let client = config.influxdb_config.client()?;

    let contents = fs::read_to_string(&config.file_path).await?;
    let lines = non_empty_lines(&contents);
    info!(lines = lines.len(), file = %config.file_path, "read line protocol");

    let mut request = client.write(config.database.database_name, lines);
    if let Some(rp) = config.retention_policy {
        request = request.retention_policy(rp);
    }
    if let Some(precision) = config.precision {
        request = request.precision(precision);
    }
    if let Some(batch_size) = config.batch_size {
        request = request.batch_size(batch_size);
    }
    request.send().await?;

    println!("success");

    Ok(())
}

fn non_empty_lines(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}
