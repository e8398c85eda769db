use clap::Parser;

use super::common::InfluxDbConfig;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Client(#[from] influxdb_http_client::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Common InfluxDB config
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let client = config.influxdb_config.client()?;
    let resp = client.ping().await?;
    match resp.version() {
        Some(version) => println!("pong from {} (InfluxDB {version})", client.base_url()),
        None => println!("pong from {}", client.base_url()),
    }
    Ok(())
}
