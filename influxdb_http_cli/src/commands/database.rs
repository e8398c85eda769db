use clap::Parser;

use super::common::{DatabaseConfig, InfluxDbConfig};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Client(#[from] influxdb_http_client::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
#[clap(visible_alias = "db")]
pub(crate) struct Config {
    #[clap(subcommand)]
    cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// List all databases
    List(ListConfig),
    /// Create a database
    Create(ManageConfig),
    /// Drop a database and all of its data
    Drop(ManageConfig),
}

#[derive(Debug, Parser)]
struct ListConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,
}

#[derive(Debug, Parser)]
struct ManageConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    #[clap(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    match config.cmd {
        SubCommand::List(ListConfig { influxdb_config }) => {
            let client = influxdb_config.client()?;
            for name in client.get_database_names().await? {
                println!("{name}");
            }
        }
        SubCommand::Create(ManageConfig {
            influxdb_config,
            database,
        }) => {
            let client = influxdb_config.client()?;
            client.create_database(&database.database_name).await?;
            println!("Database {:?} created successfully", database.database_name);
        }
        SubCommand::Drop(ManageConfig {
            influxdb_config,
            database,
        }) => {
            let client = influxdb_config.client()?;
            client.drop_database(&database.database_name).await?;
            println!("Database {:?} dropped successfully", database.database_name);
        }
    }
    Ok(())
}
