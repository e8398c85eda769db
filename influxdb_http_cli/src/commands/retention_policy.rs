use clap::Parser;

use super::common::{DatabaseConfig, InfluxDbConfig, parse_replication};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Client(#[from] influxdb_http_client::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
#[clap(visible_alias = "rp")]
pub(crate) struct Config {
    #[clap(subcommand)]
    cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// List the retention policies of a database
    List(ListConfig),
    /// Create a retention policy on a database
    Create(CreateConfig),
    /// Drop a retention policy from a database
    Drop(DropConfig),
}

#[derive(Debug, Parser)]
struct ListConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    #[clap(flatten)]
    database: DatabaseConfig,
}

#[derive(Debug, Parser)]
struct CreateConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    #[clap(flatten)]
    database: DatabaseConfig,

    /// The name of the retention policy
    name: String,

    /// How long data is kept, e.g., `1d`, `4w` or `INF`
    #[clap(long = "duration")]
    duration: String,

    /// Number of copies of the data kept in the cluster
    #[clap(long = "replication", default_value = "1", value_parser = parse_replication)]
    replication: u32,

    /// Make this the default retention policy of the database
    #[clap(long = "default")]
    default: bool,
}

#[derive(Debug, Parser)]
struct DropConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    #[clap(flatten)]
    database: DatabaseConfig,

    /// The name of the retention policy
    name: String,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    match config.cmd {
        SubCommand::List(ListConfig {
            influxdb_config,
            database,
        }) => {
            let client = influxdb_config.client()?;
            let policies = client
                .database(database.database_name)
                .get_retention_policies()
                .await?;
            for rp in policies {
                let default = if rp.default() { " (default)" } else { "" };
                println!(
                    "{} duration={} replication={}{default}",
                    rp.name(),
                    rp.duration(),
                    rp.replication()
                );
            }
        }
        SubCommand::Create(CreateConfig {
            influxdb_config,
            database,
            name,
            duration,
            replication,
            default,
        }) => {
            let client = influxdb_config.client()?;
            let rp = client
                .database(database.database_name)
                .create_retention_policy(name, duration, replication, default)
                .await?;
            println!(
                "Retention policy {:?} created on {:?}",
                rp.name(),
                rp.database().name()
            );
        }
        SubCommand::Drop(DropConfig {
            influxdb_config,
            database,
            name,
        }) => {
            let client = influxdb_config.client()?;
            client
                .database(database.database_name.as_str())
                .drop_retention_policy(&name)
                .await?;
            println!(
                "Retention policy {name:?} dropped from {:?}",
                database.database_name
            );
        }
    }
    Ok(())
}
