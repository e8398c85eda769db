use clap::Parser;
use influxdb_http_client::Privilege;
use secrecy::{ExposeSecret, Secret};

use super::common::InfluxDbConfig;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Client(#[from] influxdb_http_client::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
pub(crate) struct Config {
    #[clap(subcommand)]
    cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// List all users
    List(ListConfig),
    /// Create a user
    Create(CreateConfig),
    /// Drop a user
    Drop(NameConfig),
    /// Change the password of a user
    Password(PasswordConfig),
    /// Grant a privilege on a database to a user
    Grant(PrivilegeConfig),
    /// Revoke a privilege on a database from a user
    Revoke(PrivilegeConfig),
}

#[derive(Debug, Parser)]
struct ListConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,
}

#[derive(Debug, Parser)]
struct NameConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    /// The name of the user
    name: String,
}

#[derive(Debug, Parser)]
struct CreateConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    /// The name of the user
    name: String,

    /// The password of the new user
    #[clap(long = "user-password")]
    user_password: Secret<String>,

    /// Grant cluster-wide admin privileges
    #[clap(long = "admin")]
    admin: bool,
}

#[derive(Debug, Parser)]
struct PasswordConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    /// The name of the user
    name: String,

    /// The new password
    #[clap(long = "new-password")]
    new_password: Secret<String>,
}

#[derive(Debug, Parser)]
struct PrivilegeConfig {
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    /// The name of the user
    name: String,

    /// READ, WRITE or ALL
    privilege: Privilege,

    /// The database the privilege applies to
    #[clap(short = 'd', long = "database", env = "INFLUXDB_DATABASE_NAME")]
    database_name: String,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    match config.cmd {
        SubCommand::List(ListConfig { influxdb_config }) => {
            let client = influxdb_config.client()?;
            for user in client.get_users().await? {
                let role = if user.admin() { " (admin)" } else { "" };
                println!("{}{role}", user.name());
            }
        }
        SubCommand::Create(CreateConfig {
            influxdb_config,
            name,
            user_password,
            admin,
        }) => {
            let client = influxdb_config.client()?;
            client
                .create_user(&name, user_password.expose_secret(), admin)
                .await?;
            println!("User {name:?} created successfully");
        }
        SubCommand::Drop(NameConfig {
            influxdb_config,
            name,
        }) => {
            let client = influxdb_config.client()?;
            client.drop_user(&name).await?;
            println!("User {name:?} dropped successfully");
        }
        SubCommand::Password(PasswordConfig {
            influxdb_config,
            name,
            new_password,
        }) => {
            let client = influxdb_config.client()?;
            client
                .change_user_password(&name, new_password.expose_secret())
                .await?;
            println!("Password of user {name:?} changed successfully");
        }
        SubCommand::Grant(PrivilegeConfig {
            influxdb_config,
            name,
            privilege,
            database_name,
        }) => {
            let client = influxdb_config.client()?;
            client
                .grant_privilege(privilege, &name, &database_name)
                .await?;
            println!("Granted {privilege} on {database_name:?} to {name:?}");
        }
        SubCommand::Revoke(PrivilegeConfig {
            influxdb_config,
            name,
            privilege,
            database_name,
        }) => {
            let client = influxdb_config.client()?;
            client
                .revoke_privilege(privilege, &name, &database_name)
                .await?;
            println!("Revoked {privilege} on {database_name:?} from {name:?}");
        }
    }
    Ok(())
}
