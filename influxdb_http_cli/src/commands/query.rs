use clap::Parser;
use influxdb_http_client::{Precision, Series};

use super::common::{Format, InfluxDbConfig, format_pretty};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Client(#[from] influxdb_http_client::Error),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("failed to format results as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
#[clap(visible_alias = "q", trailing_var_arg = true)]
pub(crate) struct Config {
    /// Common InfluxDB config
    #[clap(flatten)]
    influxdb_config: InfluxDbConfig,

    /// The database to run the query against
    #[clap(short = 'd', long = "database", env = "INFLUXDB_DATABASE_NAME")]
    database_name: Option<String>,

    /// Return timestamps as epochs of this precision: n, u, ms, s, m or h
    #[clap(long = "epoch")]
    epoch: Option<Precision>,

    /// The format in which to output the query results
    #[clap(value_enum, long = "format", default_value = "pretty")]
    output_format: Format,

    /// The InfluxQL query string to execute
    query: Vec<String>,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let client = config.influxdb_config.client()?;
    let query = parse_query(config.query)?;

    let mut request = client.query(query);
    if let Some(database_name) = config.database_name {
        request = request.database(database_name);
    }
    if let Some(epoch) = config.epoch {
        request = request.epoch(epoch);
    }
    let results = request.send().await?;

    match config.output_format {
        Format::Pretty => print!("{}", format_pretty(&results)),
        Format::Json => {
            let series: Vec<&[Series]> = results.iter().map(|r| r.series()).collect();
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum QueryError {
    #[error("no query provided")]
    NoQuery,

    #[error(
        "ensure that a single query string is provided as the final \
        argument, enclosed in quotes"
    )]
    MoreThanOne,
}

/// Parse the user-inputted query string
fn parse_query(mut input: Vec<String>) -> Result<String> {
    if input.is_empty() {
        Err(QueryError::NoQuery)?
    }
    if input.len() > 1 {
        Err(QueryError::MoreThanOne)?
    } else {
        Ok(input.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_query_string() {
        assert_eq!(
            parse_query(vec!["SHOW DATABASES".into()]).unwrap(),
            "SHOW DATABASES"
        );
        assert!(matches!(
            parse_query(vec![]),
            Err(Error::Query(QueryError::NoQuery))
        ));
        assert!(matches!(
            parse_query(vec!["SHOW".into(), "DATABASES".into()]),
            Err(Error::Query(QueryError::MoreThanOne))
        ));
    }
}
