//! The `/query` API and the result sets it responds with

use std::{borrow::Cow, collections::BTreeMap};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Client, Error, Result};

/// A single row of a [`Series`], keyed by column name, with the series tags merged in
pub type Point = BTreeMap<String, Value>;

/// Time precision, used for the `epoch` of query results and the `precision` of writes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Precision {
    #[serde(rename = "n")]
    Nanosecond,
    #[serde(rename = "u")]
    Microsecond,
    #[serde(rename = "ms")]
    Millisecond,
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "m")]
    Minute,
    #[serde(rename = "h")]
    Hour,
}

impl Precision {
    /// The value sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nanosecond => "n",
            Self::Microsecond => "u",
            Self::Millisecond => "ms",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
        }
    }
}

impl std::str::FromStr for Precision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "n" | "ns" => Ok(Self::Nanosecond),
            "u" | "us" => Ok(Self::Microsecond),
            "ms" => Ok(Self::Millisecond),
            "s" => Ok(Self::Second),
            "m" => Ok(Self::Minute),
            "h" => Ok(Self::Hour),
            _ => Err(Error::InvalidArgument(format!(
                "{s} is not a valid precision, values are n, u, ms, s, m, and h"
            ))),
        }
    }
}

/// Used to compose a request to the `/query` API
///
/// Produced by [`Client::query`] and [`Database::query`][crate::Database::query].
#[derive(Debug)]
pub struct QueryRequestBuilder<'c> {
    client: &'c Client,
    query: String,
    database: Option<String>,
    epoch: Option<Precision>,
}

impl<'c> QueryRequestBuilder<'c> {
    pub(crate) fn new(client: &'c Client, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
            database: None,
            epoch: None,
        }
    }

    /// Run the query against the database `db`
    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    /// Return timestamps as epochs of the given precision instead of RFC3339 strings
    pub fn epoch(mut self, epoch: Precision) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Send the request, returning one [`ResultSet`] per statement in the query
    ///
    /// A statement that failed on the server is reported as an [`Error::Query`].
    pub async fn send(self) -> Result<Vec<ResultSet>> {
        let params = QueryParams {
            query: &self.query,
            db: self.database.as_deref(),
            epoch: self.epoch,
        };
        let content = self
            .client
            .send_get_bytes(Method::GET, "/query", Some(&params), None)
            .await?
            .ok_or_else(|| Error::UnexpectedResponse("empty body from /query".into()))?;

        let response: QueryResponse = serde_json::from_slice(&content).map_err(Error::Json)?;
        response.into_result_sets()
    }
}

/// URL parameters of a request to the `/query` API
#[derive(Debug, Serialize)]
struct QueryParams<'a> {
    #[serde(rename = "q")]
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    epoch: Option<Precision>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Option<Vec<Series>>,
    #[serde(default)]
    error: Option<String>,
}

impl QueryResponse {
    fn into_result_sets(self) -> Result<Vec<ResultSet>> {
        if let Some(message) = self.error {
            return Err(Error::Query { message });
        }
        self.results
            .into_iter()
            .map(|result| match result.error {
                Some(message) => Err(Error::Query { message }),
                None => Ok(ResultSet {
                    series: result.series.unwrap_or_default(),
                }),
            })
            .collect()
    }
}

/// A table of rows returned for one measurement and tag set
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Series {
    /// Absent for some `SHOW` statements
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl Series {
    /// Iterate the rows as [`Point`]s
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.values.iter().map(move |row| {
            let mut point: Point = self
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            point.extend(self.columns.iter().cloned().zip(row.iter().cloned()));
            point
        })
    }

    fn matches(&self, measurement: Option<&str>, tags: &BTreeMap<String, String>) -> bool {
        measurement.is_none_or(|m| self.name.as_deref() == Some(m))
            && tags.iter().all(|(k, v)| self.tags.get(k) == Some(v))
    }
}

/// The result of a single statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    series: Vec<Series>,
}

impl ResultSet {
    pub fn new(series: Vec<Series>) -> Self {
        Self { series }
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.values.is_empty())
    }

    /// The `(name, tags)` of each series in the result
    pub fn keys(&self) -> Vec<(Option<&str>, &BTreeMap<String, String>)> {
        self.series
            .iter()
            .map(|s| (s.name.as_deref(), &s.tags))
            .collect()
    }

    /// Every row of every series
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.series.iter().flat_map(Series::points)
    }

    /// Rows of the series named `measurement` (any, if `None`) that carry all of `tags`
    pub fn points_for<'a>(
        &'a self,
        measurement: Option<&'a str>,
        tags: &'a BTreeMap<String, String>,
    ) -> impl Iterator<Item = Point> + 'a {
        self.series
            .iter()
            .filter(move |s| s.matches(measurement, tags))
            .flat_map(Series::points)
    }

    /// Values of a string column across all rows, e.g., the `name` of `SHOW DATABASES`
    pub(crate) fn string_column(&self, column: &str) -> Result<Vec<String>> {
        self.points()
            .map(|point| match point.get(column) {
                Some(Value::String(s)) => Ok(s.clone()),
                other => Err(Error::UnexpectedResponse(format!(
                    "expected a string in column '{column}', got {other:?}"
                ))),
            })
            .collect()
    }
}

impl Client {
    /// Run a single statement and return its result set
    pub(crate) async fn execute(&self, statement: impl Into<String> + Send) -> Result<ResultSet> {
        let results = self.query(statement).send().await?;
        Ok(results.into_iter().next().unwrap_or_default())
    }

    /// Run a single statement against `database` and return its result set
    pub(crate) async fn execute_on(
        &self,
        database: &str,
        statement: impl Into<String> + Send,
    ) -> Result<ResultSet> {
        let results = self.query(statement).database(database).send().await?;
        Ok(results.into_iter().next().unwrap_or_default())
    }
}

/// InfluxQL keywords, sorted; an identifier spelled like one must be quoted
const KEYWORDS: &[&str] = &[
    "ALL", "ALTER", "ANALYZE", "AND", "ANY", "AS", "ASC", "BEGIN", "BY", "CARDINALITY",
    "CONTINUOUS", "CREATE", "DATABASE", "DATABASES", "DEFAULT", "DELETE", "DESC",
    "DESTINATIONS", "DIAGNOSTICS", "DISTINCT", "DROP", "DURATION", "END", "EVERY", "EXACT",
    "EXPLAIN", "FALSE", "FIELD", "FOR", "FROM", "GRANT", "GRANTS", "GROUP", "GROUPS", "IN",
    "INF", "INSERT", "INTO", "KEY", "KEYS", "KILL", "LIMIT", "MEASUREMENT", "MEASUREMENTS",
    "NAME", "NOT", "OFFSET", "ON", "OR", "ORDER", "PASSWORD", "POLICIES", "POLICY",
    "PRIVILEGES", "QUERIES", "QUERY", "READ", "REPLICATION", "RESAMPLE", "RETENTION", "REVOKE",
    "SELECT", "SERIES", "SET", "SHARD", "SHARDS", "SHOW", "SLIMIT", "SOFFSET", "STATS",
    "SUBSCRIPTION", "SUBSCRIPTIONS", "TAG", "TO", "TRUE", "USER", "USERS", "VALUES", "WHERE",
    "WITH", "WRITE",
];

fn is_keyword(ident: &str) -> bool {
    KEYWORDS
        .binary_search(&ident.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Format an identifier for an InfluxQL statement, quoting it only when needed
///
/// Keywords such as `default` are always quoted.
pub fn quote_ident(ident: &str) -> Cow<'_, str> {
    let mut chars = ident.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_keyword(ident);
    if bare {
        Cow::Borrowed(ident)
    } else {
        Cow::Owned(format!(
            "\"{}\"",
            ident.replace('\\', "\\\\").replace('"', "\\\"")
        ))
    }
}

/// Format a string literal for an InfluxQL statement
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
