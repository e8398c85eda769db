//! The `/write` API

use std::num::NonZeroUsize;

use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::{
    Client, Precision, RequestBody, Result,
    batch::batches,
    point::LineProtocol,
};

impl Client {
    /// Compose a request to the `/write` API for the points in `points`
    ///
    /// # Example
    /// ```no_run
    /// # use std::num::NonZeroUsize;
    /// # use influxdb_http_client::{Client, DataPoint, Precision};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let client = Client::new("localhost")?;
    /// let points = (0..10_000).map(|i| {
    ///     DataPoint::builder("cpu")
    ///         .tag("host", "server01")
    ///         .field("usage", 0.5)
    ///         .timestamp(i)
    ///         .build()
    /// });
    /// client
    ///     .write("telemetry", points.collect::<Result<Vec<_>, _>>()?)
    ///     .precision(Precision::Second)
    ///     .batch_size(NonZeroUsize::new(5_000).unwrap())
    ///     .send()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn write<P: LineProtocol>(
        &self,
        database: impl Into<String>,
        points: impl IntoIterator<Item = P>,
    ) -> WriteRequestBuilder<'_, P> {
        WriteRequestBuilder {
            client: self,
            database: database.into(),
            points: points.into_iter().collect(),
            retention_policy: None,
            precision: None,
            batch_size: None,
        }
    }
}

/// Builder type for composing a request to `/write`
///
/// Produced by [`Client::write`] and [`Database::write`][crate::Database::write]
#[derive(Debug)]
pub struct WriteRequestBuilder<'c, P> {
    client: &'c Client,
    database: String,
    points: Vec<P>,
    retention_policy: Option<String>,
    precision: Option<Precision>,
    batch_size: Option<NonZeroUsize>,
}

/// The URL parameters of the request to the `/write` API
#[derive(Debug, Serialize)]
struct WriteParams<'a> {
    db: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rp: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<Precision>,
}

impl<P> WriteRequestBuilder<'_, P> {
    /// Write into the retention policy `rp` instead of the database default
    pub fn retention_policy(mut self, rp: impl Into<String>) -> Self {
        self.retention_policy = Some(rp.into());
        self
    }

    /// Set the precision of the point timestamps
    pub fn precision(mut self, set_to: Precision) -> Self {
        self.precision = Some(set_to);
        self
    }

    /// Send the points in chunks of `size`, one request per chunk
    pub fn batch_size(mut self, size: NonZeroUsize) -> Self {
        self.batch_size = Some(size);
        self
    }
}

impl<P: LineProtocol + Send> WriteRequestBuilder<'_, P> {
    /// Send the request(s) to the server
    ///
    /// Batches are sent in order and the first failure stops the write; batches sent before
    /// it are not rolled back. Writing no points makes no request.
    pub async fn send(self) -> Result<()> {
        let Self {
            client,
            database,
            points,
            retention_policy,
            precision,
            batch_size,
        } = self;
        let params = WriteParams {
            db: &database,
            rp: retention_policy.as_deref(),
            precision,
        };

        let batch_size = batch_size
            .or_else(|| NonZeroUsize::new(points.len()))
            .unwrap_or(NonZeroUsize::MIN);
        for (i, batch) in batches(points, batch_size).enumerate() {
            let body = render(&batch);
            debug!(
                database = params.db,
                batch = i,
                points = batch.len(),
                "writing batch"
            );
            client
                .send_get_bytes(Method::POST, "/write", Some(&params), Some(body))
                .await?;
        }
        Ok(())
    }
}

fn render<P: LineProtocol>(points: &[P]) -> RequestBody {
    let lines: Vec<String> = points.iter().map(LineProtocol::to_line_protocol).collect();
    RequestBody::Text(lines.join("\n"))
}
