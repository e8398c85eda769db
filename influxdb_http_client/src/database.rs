use serde_json::Value;

use crate::{
    Client, DatabaseUsers, Error, LineProtocol, QueryRequestBuilder, Result, RetentionPolicy,
    WriteRequestBuilder,
    query::quote_ident,
};

/// Handle on a single database
///
/// Creating the handle makes no request; use [`Database::create`] to create the database on
/// the server.
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    name: String,
}

impl Database {
    pub fn new(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn create(&self) -> Result<()> {
        self.client.create_database(self.name.as_str()).await
    }

    pub async fn drop(&self) -> Result<()> {
        self.client.drop_database(self.name.as_str()).await
    }

    /// Same as [`Database::drop`]
    pub async fn delete(&self) -> Result<()> {
        self.drop().await
    }

    /// Compose a `/query` request against this database
    pub fn query(&self, query: impl Into<String>) -> QueryRequestBuilder<'_> {
        self.client.query(query).database(self.name.as_str())
    }

    /// Compose a `/write` request into this database
    pub fn write<P: LineProtocol>(
        &self,
        points: impl IntoIterator<Item = P>,
    ) -> WriteRequestBuilder<'_, P> {
        self.client.write(self.name.as_str(), points)
    }

    /// The database users, managed through the JSON administrative endpoints
    pub fn users(&self) -> DatabaseUsers {
        DatabaseUsers::new(self.clone())
    }

    /// List the measurement names in this database
    pub async fn get_measurements(&self) -> Result<Vec<String>> {
        self.client
            .execute_on(&self.name, "SHOW MEASUREMENTS")
            .await?
            .string_column("name")
    }

    /// Get a handle on a retention policy of this database, no request is made
    pub fn retention_policy(
        &self,
        name: impl Into<String>,
        duration: impl Into<String>,
        replication: u32,
        default: bool,
    ) -> RetentionPolicy {
        RetentionPolicy::new(self.clone(), name, duration, replication, default)
    }

    /// List the retention policies of this database
    pub async fn get_retention_policies(&self) -> Result<Vec<RetentionPolicy>> {
        let statement = format!("SHOW RETENTION POLICIES ON {}", quote_ident(&self.name));
        self.client
            .execute(statement)
            .await?
            .points()
            .map(|point| {
                let name = point.get("name").and_then(Value::as_str);
                let duration = point.get("duration").and_then(Value::as_str);
                let replication = point
                    .get("replicaN")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok());
                let default = point
                    .get("default")
                    .and_then(Value::as_bool)
                    .unwrap_or_default();
                match (name, duration, replication) {
                    (Some(name), Some(duration), Some(replication)) => {
                        Ok(self.retention_policy(name, duration, replication, default))
                    }
                    _ => Err(Error::UnexpectedResponse(format!(
                        "malformed retention policy row: {point:?}"
                    ))),
                }
            })
            .collect()
    }

    /// Create a retention policy on this database and return a handle on it
    pub async fn create_retention_policy(
        &self,
        name: impl Into<String> + Send,
        duration: impl Into<String> + Send,
        replication: u32,
        default: bool,
    ) -> Result<RetentionPolicy> {
        let rp = self.retention_policy(name, duration, replication, default);
        let mut statement = format!(
            "CREATE RETENTION POLICY {} ON {} DURATION {} REPLICATION {}",
            quote_ident(rp.name()),
            quote_ident(&self.name),
            rp.duration(),
            rp.replication(),
        );
        if default {
            statement.push_str(" DEFAULT");
        }
        self.client.execute(statement).await?;
        Ok(rp)
    }

    /// Change a retention policy of this database
    ///
    /// Only the given settings are changed. `default = false` leaves the default policy as is.
    pub async fn alter_retention_policy(
        &self,
        name: &str,
        duration: Option<&str>,
        replication: Option<u32>,
        default: bool,
    ) -> Result<()> {
        if duration.is_none() && replication.is_none() && !default {
            return Err(Error::InvalidArgument(format!(
                "nothing to alter on retention policy {name}"
            )));
        }
        let mut statement = format!(
            "ALTER RETENTION POLICY {} ON {}",
            quote_ident(name),
            quote_ident(&self.name)
        );
        if let Some(duration) = duration {
            statement.push_str(&format!(" DURATION {duration}"));
        }
        if let Some(replication) = replication {
            statement.push_str(&format!(" REPLICATION {replication}"));
        }
        if default {
            statement.push_str(" DEFAULT");
        }
        self.client.execute(statement).await.map(drop)
    }

    pub async fn drop_retention_policy(&self, name: &str) -> Result<()> {
        let statement = format!(
            "DROP RETENTION POLICY {} ON {}",
            quote_ident(name),
            quote_ident(&self.name)
        );
        self.client.execute(statement).await.map(drop)
    }
}

impl AsRef<str> for Database {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const OK_BODY: &str = r#"{"results":[{}]}"#;

    #[tokio::test]
    async fn create_and_drop() {
        let mut mock_server = Server::new_async().await;
        let mut mocks = Vec::new();
        for name in ["foo", "bar", "fubar"] {
            for verb in ["CREATE", "DROP"] {
                mocks.push(
                    mock_server
                        .mock("GET", "/query")
                        .match_query(Matcher::UrlEncoded(
                            "q".into(),
                            format!("{verb} DATABASE {name}"),
                        ))
                        .with_status(200)
                        .with_body(OK_BODY)
                        .create_async()
                        .await,
                );
            }
        }

        let client = Client::new(mock_server.url()).expect("create client");
        for name in ["foo", "bar", "fubar"] {
            let db = client.database(name);
            db.create().await.expect("create database");
            db.drop().await.expect("drop database");
        }

        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn query_is_bound_to_the_database() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "SHOW MEASUREMENTS".into()),
                Matcher::UrlEncoded("db".into(), "foo".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "results": [{
                        "series": [{
                            "name": "measurements",
                            "columns": ["name"],
                            "values": [["cpu"], ["mem"]]
                        }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let measurements = client
            .database("foo")
            .get_measurements()
            .await
            .expect("list measurements");

        assert_eq!(measurements, vec!["cpu".to_string(), "mem".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_retention_policies() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "SHOW RETENTION POLICIES ON foo".into(),
            ))
            .with_status(200)
            .with_body(
                json!({
                    "results": [{
                        "series": [{
                            "columns": ["name", "duration", "replicaN", "default"],
                            "values": [
                                ["default", "0", 1, true],
                                ["week", "168h0m0s", 2, false]
                            ]
                        }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let policies = client
            .database("foo")
            .get_retention_policies()
            .await
            .expect("list retention policies");

        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0].name(), "default");
        assert_eq!(policies[0].duration(), "0");
        assert_eq!(policies[0].replication(), 1);
        assert!(policies[0].default());
        assert_eq!(policies[1].name(), "week");
        assert_eq!(policies[1].replication(), 2);
        assert!(!policies[1].default());
        assert_eq!(policies[1].database().name(), "foo");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_retention_policy() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "CREATE RETENTION POLICY bar ON foo DURATION 1d REPLICATION 1 DEFAULT".into(),
            ))
            .with_status(200)
            .with_body(OK_BODY)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let rp = client
            .database("foo")
            .create_retention_policy("bar", "1d", 1, true)
            .await
            .expect("create retention policy");

        assert_eq!(rp.name(), "bar");
        assert_eq!(rp.duration(), "1d");
        assert!(rp.default());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn alter_retention_policy() {
        let cases: [(Option<&str>, Option<u32>, bool, &str); 4] = [
            (Some("30d"), None, false, " DURATION 30d"),
            (None, Some(2), false, " REPLICATION 2"),
            (None, None, true, " DEFAULT"),
            (Some("30d"), Some(2), true, " DURATION 30d REPLICATION 2 DEFAULT"),
        ];

        for (duration, replication, default, suffix) in cases {
            let mut mock_server = Server::new_async().await;
            let mock = mock_server
                .mock("GET", "/query")
                .match_query(Matcher::UrlEncoded(
                    "q".into(),
                    format!("ALTER RETENTION POLICY bar ON foo{suffix}"),
                ))
                .with_status(200)
                .with_body(OK_BODY)
                .create_async()
                .await;

            let client = Client::new(mock_server.url()).expect("create client");
            client
                .database("foo")
                .alter_retention_policy("bar", duration, replication, default)
                .await
                .expect("alter retention policy");

            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn alter_retention_policy_needs_a_change() {
        let client = Client::new("localhost").expect("create client");
        let err = client
            .database("foo")
            .alter_retention_policy("bar", None, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn drop_retention_policy_of_missing_database() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "DROP RETENTION POLICY bar ON foo".into(),
            ))
            .with_status(200)
            .with_body(r#"{"results":[{"error":"database not found"}]}"#)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let err = client
            .database("foo")
            .drop_retention_policy("bar")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "database not found");
        mock.assert_async().await;
    }
}
