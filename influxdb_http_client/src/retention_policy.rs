use crate::{Database, Result};

/// Handle on a retention policy of a [`Database`]
///
/// The settings held here are the ones last known to the client; they are refreshed by
/// [`RetentionPolicy::alter`] and by [`Database::get_retention_policies`].
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    database: Database,
    name: String,
    duration: String,
    replication: u32,
    default: bool,
}

impl RetentionPolicy {
    pub fn new(
        database: Database,
        name: impl Into<String>,
        duration: impl Into<String>,
        replication: u32,
        default: bool,
    ) -> Self {
        Self {
            database,
            name: name.into(),
            duration: duration.into(),
            replication,
            default,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// e.g., `1d`, `4w` or `INF`
    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn replication(&self) -> u32 {
        self.replication
    }

    /// Whether this is the default policy of its database
    pub fn default(&self) -> bool {
        self.default
    }

    /// Change the given settings on the server, then in this handle
    ///
    /// Nothing is changed locally when the server rejects the statement.
    pub async fn alter(
        &mut self,
        duration: Option<&str>,
        replication: Option<u32>,
        default: bool,
    ) -> Result<()> {
        self.database
            .alter_retention_policy(&self.name, duration, replication, default)
            .await?;
        if let Some(duration) = duration {
            self.duration = duration.to_string();
        }
        if let Some(replication) = replication {
            self.replication = replication;
        }
        if default {
            self.default = true;
        }
        Ok(())
    }

    pub async fn drop(&self) -> Result<()> {
        self.database.drop_retention_policy(&self.name).await
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use crate::{Client, Error};

    #[test]
    fn handle_settings() {
        let client = Client::new("localhost").unwrap();
        let rp = client.database("foo").retention_policy("bar", "1d", 1, false);
        assert_eq!(rp.name(), "bar");
        assert_eq!(rp.duration(), "1d");
        assert_eq!(rp.replication(), 1);
        assert!(!rp.default());
        assert_eq!(rp.database().name(), "foo");
    }

    #[tokio::test]
    async fn alter_updates_the_handle() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "ALTER RETENTION POLICY bar ON foo DURATION 30d REPLICATION 2 DEFAULT".into(),
            ))
            .with_status(200)
            .with_body(r#"{"results":[{}]}"#)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let mut rp = client.database("foo").retention_policy("bar", "1d", 1, false);
        rp.alter(Some("30d"), Some(2), true)
            .await
            .expect("alter retention policy");

        assert_eq!(rp.duration(), "30d");
        assert_eq!(rp.replication(), 2);
        assert!(rp.default());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_alter_keeps_the_handle() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "ALTER RETENTION POLICY bar ON foo DURATION 30d".into(),
            ))
            .with_status(200)
            .with_body(r#"{"results":[{"error":"retention policy not found"}]}"#)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let mut rp = client.database("foo").retention_policy("bar", "1d", 1, false);
        let err = rp.alter(Some("30d"), None, false).await.unwrap_err();

        assert!(matches!(err, Error::Query { .. }));
        assert_eq!(err.to_string(), "retention policy not found");
        assert_eq!(rp.duration(), "1d");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn default_policy_name_is_quoted() {
        let mut mock_server = Server::new_async().await;
        let alter = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                r#"ALTER RETENTION POLICY "default" ON foo DURATION 30d"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"results":[{}]}"#)
            .create_async()
            .await;
        let drop = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                r#"DROP RETENTION POLICY "default" ON "name""#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"results":[{}]}"#)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let mut rp = client.database("foo").retention_policy("default", "0", 1, true);
        rp.alter(Some("30d"), None, false)
            .await
            .expect("alter retention policy");
        client
            .database("name")
            .drop_retention_policy("default")
            .await
            .expect("drop retention policy");

        alter.assert_async().await;
        drop.assert_async().await;
    }

    #[tokio::test]
    async fn drop() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "DROP RETENTION POLICY bar ON foo".into(),
            ))
            .with_status(200)
            .with_body(r#"{"results":[{}]}"#)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        client
            .database("foo")
            .retention_policy("bar", "1d", 1, false)
            .drop()
            .await
            .expect("drop retention policy");

        mock.assert_async().await;
    }
}
