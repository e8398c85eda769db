use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{Client, RequestBody, Result};

/// A cluster shard space, as served by `/cluster/shard_spaces`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardSpace {
    pub name: String,
    /// Not sent when creating or updating, the database is part of the path
    #[serde(default, skip_serializing)]
    pub database: String,
    /// Series matching this regex are stored in the shard space, e.g., `/.*/`
    pub regex: String,
    /// e.g., `inf` or `365d`
    pub retention_policy: String,
    pub shard_duration: String,
    pub replication_factor: u32,
    pub split: u32,
}

impl Client {
    /// List the shard spaces of every database
    pub async fn get_shard_spaces(&self) -> Result<Vec<ShardSpace>> {
        Ok(self
            .request_json(Method::GET, "/cluster/shard_spaces", &[], None)
            .await?
            .unwrap_or_default())
    }

    pub async fn create_shard_space(
        &self,
        name_or_database: impl AsRef<str> + Send,
        shard_space: &ShardSpace,
    ) -> Result<()> {
        let path = format!(
            "/cluster/shard_spaces/{}",
            urlencoding::encode(name_or_database.as_ref())
        );
        let body = RequestBody::json(shard_space)?;
        self.request(Method::POST, &path, &[], Some(body))
            .await
            .map(drop)
    }

    /// Replace the settings of the shard space `name`
    pub async fn update_shard_space(
        &self,
        name_or_database: impl AsRef<str> + Send,
        name: &str,
        shard_space: &ShardSpace,
    ) -> Result<()> {
        let path = shard_space_path(name_or_database.as_ref(), name);
        let body = RequestBody::json(shard_space)?;
        self.request(Method::POST, &path, &[], Some(body))
            .await
            .map(drop)
    }

    pub async fn drop_shard_space(
        &self,
        name_or_database: impl AsRef<str> + Send,
        name: &str,
    ) -> Result<()> {
        let path = shard_space_path(name_or_database.as_ref(), name);
        self.request(Method::DELETE, &path, &[], None)
            .await
            .map(drop)
    }
}

fn shard_space_path(database: &str, name: &str) -> String {
    format!(
        "/cluster/shard_spaces/{}/{}",
        urlencoding::encode(database),
        urlencoding::encode(name)
    )
}
