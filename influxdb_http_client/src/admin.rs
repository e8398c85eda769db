//! Account collections served by the JSON administrative endpoints

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::{Client, Database, Error, RequestBody, Result};

/// A collection of accounts under `path`, listed with their name in `name_field`
#[derive(Debug, Clone)]
struct Accounts {
    client: Client,
    path: String,
    name_field: &'static str,
}

#[derive(Debug, Serialize)]
struct NewAccount<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordChange<'a> {
    password: &'a str,
}

impl Accounts {
    fn account_path(&self, name: &str) -> String {
        format!("{}/{}", self.path, urlencoding::encode(name))
    }

    async fn get_all(&self) -> Result<Vec<String>> {
        let accounts: Vec<Value> = self
            .client
            .request_json(Method::GET, &self.path, &[], None)
            .await?
            .unwrap_or_default();
        accounts
            .iter()
            .map(|account| {
                account
                    .get(self.name_field)
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned)
                    .ok_or_else(|| {
                        Error::UnexpectedResponse(format!(
                            "missing '{}' in account {account}",
                            self.name_field
                        ))
                    })
            })
            .collect()
    }

    async fn add(&self, name: &str, password: &str) -> Result<()> {
        let body = RequestBody::json(&NewAccount { name, password })?;
        self.client
            .request(Method::POST, &self.path, &[], Some(body))
            .await
            .map(drop)
    }

    async fn update(&self, name: &str, new_password: &str) -> Result<()> {
        let body = RequestBody::json(&PasswordChange {
            password: new_password,
        })?;
        self.client
            .request(Method::POST, &self.account_path(name), &[], Some(body))
            .await
            .map(drop)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.client
            .request(Method::DELETE, &self.account_path(name), &[], None)
            .await
            .map(drop)
    }
}

/// The cluster administrators, at `/cluster_admins`
#[derive(Debug, Clone)]
pub struct ClusterAdmins {
    accounts: Accounts,
}

impl ClusterAdmins {
    fn new(client: Client) -> Self {
        Self {
            accounts: Accounts {
                client,
                path: "/cluster_admins".to_string(),
                name_field: "username",
            },
        }
    }

    /// Names of all cluster admins
    pub async fn get_all(&self) -> Result<Vec<String>> {
        self.accounts.get_all().await
    }

    pub async fn add(&self, name: &str, password: &str) -> Result<()> {
        self.accounts.add(name, password).await
    }

    /// Change the password of the admin `name`
    pub async fn update(&self, name: &str, new_password: &str) -> Result<()> {
        self.accounts.update(name, new_password).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.accounts.delete(name).await
    }
}

/// The users of one database, at `/db/<database>/users`
#[derive(Debug, Clone)]
pub struct DatabaseUsers {
    accounts: Accounts,
}

impl DatabaseUsers {
    pub(crate) fn new(database: Database) -> Self {
        let path = format!("/db/{}/users", urlencoding::encode(database.name()));
        Self {
            accounts: Accounts {
                client: database.client().clone(),
                path,
                name_field: "name",
            },
        }
    }

    /// Names of all users of the database
    pub async fn get_all(&self) -> Result<Vec<String>> {
        self.accounts.get_all().await
    }

    pub async fn add(&self, name: &str, password: &str) -> Result<()> {
        self.accounts.add(name, password).await
    }

    /// Change the password of the user `name`
    pub async fn update(&self, name: &str, new_password: &str) -> Result<()> {
        self.accounts.update(name, new_password).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.accounts.delete(name).await
    }
}

/// Handle on a single cluster admin
#[derive(Debug, Clone)]
pub struct ClusterAdmin {
    admins: ClusterAdmins,
    name: String,
}

impl ClusterAdmin {
    pub fn client(&self) -> &Client {
        &self.admins.accounts.client
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the admin on the server
    pub async fn create(&self, password: &str) -> Result<()> {
        self.admins.add(&self.name, password).await
    }

    pub async fn change_password(&self, new_password: &str) -> Result<()> {
        self.admins.update(&self.name, new_password).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.admins.delete(&self.name).await
    }
}

impl Client {
    /// The cluster admins collection
    pub fn cluster_admins(&self) -> ClusterAdmins {
        ClusterAdmins::new(self.clone())
    }

    /// Get a handle on the cluster admin `name`, no request is made
    pub fn cluster_admin(&self, name: impl Into<String>) -> ClusterAdmin {
        ClusterAdmin {
            admins: self.cluster_admins(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::tests::ROOT_AUTH;

    #[tokio::test]
    async fn list_cluster_admins() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/cluster_admins")
            .match_header("Authorization", ROOT_AUTH)
            .with_status(200)
            .with_body(r#"[{"username":"root"},{"username":"admin"}]"#)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let names = client
            .cluster_admins()
            .get_all()
            .await
            .expect("list cluster admins");

        assert_eq!(names, vec!["root".to_string(), "admin".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn cluster_admin_lifecycle() {
        let mut mock_server = Server::new_async().await;
        let create = mock_server
            .mock("POST", "/cluster_admins")
            .match_body(Matcher::Json(json!({"name": "foo", "password": "bar"})))
            .with_status(200)
            .create_async()
            .await;
        let update = mock_server
            .mock("POST", "/cluster_admins/foo")
            .match_body(Matcher::Json(json!({"password": "baz"})))
            .with_status(200)
            .create_async()
            .await;
        let delete = mock_server
            .mock("DELETE", "/cluster_admins/foo")
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let admin = client.cluster_admin("foo");
        assert_eq!(admin.name(), "foo");
        admin.create("bar").await.expect("create admin");
        admin.change_password("baz").await.expect("change password");
        admin.delete().await.expect("delete admin");

        create.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn existing_cluster_admin() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("POST", "/cluster_admins")
            .with_status(400)
            .with_body("User foo already exists")
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let err = client
            .cluster_admins()
            .add("foo", "bar")
            .await
            .unwrap_err();

        match err {
            Error::ApiError { code, message } => {
                assert_eq!(code, StatusCode::BAD_REQUEST);
                assert_eq!(message, "User foo already exists");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn database_users() {
        let mut mock_server = Server::new_async().await;
        let list = mock_server
            .mock("GET", "/db/foo/users")
            .with_status(200)
            .with_body(r#"[{"name":"bob","isAdmin":false}]"#)
            .create_async()
            .await;
        let add = mock_server
            .mock("POST", "/db/foo/users")
            .match_body(Matcher::Json(json!({"name": "alice", "password": "pw"})))
            .with_status(200)
            .create_async()
            .await;
        let update = mock_server
            .mock("POST", "/db/foo/users/alice")
            .match_body(Matcher::Json(json!({"password": "new"})))
            .with_status(200)
            .create_async()
            .await;
        let delete = mock_server
            .mock("DELETE", "/db/foo/users/alice")
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let users = client.database("foo").users();
        assert_eq!(users.get_all().await.expect("list"), vec!["bob".to_string()]);
        users.add("alice", "pw").await.expect("add user");
        users.update("alice", "new").await.expect("update user");
        users.delete("alice").await.expect("delete user");

        list.assert_async().await;
        add.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn account_names_are_path_encoded() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("DELETE", "/cluster_admins/john%20doe")
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        client
            .cluster_admins()
            .delete("john doe")
            .await
            .expect("delete admin");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_account_list() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("GET", "/cluster_admins")
            .with_status(200)
            .with_body(r#"[{"name":"root"}]"#)
            .create_async()
            .await;

        let client = Client::new(mock_server.url()).expect("create client");
        let err = client.cluster_admins().get_all().await.unwrap_err();

        assert!(matches!(err, Error::UnexpectedResponse(_)));
        mock.assert_async().await;
    }
}
