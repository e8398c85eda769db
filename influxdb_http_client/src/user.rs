use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::{
    Client, Error, Result,
    query::{quote_ident, quote_literal},
};

/// Privileges a user can hold on a database
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Privilege {
    Read,
    Write,
    All,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::All => "ALL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown privilege '{0}', expected one of READ, WRITE, ALL")]
pub struct ParsePrivilegeError(String);

impl FromStr for Privilege {
    type Err = ParsePrivilegeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            "ALL" | "ALL PRIVILEGES" => Ok(Self::All),
            _ => Err(ParsePrivilegeError(s.to_string())),
        }
    }
}

/// Handle on a user of the server
#[derive(Debug, Clone)]
pub struct User {
    client: Client,
    name: String,
    admin: bool,
}

impl User {
    pub fn new(client: Client, name: impl Into<String>, admin: bool) -> Self {
        Self {
            client,
            name: name.into(),
            admin,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the user was last known to hold cluster-wide admin privileges
    pub fn admin(&self) -> bool {
        self.admin
    }

    pub async fn change_password(&self, new_password: &str) -> Result<()> {
        self.client
            .change_user_password(&self.name, new_password)
            .await
    }

    pub async fn grant_privilege_on(
        &self,
        privilege: Privilege,
        name_or_database: impl AsRef<str> + Send,
    ) -> Result<()> {
        self.client
            .grant_privilege(privilege, &self.name, name_or_database)
            .await
    }

    pub async fn revoke_privilege_on(
        &self,
        privilege: Privilege,
        name_or_database: impl AsRef<str> + Send,
    ) -> Result<()> {
        self.client
            .revoke_privilege(privilege, &self.name, name_or_database)
            .await
    }

    pub async fn grant_admin_privileges(&mut self) -> Result<()> {
        self.client.grant_admin_privileges(&self.name).await?;
        self.admin = true;
        Ok(())
    }

    pub async fn revoke_admin_privileges(&mut self) -> Result<()> {
        self.client.revoke_admin_privileges(&self.name).await?;
        self.admin = false;
        Ok(())
    }

    pub async fn drop(&self) -> Result<()> {
        self.client.drop_user(&self.name).await
    }
}

impl Client {
    /// List all users
    pub async fn get_users(&self) -> Result<Vec<User>> {
        self.execute("SHOW USERS")
            .await?
            .points()
            .map(|point| match point.get("user") {
                Some(Value::String(name)) => {
                    let admin = point
                        .get("admin")
                        .and_then(Value::as_bool)
                        .unwrap_or_default();
                    Ok(User::new(self.clone(), name.as_str(), admin))
                }
                other => Err(Error::UnexpectedResponse(format!(
                    "expected a user name, got {other:?}"
                ))),
            })
            .collect()
    }

    /// List the names of all users
    pub async fn get_user_names(&self) -> Result<Vec<String>> {
        self.execute("SHOW USERS").await?.string_column("user")
    }

    /// Create a user and return a handle on it
    pub async fn create_user(&self, name: &str, password: &str, admin: bool) -> Result<User> {
        let mut statement = format!(
            "CREATE USER {} WITH PASSWORD {}",
            quote_ident(name),
            quote_literal(password)
        );
        if admin {
            statement.push_str(" WITH ALL PRIVILEGES");
        }
        self.execute(statement).await?;
        Ok(User::new(self.clone(), name, admin))
    }

    pub async fn change_user_password(&self, name: &str, password: &str) -> Result<()> {
        let statement = format!(
            "SET PASSWORD FOR {} = {}",
            quote_ident(name),
            quote_literal(password)
        );
        self.execute(statement).await.map(drop)
    }

    pub async fn drop_user(&self, name: &str) -> Result<()> {
        let statement = format!("DROP USER {}", quote_ident(name));
        self.execute(statement).await.map(drop)
    }

    /// Grant `privilege` on a database, given by name or [`Database`][crate::Database] handle
    pub async fn grant_privilege(
        &self,
        privilege: Privilege,
        username: &str,
        name_or_database: impl AsRef<str> + Send,
    ) -> Result<()> {
        let statement = format!(
            "GRANT {privilege} ON {} TO {}",
            quote_ident(name_or_database.as_ref()),
            quote_ident(username)
        );
        self.execute(statement).await.map(drop)
    }

    pub async fn revoke_privilege(
        &self,
        privilege: Privilege,
        username: &str,
        name_or_database: impl AsRef<str> + Send,
    ) -> Result<()> {
        let statement = format!(
            "REVOKE {privilege} ON {} FROM {}",
            quote_ident(name_or_database.as_ref()),
            quote_ident(username)
        );
        self.execute(statement).await.map(drop)
    }

    /// Make `username` a cluster admin
    pub async fn grant_admin_privileges(&self, username: &str) -> Result<()> {
        let statement = format!("GRANT ALL PRIVILEGES TO {}", quote_ident(username));
        self.execute(statement).await.map(drop)
    }

    pub async fn revoke_admin_privileges(&self, username: &str) -> Result<()> {
        let statement = format!("REVOKE ALL PRIVILEGES FROM {}", quote_ident(username));
        self.execute(statement).await.map(drop)
    }
}
