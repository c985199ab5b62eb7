//! Server-level administration statements (DDL and principals)

use crate::domain::ConnectionDescriptor;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::{Connection, MySqlConnection, MySqlPool};

/// Privileged operations on the database server hosting tenant stores
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    async fn drop_database(&self, name: &str) -> Result<()>;
    async fn create_database(&self, name: &str, charset: &str, collation: &str) -> Result<()>;
    async fn drop_user(&self, username: &str, host: &str) -> Result<()>;
    async fn create_user(&self, username: &str, host: &str, password: &str) -> Result<()>;
    /// Grant every privilege on `database.*` and nothing else
    async fn grant_all(&self, database: &str, username: &str, host: &str) -> Result<()>;
    async fn flush_privileges(&self) -> Result<()>;
    /// Open a one-off connection with `descriptor` and run `SELECT 1`
    async fn ping(&self, descriptor: &ConnectionDescriptor) -> Result<()>;
}

/// [`DatabaseAdmin`] running statements over the central pool
pub struct MySqlDatabaseAdmin {
    pool: MySqlPool,
}

impl MySqlDatabaseAdmin {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    // DDL cannot take bind parameters, so every name goes through quoting.
    async fn statement(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }
}

/// Quote an identifier with backticks
pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a string literal with single quotes
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

fn account(username: &str, host: &str) -> String {
    format!("{}@{}", quote_literal(username), quote_literal(host))
}

#[async_trait]
impl DatabaseAdmin for MySqlDatabaseAdmin {
    async fn drop_database(&self, name: &str) -> Result<()> {
        self.statement(&format!("DROP DATABASE IF EXISTS {}", quote_ident(name)))
            .await
    }

    async fn create_database(&self, name: &str, charset: &str, collation: &str) -> Result<()> {
        self.statement(&format!(
            "CREATE DATABASE {} DEFAULT CHARACTER SET {} COLLATE {}",
            quote_ident(name),
            charset,
            collation
        ))
        .await
    }

    async fn drop_user(&self, username: &str, host: &str) -> Result<()> {
        self.statement(&format!("DROP USER IF EXISTS {}", account(username, host)))
            .await
    }

    async fn create_user(&self, username: &str, host: &str, password: &str) -> Result<()> {
        self.statement(&format!(
            "CREATE USER {} IDENTIFIED BY {}",
            account(username, host),
            quote_literal(password)
        ))
        .await
    }

    async fn grant_all(&self, database: &str, username: &str, host: &str) -> Result<()> {
        self.statement(&format!(
            "GRANT ALL PRIVILEGES ON {}.* TO {}",
            quote_ident(database),
            account(username, host)
        ))
        .await
    }

    async fn flush_privileges(&self) -> Result<()> {
        self.statement("FLUSH PRIVILEGES").await
    }

    async fn ping(&self, descriptor: &ConnectionDescriptor) -> Result<()> {
        let mut conn = MySqlConnection::connect_with(&descriptor.connect_options()).await?;
        sqlx::query("SELECT 1").execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }
}
