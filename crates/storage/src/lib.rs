use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::Path,
    str::FromStr,
};
use tracing::info;

/// Display name used when no one has signed in.
pub const DEFAULT_USERNAME: &str = "User";

/// Local sign-in flag for the admin panel.
///
/// This is a convenience gate, not a trust boundary: any non-empty
/// credentials are accepted and nothing expires.
#[derive(Clone)]
pub struct SessionStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub signed_in_at: Option<DateTime<Utc>>,
}

impl SessionStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = is_memory_url(database_url);
        if let Some(dir) = database_dir(database_url).filter(|_| !in_memory) {
            fs::create_dir_all(dir).with_context(|| {
                format!("cannot create session directory '{}'", dir.display())
            })?;
        }

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_options = if in_memory {
            // Every in-memory connection is its own database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(2)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run session store migrations")?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Marks the panel as signed in. Returns `false` (and changes nothing)
    /// when either credential is blank.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE session SET authenticated = 1, username = ?1, signed_in_at = ?2 WHERE id = 1",
        )
        .bind(username)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to persist sign-in")?;
        info!(%username, "signed in");
        Ok(true)
    }

    pub async fn logout(&self) -> Result<()> {
        sqlx::query(
            "UPDATE session SET authenticated = 0, username = NULL, signed_in_at = NULL WHERE id = 1",
        )
        .execute(&self.pool)
        .await
        .context("failed to clear session")?;
        info!("signed out");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.current().await?.is_some())
    }

    pub async fn current(&self) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT authenticated, username, signed_in_at FROM session WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("failed to read session")?;

        let Some(row) = row else {
            return Ok(None);
        };
        if row.try_get::<i64, _>("authenticated")? == 0 {
            return Ok(None);
        }

        Ok(Some(Session {
            username: row
                .try_get::<Option<String>, _>("username")?
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            signed_in_at: row.try_get::<Option<DateTime<Utc>>, _>("signed_in_at")?,
        }))
    }

    pub async fn username(&self) -> Result<String> {
        Ok(self
            .current()
            .await?
            .map(|session| session.username)
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string()))
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

/// Directory of a file-backed `sqlite:` URL, if it names one.
fn database_dir(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let file = rest.split_once('?').map_or(rest, |(file, _)| file);
    Path::new(file)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
