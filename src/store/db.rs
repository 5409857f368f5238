//! County Database Module
//!
//! SQLite persistence for county rows. Access goes through tokio-rusqlite,
//! which runs every call on the connection's own thread.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use tokio_rusqlite::rusqlite::{self, OptionalExtension, TransactionBehavior};
use tokio_rusqlite::{params, Connection};

use crate::config::DatabaseLocation;
use crate::error::StoreError;
use crate::store::county::{decode_timestamp, encode_timestamp, normalize_county_name, County, RefreshState};
use crate::store::migrations;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA foreign_keys=ON;
     PRAGMA busy_timeout=5000;";

/// Raw `(name, burn_ban, updated_at)` row as read from SQLite.
type RawCounty = (String, bool, Option<String>);

fn into_county((name, burn_ban, updated_at): RawCounty) -> Result<County, StoreError> {
    Ok(County {
        name,
        burn_ban,
        updated_at: updated_at.as_deref().map(decode_timestamp).transpose()?,
    })
}

// == County Database ==
/// Handle to the county database. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CountyDb {
    pub(crate) conn: Connection,
}

impl CountyDb {
    // == Constructors ==
    /// Opens the database described by the configuration.
    pub async fn connect(location: &DatabaseLocation) -> Result<Self, StoreError> {
        match location {
            DatabaseLocation::File(path) => Self::open(path).await,
            DatabaseLocation::Memory => Self::open_in_memory().await,
        }
    }

    /// Opens (creating if needed) a database file and runs migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;
        Self::prepare(conn).await
    }

    /// Opens a private in-memory database, mostly for tests.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await?;
        migrations::run(&conn).await?;
        Ok(Self { conn })
    }

    // == Seeding ==
    /// Inserts counties that are not already present.
    ///
    /// New rows start with no ban and no refresh time. Returns how many rows
    /// were inserted.
    pub async fn seed_counties<I, S>(&self, names: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| normalize_county_name(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();

        self.conn
            .call(move |conn| -> Result<usize, StoreError> {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO county (name, burn_ban, updated_at) VALUES (?1, 0, NULL)
                         ON CONFLICT(name) DO NOTHING",
                    )?;
                    for name in &names {
                        inserted += stmt.execute(params![name])?;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await
            .map_err(StoreError::from)
    }

    /// Removes every county row.
    pub async fn clear_counties(&self) -> Result<usize, StoreError> {
        self.conn
            .call(|conn| conn.execute("DELETE FROM county", []))
            .await
            .map_err(StoreError::from)
    }

    // == Lookup ==
    /// Fetches one county by (already normalized) name.
    pub async fn get_county(&self, name: &str) -> Result<Option<County>, StoreError> {
        let name = name.to_string();
        let row = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT name, burn_ban, updated_at FROM county WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, bool>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    },
                )
                .optional()
            })
            .await?;

        row.map(into_county).transpose()
    }

    /// Lists every county, ordered by name.
    pub async fn list_counties(&self) -> Result<Vec<County>, StoreError> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<RawCounty>, rusqlite::Error> {
                let mut stmt =
                    conn.prepare("SELECT name, burn_ban, updated_at FROM county ORDER BY name")?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, bool>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(StoreError::from)?;

        rows.into_iter().map(into_county).collect()
    }

    // == Refresh State ==
    /// Reads the earliest refresh time across all rows.
    ///
    /// Yields no timestamp when the table is empty or any row was never
    /// refreshed.
    pub async fn refresh_state(&self) -> Result<RefreshState, StoreError> {
        let earliest: Option<String> = self
            .conn
            .call(|conn| {
                conn.query_row(
                    "SELECT CASE WHEN COUNT(*) = COUNT(updated_at) THEN MIN(updated_at) END
                     FROM county",
                    [],
                    |row| row.get(0),
                )
            })
            .await?;

        Ok(RefreshState {
            earliest: earliest.as_deref().map(decode_timestamp).transpose()?,
        })
    }

    // == Apply Bans ==
    /// Replaces the ban snapshot in a single immediate transaction.
    ///
    /// Every row gets `burn_ban = false` and `updated_at = at`, then rows named
    /// in `banned` get `burn_ban = true`. Readers see either the old snapshot
    /// or the new one. Returns how many banned names matched a row.
    pub async fn apply_bans(
        &self,
        banned: &HashSet<String>,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let banned: Vec<String> = banned.iter().cloned().collect();
        let stamp = encode_timestamp(at);

        self.conn
            .call(move |conn| -> Result<usize, StoreError> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                tx.execute(
                    "UPDATE county SET burn_ban = 0, updated_at = ?1",
                    params![stamp],
                )?;
                let mut matched = 0;
                {
                    let mut stmt = tx.prepare(
                        "UPDATE county SET burn_ban = 1, updated_at = ?1 WHERE name = ?2",
                    )?;
                    for name in &banned {
                        matched += stmt.execute(params![stamp, name])?;
                    }
                }
                tx.commit()?;
                Ok(matched)
            })
            .await
            .map_err(StoreError::from)
    }
}
