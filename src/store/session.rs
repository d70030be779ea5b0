use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::errors::StoreError;
use super::schema::SCHEMA;

// ============================================================================
// Store + Session - explicit unit-of-work handles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    ReadOnly,
    ReadWrite,
}

/// Connection pool plus schema bootstrap. Cheap to clone; every unit of work
/// is opened from here.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (and create if missing) a database at `url`, e.g.
    /// `sqlite://orders.db`, and apply the schema.
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store. A single pooled connection keeps every session on the
    /// same database, which is what tests want.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Open a read-write unit of work.
    pub async fn read_write(&self) -> Result<Session, StoreError> {
        self.session(SessionMode::ReadWrite).await
    }

    /// Open a read-only unit of work. Lazy resolution is permitted; any
    /// attempt to persist through it is [`StoreError::ReadOnlySession`].
    pub async fn read_only(&self) -> Result<Session, StoreError> {
        self.session(SessionMode::ReadOnly).await
    }

    async fn session(&self, mode: SessionMode) -> Result<Session, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Session {
            tx,
            mode,
            round_trips: 0,
        })
    }
}

/// One logical unit of work, bound to a single task.
///
/// Wraps a transaction: dropping a session without [`Session::commit`] rolls
/// every write back, so a failed operation never leaves partial aggregate
/// state visible to other sessions. Consuming the session is also what ends
/// lazy resolution -- there is no handle left to resolve against.
pub struct Session {
    tx: Transaction<'static, Sqlite>,
    mode: SessionMode,
    round_trips: u64,
}

impl Session {
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Number of statements this unit of work has issued. Each query strategy
    /// documents its expected count; tests hold them to it.
    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    /// Executor for one read statement. Every borrow counts as one round
    /// trip, so call it once per statement.
    pub(crate) fn reader(&mut self) -> &mut SqliteConnection {
        self.round_trips += 1;
        &mut *self.tx
    }

    /// Executor for one write statement. Counted like [`Session::reader`],
    /// and rejected outright under a read-only session.
    pub(crate) fn writer(&mut self) -> Result<&mut SqliteConnection, StoreError> {
        if self.mode == SessionMode::ReadOnly {
            return Err(StoreError::ReadOnlySession);
        }
        self.round_trips += 1;
        Ok(&mut *self.tx)
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
