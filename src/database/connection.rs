/*!
 * SQLite handle for the normalization cache.
 *
 * rusqlite connections block, so every query runs on tokio's blocking pool
 * while holding a shared lock on the single connection.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::file_utils::FileManager;
use super::schema;

/// Cache location below the user's local data folder
const CACHE_SUBPATH: [&str; 2] = ["origreg", "normalization_cache.db"];

/// Label used as path of in-memory databases
const IN_MEMORY: &str = ":memory:";

/// Shared connection to a cache database with an initialized schema
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    /// File backing the database, `:memory:` when there is none
    location: PathBuf,
    /// Connection shared by all clones
    conn: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open the cache in the user's data folder
    pub fn open_default() -> Result<Self> {
        Self::open(default_location()?)
    }

    /// Open (or create) the cache file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            FileManager::ensure_dir(parent)?;
        }

        info!("Opening normalization cache at {}", path.display());
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open cache database: {:?}", path))?;
        Self::prepare(path.to_path_buf(), conn)
    }

    /// Open a throwaway cache living in memory
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory normalization cache");
        let conn = Connection::open_in_memory().context("Failed to create in-memory cache database")?;
        Self::prepare(PathBuf::from(IN_MEMORY), conn)
    }

    fn prepare(location: PathBuf, conn: Connection) -> Result<Self> {
        schema::initialize_schema(&conn)?;
        Ok(Self {
            location,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// File backing the database
    pub fn path(&self) -> &Path {
        &self.location
    }

    /// Run read or single-statement work on the blocking pool
    pub async fn with_connection<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_blocking(move |conn| work(conn)).await
    }

    /// Run `work` inside a transaction committed when it returns `Ok`
    pub async fn with_transaction<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            let value = work(&tx)?;
            tx.commit()?;
            Ok(value)
        })
        .await
    }

    async fn run_blocking<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            work(&mut guard)
        })
        .await
        .map_err(|e| anyhow!("Cache database task failed: {}", e))?
    }
}

/// `<data dir>/origreg/normalization_cache.db`, falling back to `~/.local/share`
fn default_location() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .ok_or_else(|| anyhow!("Could not determine a data directory for the cache"))?;
    Ok(CACHE_SUBPATH.iter().fold(base, |path, part| path.join(part)))
}
