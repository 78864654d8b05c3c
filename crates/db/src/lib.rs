use std::str::FromStr;

use sqlx::{
    Error, Pool, Sqlite,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use utils::assets::db_path;

pub mod models;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open (or create) the on-disk database in the application data
    /// directory and bring it up to date.
    pub async fn new() -> Result<DBService, Error> {
        let database_url = format!("sqlite://{}", db_path().to_string_lossy());
        Self::new_with_url(&database_url).await
    }

    /// Connect to an explicit database URL. Used by tests with
    /// `sqlite::memory:`.
    pub async fn new_with_url(database_url: &str) -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(10))
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("cache_size", "-64000");
        // In-memory databases are per-connection; a pool larger than one
        // would migrate only the first connection.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 10 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect_with(options)
            .await?;
        MIGRATOR.run(&pool).await?;
        Ok(DBService { pool })
    }
}
