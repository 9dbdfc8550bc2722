pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::Connection;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    init_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
}

pub fn init_db_with_timeout(path: &str, busy_timeout_ms: u64) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    // Writers queue on the IMMEDIATE lock instead of failing with SQLITE_BUSY.
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
        .context("failed to set busy timeout")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
