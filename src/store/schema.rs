//! SQLite schema for [`super::SqliteStore`], versioned with `PRAGMA user_version`.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Schema steps in order. Step `n` (1-based) brings the schema to version `n`.
const STEPS: &[(&str, &str)] = &[("records", include_str!("migrations/001_initial.sql"))];

/// Schema version this build creates.
pub const SCHEMA_VERSION: u32 = STEPS.len() as u32;

pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the schema up to [`SCHEMA_VERSION`]. Each step runs in its own
/// transaction together with the version bump.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    for (index, &(name, sql)) in STEPS.iter().enumerate().skip(current as usize) {
        let version = index as u32 + 1;
        let wrap = |source| StoreError::Migration {
            version,
            name,
            source,
        };

        let tx = conn.transaction().map_err(wrap)?;
        tx.execute_batch(sql).map_err(wrap)?;
        tx.pragma_update(None, "user_version", version).map_err(wrap)?;
        tx.commit().map_err(wrap)?;
        tracing::info!(version, name, "Applied schema step");
    }
    Ok(())
}
