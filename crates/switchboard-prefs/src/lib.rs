// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Local per-screen preferences, currently just the pagination size. Stored
//! in a small SQLite database so they survive restarts.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use switchboard_app::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const APP_NAME: &str = "switchboard";

const REQUIRED_SCHEMA: &[(&str, &[&str])] =
    &[("screen_prefs", &["screen", "page_size", "updated_at"])];

pub struct PrefsStore {
    conn: Connection,
}

impl PrefsStore {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_prefs_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open preferences database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }
        Ok(())
    }

    /// Persisted page size for a screen. Missing rows and sizes the
    /// pagination widget no longer offers both fall back to the default.
    pub fn page_size(&self, screen: &str) -> Result<u32> {
        let stored: Option<i64> = self
            .conn
            .query_row(
                "SELECT page_size FROM screen_prefs WHERE screen = ?",
                params![screen],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("read page size for screen {screen:?}"))?;

        let Some(stored) = stored else {
            return Ok(DEFAULT_PAGE_SIZE);
        };
        match u32::try_from(stored) {
            Ok(size) if PAGE_SIZE_OPTIONS.contains(&size) => Ok(size),
            _ => Ok(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn set_page_size(&self, screen: &str, size: u32) -> Result<()> {
        if !PAGE_SIZE_OPTIONS.contains(&size) {
            bail!(
                "page size {size} is not offered; valid sizes are {}",
                PAGE_SIZE_OPTIONS.map(|option| option.to_string()).join(", ")
            );
        }

        self.conn
            .execute(
                "
                INSERT INTO screen_prefs (screen, page_size, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (screen) DO UPDATE
                SET page_size = excluded.page_size,
                    updated_at = excluded.updated_at
                ",
                params![screen, size, now_rfc3339()?],
            )
            .with_context(|| format!("store page size for screen {screen:?}"))?;
        Ok(())
    }
}

pub fn default_prefs_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("SWITCHBOARD_PREFS_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!(
            "cannot resolve data directory; set SWITCHBOARD_PREFS_PATH to a writable database path"
        )
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("switchboard.db"))
}

pub fn validate_prefs_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("preferences path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "preferences path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("preferences path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "preferences path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "preferences database is missing required table `{table}`; point at a switchboard preferences database or remove the file"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.iter().any(|existing| existing == column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; remove the preferences file and let it be recreated",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            params![table],
            |row| row.get(0),
        )
        .with_context(|| format!("check table `{table}`"))?;
    Ok(count > 0)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut statement = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect table `{table}`"))?;
    let columns = statement
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("list columns of `{table}`"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("read columns of `{table}`"))?;
    Ok(columns)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

#[cfg(test)]
mod tests {
    use super::{PrefsStore, validate_prefs_path};
    use anyhow::Result;
    use switchboard_app::{CHANNEL_SCREEN, DEFAULT_PAGE_SIZE};

    fn store() -> Result<PrefsStore> {
        let store = PrefsStore::open_memory()?;
        store.bootstrap()?;
        Ok(store)
    }

    #[test]
    fn missing_rows_fall_back_to_the_default() -> Result<()> {
        let store = store()?;
        assert_eq!(store.page_size(CHANNEL_SCREEN)?, DEFAULT_PAGE_SIZE);
        Ok(())
    }

    #[test]
    fn page_size_round_trips_per_screen() -> Result<()> {
        let store = store()?;
        store.set_page_size(CHANNEL_SCREEN, 50)?;
        store.set_page_size("token", 25)?;
        assert_eq!(store.page_size(CHANNEL_SCREEN)?, 50);
        assert_eq!(store.page_size("token")?, 25);

        store.set_page_size(CHANNEL_SCREEN, 100)?;
        assert_eq!(store.page_size(CHANNEL_SCREEN)?, 100);
        Ok(())
    }

    #[test]
    fn foreign_sizes_are_rejected_on_write_and_coerced_on_read() -> Result<()> {
        let store = store()?;
        assert!(store.set_page_size(CHANNEL_SCREEN, 13).is_err());

        // A stale row written by an older build with different options.
        store.conn.execute(
            "INSERT INTO screen_prefs (screen, page_size, updated_at) VALUES ('channel', 13, '2026-01-01T00:00:00Z')",
            [],
        )?;
        assert_eq!(store.page_size(CHANNEL_SCREEN)?, DEFAULT_PAGE_SIZE);
        Ok(())
    }

    #[test]
    fn bootstrap_accepts_an_existing_compatible_database() -> Result<()> {
        let (_dir, path) = temp_path()?;
        {
            let store = PrefsStore::open(&path)?;
            store.bootstrap()?;
            store.set_page_size(CHANNEL_SCREEN, 25)?;
        }
        let store = PrefsStore::open(&path)?;
        store.bootstrap()?;
        assert_eq!(store.page_size(CHANNEL_SCREEN)?, 25);
        Ok(())
    }

    #[test]
    fn bootstrap_rejects_a_foreign_database() -> Result<()> {
        let store = PrefsStore::open_memory()?;
        store
            .conn
            .execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY);")?;
        assert!(store.bootstrap().is_err());
        Ok(())
    }

    #[test]
    fn uri_like_paths_are_rejected() {
        assert!(validate_prefs_path("").is_err());
        assert!(validate_prefs_path("sqlite://tmp/prefs.db").is_err());
        assert!(validate_prefs_path("file:prefs.db").is_err());
        assert!(validate_prefs_path("prefs.db?mode=ro").is_err());
        assert!(validate_prefs_path(":memory:").is_ok());
        assert!(validate_prefs_path("/tmp/prefs.db").is_ok());
    }

    fn temp_path() -> Result<(tempfile::TempDir, std::path::PathBuf)> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("switchboard.db");
        Ok((dir, path))
    }
}
