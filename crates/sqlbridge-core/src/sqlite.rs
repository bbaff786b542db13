//! SQLite driver backed by rusqlite (bundled SQLite).
//!
//! The data source name is passed to SQLite as a filename or `file:` URI, so
//! `file::memory:` opens a private in-memory database and
//! `file:app.db?mode=ro` opens read-only.

use crate::config::SqliteConfig;
use crate::driver::{Driver, DriverConnection, DriverRegistry, DriverResult};
use crate::error::{BridgeError, Result};
use rusqlite::{params_from_iter, Batch, OpenFlags};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Register the SQLite driver under each of [`SqliteConfig::DRIVER_NAMES`].
pub fn register(registry: &DriverRegistry) {
    let driver = Arc::new(SqliteDriver::default());
    for name in SqliteConfig::DRIVER_NAMES {
        registry.register(*name, driver.clone());
    }
}

/// The SQLite driver.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    busy_timeout: Duration,
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self {
            busy_timeout: SqliteConfig::BUSY_TIMEOUT,
        }
    }
}

impl SqliteDriver {
    pub fn with_busy_timeout(busy_timeout: Duration) -> Self {
        Self { busy_timeout }
    }
}

impl Driver for SqliteDriver {
    fn open(&self, data_source_name: &str) -> Result<Box<dyn DriverConnection>> {
        // Default flags include SQLITE_OPEN_URI
        let conn = rusqlite::Connection::open_with_flags(data_source_name, OpenFlags::default())?;
        conn.busy_timeout(self.busy_timeout)?;
        debug!("Opened SQLite database: {}", data_source_name);
        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    fn total_changes(&self) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached("SELECT total_changes()")?;
        Ok(stmt.query_row([], |row| row.get(0))?)
    }
}

impl DriverConnection for SqliteConnection {
    /// Run every statement in `statement`, in order.
    ///
    /// Positional parameters are consumed left to right, each statement taking
    /// as many as it has placeholders. The returned counts describe the last
    /// statement that ran. Text with no statements (empty, whitespace, only
    /// comments) succeeds with nothing affected.
    fn exec(&mut self, statement: &str, params: &[String]) -> Result<Box<dyn DriverResult>> {
        let mut batch = Batch::new(&self.conn, statement);
        let mut consumed = 0;
        let mut rows_affected = 0;

        while let Some(mut stmt) = batch.next()? {
            let wanted = stmt.parameter_count();
            let supplied = params.len() - consumed;
            if supplied < wanted {
                return Err(BridgeError::database(format!(
                    "not enough args to execute query: want {} got {}",
                    wanted, supplied
                )));
            }

            let before = self.total_changes()?;
            {
                let args = &params[consumed..consumed + wanted];
                let mut rows = stmt.query(params_from_iter(args.iter()))?;
                // Rows are discarded
                while rows.next()?.is_some() {}
            }
            consumed += wanted;

            // sqlite3_changes() keeps the count of the last INSERT/UPDATE/DELETE,
            // so a DDL statement would otherwise report a stale value.
            rows_affected = if self.total_changes()? != before {
                self.conn.changes() as i64
            } else {
                0
            };
        }

        if consumed < params.len() {
            warn!(
                "Ignored {} surplus parameter(s) after executing statement",
                params.len() - consumed
            );
        }

        Ok(Box::new(SqliteResult {
            last_insert_id: self.conn.last_insert_rowid(),
            rows_affected,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
struct SqliteResult {
    last_insert_id: i64,
    rows_affected: i64,
}

impl DriverResult for SqliteResult {
    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.last_insert_id)
    }

    fn rows_affected(&self) -> Result<i64> {
        Ok(self.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_memory() -> Box<dyn DriverConnection> {
        SqliteDriver::default().open("file::memory:").unwrap()
    }

    fn exec(conn: &mut Box<dyn DriverConnection>, sql: &str, params: &[&str]) -> Box<dyn DriverResult> {
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        conn.exec(sql, &params).unwrap()
    }

    #[test]
    fn test_create_then_insert() {
        let mut conn = open_memory();
        let created = exec(&mut conn, "CREATE TABLE t(x)", &[]);
        assert_eq!(created.rows_affected().unwrap(), 0);

        let inserted = exec(&mut conn, "INSERT INTO t VALUES (?)", &["5"]);
        assert_eq!(inserted.rows_affected().unwrap(), 1);
        assert_eq!(inserted.last_insert_id().unwrap(), 1);
    }

    #[test]
    fn test_ddl_after_dml_reports_zero_rows() {
        let mut conn = open_memory();
        exec(&mut conn, "CREATE TABLE t(x)", &[]);
        exec(&mut conn, "INSERT INTO t VALUES (1), (2), (3)", &[]);

        let ddl = exec(&mut conn, "CREATE TABLE u(y)", &[]);
        assert_eq!(ddl.rows_affected().unwrap(), 0);

        let noop = exec(&mut conn, "UPDATE t SET x = 0 WHERE x > 100", &[]);
        assert_eq!(noop.rows_affected().unwrap(), 0);

        let update = exec(&mut conn, "UPDATE t SET x = x + 1 WHERE x >= ?", &["2"]);
        assert_eq!(update.rows_affected().unwrap(), 2);
    }

    #[test]
    fn test_select_is_run_to_completion() {
        let mut conn = open_memory();
        exec(&mut conn, "CREATE TABLE t(x)", &[]);
        exec(&mut conn, "INSERT INTO t VALUES (1), (2)", &[]);

        let select = exec(&mut conn, "SELECT x FROM t", &[]);
        assert_eq!(select.rows_affected().unwrap(), 0);
    }

    #[test]
    fn test_syntax_error_carries_sqlite_message() {
        let mut conn = open_memory();
        let err = conn.exec("SELEC 1", &[]).err().unwrap();
        assert!(matches!(err, BridgeError::Database { .. }));
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn test_missing_parameter_is_driver_error() {
        let mut conn = open_memory();
        exec(&mut conn, "CREATE TABLE t(x, y)", &[]);
        let err = conn
            .exec("INSERT INTO t VALUES (?, ?)", &["1".into()])
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "not enough args to execute query: want 2 got 1"
        );
        assert!(!err.is_fatal());

        let count = exec(&mut conn, "DELETE FROM t", &[]);
        assert_eq!(count.rows_affected().unwrap(), 0);
    }

    #[test]
    fn test_surplus_parameters_are_ignored() {
        let mut conn = open_memory();
        exec(&mut conn, "CREATE TABLE t(x)", &[]);
        let inserted = exec(&mut conn, "INSERT INTO t VALUES (?)", &["1", "2"]);
        assert_eq!(inserted.rows_affected().unwrap(), 1);
    }

    #[test]
    fn test_every_statement_runs() {
        let mut conn = open_memory();
        let created = exec(&mut conn, "CREATE TABLE a(x); CREATE TABLE b(y)", &[]);
        assert_eq!(created.rows_affected().unwrap(), 0);

        exec(&mut conn, "INSERT INTO a VALUES (1)", &[]);
        let inserted = exec(&mut conn, "INSERT INTO b VALUES (1)", &[]);
        assert_eq!(inserted.rows_affected().unwrap(), 1);
    }

    #[test]
    fn test_parameters_are_split_across_statements() {
        let mut conn = open_memory();
        exec(&mut conn, "CREATE TABLE t(x)", &[]);

        let res = exec(
            &mut conn,
            "INSERT INTO t VALUES (?), (?); UPDATE t SET x = ? WHERE x = ?;",
            &["a", "b", "c", "b"],
        );
        // Counts describe the last statement
        assert_eq!(res.rows_affected().unwrap(), 1);
        assert_eq!(res.last_insert_id().unwrap(), 2);

        let deleted = exec(&mut conn, "DELETE FROM t WHERE x IN (?, ?)", &["a", "c"]);
        assert_eq!(deleted.rows_affected().unwrap(), 2);
    }

    #[test]
    fn test_failing_statement_stops_the_batch() {
        let mut conn = open_memory();
        exec(&mut conn, "CREATE TABLE t(x)", &[]);
        let err = conn
            .exec(
                "INSERT INTO t VALUES (1); INSERT INTO missing VALUES (2); INSERT INTO t VALUES (3)",
                &[],
            )
            .err()
            .unwrap();
        assert!(err.to_string().contains("no such table: missing"));

        let deleted = exec(&mut conn, "DELETE FROM t", &[]);
        assert_eq!(deleted.rows_affected().unwrap(), 1);
    }

    #[test]
    fn test_text_without_statements_affects_nothing() {
        let mut conn = open_memory();
        for sql in ["", "   ", "-- just a comment", ";", "/* block */ ;\n"] {
            let res = exec(&mut conn, sql, &[]);
            assert_eq!(res.rows_affected().unwrap(), 0, "sql: {:?}", sql);
        }
    }

    #[test]
    fn test_constraint_violation() {
        let mut conn = open_memory();
        exec(&mut conn, "CREATE TABLE t(x UNIQUE)", &[]);
        exec(&mut conn, "INSERT INTO t VALUES (?)", &["a"]);
        let err = conn.exec("INSERT INTO t VALUES (?)", &["a".into()]).err().unwrap();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn test_file_database_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bridge.sqlite");
        let path = path.to_str().unwrap();

        {
            let mut conn = SqliteDriver::default().open(path).unwrap();
            exec(&mut conn, "CREATE TABLE t(x)", &[]);
            exec(&mut conn, "INSERT INTO t VALUES (?)", &["persisted"]);
        }

        let mut conn = SqliteDriver::default().open(path).unwrap();
        let update = exec(&mut conn, "UPDATE t SET x = ? WHERE x = ?", &["again", "persisted"]);
        assert_eq!(update.rows_affected().unwrap(), 1);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("db.sqlite");
        let err = SqliteDriver::default().open(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, BridgeError::Database { .. }));
    }
}
