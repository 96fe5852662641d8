//! SQLite-backed page store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};

use super::{NewPage, Page, PageError, PageStore};

const PAGE_COLUMNS: &str =
    "process_id, pid, htr_id, in_progress, user, uploaded, downloaded";

/// SQLite-backed page store.
pub struct SqlitePageStore {
    conn: Mutex<Connection>,
}

impl SqlitePageStore {
    /// Create a new SQLite page store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, PageError> {
        let conn = Connection::open(path).map_err(|e| PageError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite page store (useful for testing).
    pub fn in_memory() -> Result<Self, PageError> {
        let conn = Connection::open_in_memory().map_err(|e| PageError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), PageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                process_id INTEGER PRIMARY KEY,
                pid TEXT,
                htr_id INTEGER NOT NULL,
                in_progress INTEGER NOT NULL,
                user TEXT,
                uploaded TEXT NOT NULL,
                downloaded TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_pages_pid ON pages(pid);
            CREATE INDEX IF NOT EXISTS idx_pages_in_progress ON pages(in_progress);
            "#,
        )
        .map_err(|e| PageError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_page(row: &rusqlite::Row) -> rusqlite::Result<Page> {
        let process_id: i64 = row.get(0)?;
        let pid: Option<String> = row.get(1)?;
        let htr_id: i64 = row.get(2)?;
        let in_progress: bool = row.get(3)?;
        let user: Option<String> = row.get(4)?;
        let uploaded_str: String = row.get(5)?;
        let downloaded_str: Option<String> = row.get(6)?;

        // Timestamps were written by us in RFC 3339; fall back to now on
        // corrupted data rather than failing the whole query.
        let uploaded = DateTime::parse_from_rfc3339(&uploaded_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let downloaded = downloaded_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        Ok(Page {
            process_id,
            pid,
            htr_id,
            in_progress,
            user,
            uploaded,
            downloaded,
        })
    }

    fn fetch(conn: &Connection, process_id: i64) -> Result<Option<Page>, PageError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM pages WHERE process_id = ?", PAGE_COLUMNS),
            params![process_id],
            Self::row_to_page,
        );

        match result {
            Ok(page) => Ok(Some(page)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PageError::Database(e.to_string())),
        }
    }
}

impl PageStore for SqlitePageStore {
    fn insert(&self, page: NewPage) -> Result<Page, PageError> {
        let conn = self.conn.lock().unwrap();
        let uploaded = Utc::now();

        let result = conn.execute(
            "INSERT INTO pages (process_id, pid, htr_id, in_progress, user, uploaded, downloaded) VALUES (?, ?, ?, 1, ?, ?, NULL)",
            params![
                page.process_id,
                page.pid,
                page.htr_id,
                page.user,
                uploaded.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(Page {
                process_id: page.process_id,
                pid: page.pid,
                htr_id: page.htr_id,
                in_progress: true,
                user: page.user,
                uploaded,
                downloaded: None,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(PageError::Duplicate(page.process_id))
            }
            Err(e) => Err(PageError::Database(e.to_string())),
        }
    }

    fn get(&self, process_id: i64) -> Result<Option<Page>, PageError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch(&conn, process_id)
    }

    fn in_progress(&self) -> Result<Vec<Page>, PageError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM pages WHERE in_progress = 1 ORDER BY uploaded ASC",
                PAGE_COLUMNS
            ))
            .map_err(|e| PageError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_page)
            .map_err(|e| PageError::Database(e.to_string()))?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row.map_err(|e| PageError::Database(e.to_string()))?);
        }
        Ok(pages)
    }

    fn count_in_progress(&self) -> Result<i64, PageError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE in_progress = 1",
            [],
            |row| row.get(0),
        )
        .map_err(|e| PageError::Database(e.to_string()))
    }

    fn pages_for(&self, pid: &str) -> Result<Vec<Page>, PageError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM pages WHERE pid = ? ORDER BY uploaded DESC",
                PAGE_COLUMNS
            ))
            .map_err(|e| PageError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![pid], Self::row_to_page)
            .map_err(|e| PageError::Database(e.to_string()))?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row.map_err(|e| PageError::Database(e.to_string()))?);
        }
        Ok(pages)
    }

    fn conflicts_for(&self, pid: &str) -> Result<Vec<Page>, PageError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM pages WHERE pid = ? AND (in_progress = 1 OR downloaded IS NOT NULL) ORDER BY uploaded ASC",
                PAGE_COLUMNS
            ))
            .map_err(|e| PageError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![pid], Self::row_to_page)
            .map_err(|e| PageError::Database(e.to_string()))?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row.map_err(|e| PageError::Database(e.to_string()))?);
        }
        Ok(pages)
    }

    fn mark_finished(
        &self,
        process_id: i64,
        downloaded: DateTime<Utc>,
    ) -> Result<Page, PageError> {
        let conn = self.conn.lock().unwrap();

        // Guard the transition: only an in-progress row may become terminal.
        let affected = conn
            .execute(
                "UPDATE pages SET in_progress = 0, downloaded = ? WHERE process_id = ? AND in_progress = 1",
                params![downloaded.to_rfc3339(), process_id],
            )
            .map_err(|e| PageError::Database(e.to_string()))?;

        if affected == 0 {
            return match Self::fetch(&conn, process_id)? {
                Some(page) => Err(PageError::AlreadyTerminal {
                    process_id,
                    state: page.state().to_string(),
                }),
                None => Err(PageError::NotFound(process_id)),
            };
        }

        Self::fetch(&conn, process_id)?.ok_or(PageError::NotFound(process_id))
    }

    fn mark_expired(&self, process_id: i64) -> Result<Page, PageError> {
        let conn = self.conn.lock().unwrap();

        let affected = conn
            .execute(
                "UPDATE pages SET in_progress = 0 WHERE process_id = ? AND in_progress = 1",
                params![process_id],
            )
            .map_err(|e| PageError::Database(e.to_string()))?;

        if affected == 0 {
            return match Self::fetch(&conn, process_id)? {
                Some(page) => Err(PageError::AlreadyTerminal {
                    process_id,
                    state: page.state().to_string(),
                }),
                None => Err(PageError::NotFound(process_id)),
            };
        }

        Self::fetch(&conn, process_id)?.ok_or(PageError::NotFound(process_id))
    }
}
