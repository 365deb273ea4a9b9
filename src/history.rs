use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::exam::ExamResult;

/// Consumes the final payload of a finished session. Scoring and reporting
/// live behind this seam; the engine only hands over the result.
pub trait ResultSink {
    fn record(&mut self, result: &ExamResult) -> std::result::Result<(), Box<dyn Error>>;
}

/// One finished attempt as stored in the history database.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub contest_id: String,
    pub contest_name: String,
    pub taken_at: DateTime<Local>,
    pub attempted: u32,
    pub total_questions: u32,
    pub elapsed_secs: u64,
    pub auto_submitted: bool,
}

/// Database manager for finished-attempt history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::history_db_path().unwrap_or_else(|| PathBuf::from("examr_history.db"));
        Self::open_at(&db_path)
    }

    pub fn open_at(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                contest_id TEXT NOT NULL,
                contest_name TEXT NOT NULL,
                taken_at TEXT NOT NULL,
                attempted INTEGER NOT NULL,
                total_questions INTEGER NOT NULL,
                elapsed_secs INTEGER NOT NULL,
                auto_submitted BOOLEAN NOT NULL,
                answers TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_contest ON attempts(contest_id)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record_attempt(&self, result: &ExamResult) -> Result<()> {
        let answers = serde_json::to_string(&result.submitted).unwrap_or_default();
        self.conn.execute(
            r#"
            INSERT INTO attempts
            (contest_id, contest_name, taken_at, attempted, total_questions, elapsed_secs, auto_submitted, answers)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                result.contest_id,
                result.contest_name,
                result.finished_at.to_rfc3339(),
                result.attempted(),
                result.total_questions,
                result.elapsed_secs,
                result.auto_submitted,
                answers,
            ],
        )?;
        Ok(())
    }

    /// Past attempts for a contest, most recent first.
    pub fn attempts_for(&self, contest_id: &str) -> Result<Vec<AttemptRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT contest_id, contest_name, taken_at, attempted, total_questions, elapsed_secs, auto_submitted
            FROM attempts
            WHERE contest_id = ?1
            ORDER BY taken_at DESC
            "#,
        )?;

        let rows = stmt.query_map(params![contest_id], |row| {
            let taken_at: String = row.get(2)?;
            Ok(AttemptRecord {
                contest_id: row.get(0)?,
                contest_name: row.get(1)?,
                taken_at: DateTime::parse_from_rfc3339(&taken_at)
                    .map(|dt| dt.with_timezone(&Local))
                    .unwrap_or_else(|_| Local::now()),
                attempted: row.get(3)?,
                total_questions: row.get(4)?,
                elapsed_secs: row.get::<_, i64>(5)? as u64,
                auto_submitted: row.get(6)?,
            })
        })?;

        rows.collect()
    }

    pub fn attempt_count(&self, contest_id: &str) -> Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM attempts WHERE contest_id = ?1",
            params![contest_id],
            |row| row.get(0),
        )
    }
}

impl ResultSink for HistoryDb {
    fn record(&mut self, result: &ExamResult) -> std::result::Result<(), Box<dyn Error>> {
        self.record_attempt(result)?;
        Ok(())
    }
}

/// Append one finished attempt to the CSV results log, emitting a header row
/// when the file is first created.
pub fn append_result_log(path: &Path, result: &ExamResult) -> std::result::Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let needs_header = !path.exists();

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        writer.write_record([
            "date",
            "contest_id",
            "attempted",
            "total_questions",
            "elapsed_secs",
            "auto_submitted",
        ])?;
    }

    writer.write_record([
        result.finished_at.format("%c").to_string(),
        result.contest_id.clone(),
        result.attempted().to_string(),
        result.total_questions.to_string(),
        result.elapsed_secs.to_string(),
        result.auto_submitted.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}
