//! rollcall-ledger: per-day, append-only attendance files.
//!
//! Each calendar date has its own `<YYYY-MM-DD>.csv` file holding a
//! `Name,Time` header followed by one row per recognition. Files are only
//! ever created or appended to.

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header row written once at the top of every ledger file.
pub const HEADER: [&str; 2] = ["Name", "Time"];
/// File extension of ledger files.
pub const LEDGER_EXTENSION: &str = "csv";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to write ledger {path}: {source}")]
    LedgerWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// One attendance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "Name")]
    pub name: String,
    /// Wall-clock time of day, `HH:MM:SS`.
    #[serde(rename = "Time")]
    pub time: String,
}

/// Directory of daily ledger files.
#[derive(Debug, Clone)]
pub struct AttendanceLedger {
    dir: PathBuf,
}

impl AttendanceLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the ledger file for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{LEDGER_EXTENSION}", date.format(DATE_FORMAT)))
    }

    /// Append `name` at `timestamp` to that day's ledger, writing the header first
    /// if the file is new or empty.
    ///
    /// Same-day repeats are recorded again. There is no file locking: two
    /// processes recording at the same moment may interleave.
    pub fn record(&self, name: &str, timestamp: NaiveDateTime) -> Result<AttendanceRecord, LedgerError> {
        let path = self.path_for(timestamp.date());
        let record = AttendanceRecord {
            name: name.to_string(),
            time: timestamp.format(TIME_FORMAT).to_string(),
        };

        let write_failed = |source: std::io::Error| LedgerError::LedgerWriteFailed {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(write_failed)?;
        let is_new = file.metadata().map_err(write_failed)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            tracing::info!(path = %path.display(), "creating ledger");
            writer.write_record(HEADER).map_err(|e| write_failed(e.into()))?;
        }
        writer
            .write_record([record.name.as_str(), record.time.as_str()])
            .map_err(|e| write_failed(e.into()))?;

        let mut file = writer
            .into_inner()
            .map_err(|e| write_failed(e.into_error()))?;
        file.flush().map_err(write_failed)?;

        tracing::info!(name = %record.name, time = %record.time, path = %path.display(), "marked attendance");
        Ok(record)
    }

    /// Append `name` at the clock's current time.
    pub fn record_now<C: Clock + ?Sized>(&self, name: &str, clock: &C) -> Result<AttendanceRecord, LedgerError> {
        self.record(name, clock.now())
    }

    /// All rows recorded for `date`, in file order. A missing file is an empty day.
    pub fn read_day(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let read_failed = |source: csv::Error| LedgerError::Read {
            path: path.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(read_failed)?;

        reader
            .deserialize()
            .collect::<Result<Vec<AttendanceRecord>, csv::Error>>()
            .map_err(read_failed)
    }
}
