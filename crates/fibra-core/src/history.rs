use crate::diagnose::outcome::{DiagnosisResult, FiberStatus};
use crate::error::FibraError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One line of the summary export and of the consolidated history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub fiber_id: String,
    pub period: Option<String>,
    pub source_format: String,
    pub expected_length_km: Option<Decimal>,
    pub measured_length_km: Option<Decimal>,
    pub total_loss_db: Option<Decimal>,
    pub max_allowed_loss_db: Option<Decimal>,
    pub wavelength_nm: Option<u32>,
    pub events: usize,
    pub critical_events: usize,
    pub status: FiberStatus,
    pub reason: String,
}

impl From<&DiagnosisResult> for SummaryRow {
    fn from(r: &DiagnosisResult) -> Self {
        SummaryRow {
            fiber_id: r.fiber_id.clone(),
            period: r.period.clone(),
            source_format: r.source_format.clone(),
            expected_length_km: r.expected_length_km,
            measured_length_km: r.measured_length_km,
            total_loss_db: r.total_loss_db,
            max_allowed_loss_db: r.max_allowed_loss_db,
            wavelength_nm: r.wavelength_nm,
            events: r.event_count(),
            critical_events: r.critical_events,
            status: r.status,
            reason: r.reason.clone(),
        }
    }
}

/// Write summary rows as CSV with a header line.
pub fn write_summary<W: Write>(writer: W, rows: &[SummaryRow]) -> Result<(), FibraError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Flat CSV file accumulating summaries across runs.
///
/// Saves read the whole file and write it back. There is no locking; the
/// last writer wins.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HistoryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored rows, oldest first. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<SummaryRow>, FibraError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();
        for row in rdr.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Append rows and rewrite the file. Returns the new row count.
    pub fn append(&self, new_rows: &[SummaryRow]) -> Result<usize, FibraError> {
        let mut rows = self.load()?;
        rows.extend_from_slice(new_rows);

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        write_summary(&mut tmp, &rows)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "history saved");
        Ok(rows.len())
    }

    /// Delete the history file. Returns whether there was one.
    pub fn clear(&self) -> Result<bool, FibraError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
