//! 📝 Spin Logging
//!
//! Optional CSV audit trail of every processed spin for offline analysis.
//! Records: spin_id, timestamp, spin, phase, predicted dozen, confidence,
//! outcome, stake delta, balance, next bet.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::session::SpinSnapshot;

/// One CSV row
#[derive(Debug, Clone)]
pub struct SpinLogEntry {
    pub spin_id: u64,
    pub timestamp_ms: i64,
    pub spin: u8,
    pub phase: &'static str,
    /// Dozen predicted for this spin (the previous round's prediction)
    pub predicted_dozen: Option<u8>,
    pub won: Option<bool>,
    pub amount: Option<f64>,
    pub balance: f64,
    pub next_bet: f64,
    /// Prediction emitted for the following spin
    pub next_dozen: Option<u8>,
    pub next_confidence: u8,
}

impl SpinLogEntry {
    pub fn from_snapshot(snapshot: &SpinSnapshot) -> Self {
        let evaluation = snapshot.last_result.as_ref();
        Self {
            spin_id: 0,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            spin: snapshot.spin,
            phase: snapshot.phase.as_str(),
            predicted_dozen: evaluation.map(|e| e.predicted.index()),
            won: evaluation.map(|e| e.won),
            amount: evaluation.and_then(|e| e.settlement.as_ref()).map(|s| s.amount),
            balance: snapshot.balance,
            next_bet: snapshot.bet,
            next_dozen: snapshot.prediction.dozen.map(|d| d.index()),
            next_confidence: snapshot.prediction.confidence,
        }
    }

    /// Convert to CSV row
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{:.2},{:.0},{},{},{}",
            self.spin_id,
            self.timestamp_ms,
            self.spin,
            self.phase,
            self.predicted_dozen.map(|d| d.to_string()).unwrap_or_default(),
            self.won.map(|w| if w { "win" } else { "loss" }).unwrap_or(""),
            self.amount.map(|a| format!("{:.0}", a)).unwrap_or_default(),
            self.balance,
            self.next_bet,
            self.next_dozen.map(|d| d.to_string()).unwrap_or_default(),
            self.next_confidence,
            chrono::DateTime::from_timestamp_millis(self.timestamp_ms)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default()
        )
    }

    /// CSV header
    pub fn csv_header() -> &'static str {
        "spin_id,timestamp_ms,spin,phase,predicted_dozen,outcome,amount,balance,next_bet,next_dozen,next_confidence,datetime"
    }
}

/// Spin logger that appends to a CSV file
pub struct SpinLogger {
    log_file: File,
    next_id: u64,
}

impl SpinLogger {
    /// Open (or create with header) the CSV log at `log_path`
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self> {
        let path = log_path.as_ref();
        let file_exists = path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open spin log: {:?}", path))?;

        if !file_exists {
            writeln!(file, "{}", SpinLogEntry::csv_header())
                .context("Failed to write CSV header")?;
            file.flush()?;
            info!("📝 Created new spin log: {:?}", path);
        } else {
            info!("📝 Opened existing spin log: {:?}", path);
        }

        Ok(Self {
            log_file: file,
            next_id: 1,
        })
    }

    /// Append one snapshot, returning its row id
    pub fn log_spin(&mut self, snapshot: &SpinSnapshot) -> Result<u64> {
        let mut entry = SpinLogEntry::from_snapshot(snapshot);
        entry.spin_id = self.next_id;
        self.next_id += 1;

        writeln!(self.log_file, "{}", entry.to_csv_row())
            .context("Failed to write spin log entry")?;
        self.log_file.flush()?;

        debug!("📝 Logged spin #{}: {} ({})", entry.spin_id, entry.spin, entry.phase);
        Ok(entry.spin_id)
    }

    /// Rows written by this logger
    pub fn entries_logged(&self) -> u64 {
        self.next_id - 1
    }
}
