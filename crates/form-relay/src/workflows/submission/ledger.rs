use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::domain::LedgerEntry;
use super::repository::{LedgerError, StatusLedger};

/// Status ledger kept as a CSV file, one row per submission.
///
/// The file must already exist; an absent file means the deployment points
/// at the wrong store, which is treated as a configuration problem.
#[derive(Debug)]
pub struct CsvStatusLedger {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl CsvStatusLedger {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn located(&self) -> Result<&Path, LedgerError> {
        let path = self.path.as_deref().ok_or(LedgerError::NotConfigured)?;
        if !path.is_file() {
            return Err(LedgerError::StoreNotFound {
                location: path.display().to_string(),
            });
        }
        Ok(path)
    }
}

impl StatusLedger for CsvStatusLedger {
    fn verify(&self) -> Result<(), LedgerError> {
        self.located().map(|_| ())
    }

    fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        let path = self.located()?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| LedgerError::Rejected("ledger lock poisoned".to_string()))?;

        let file = OpenOptions::new().append(true).open(path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(&entry)?;
        writer.flush()?;

        debug!(case_id = %entry.case_id, ledger = %path.display(), "ledger row appended");
        Ok(())
    }
}
