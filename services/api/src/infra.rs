use chrono::Local;
use form_relay::error::AppError;
use form_relay::workflows::submission::{
    parse_event, DispatchError, DispatchEvent, DispatchPublisher, LedgerEntry, LedgerError,
    StatusLedger, SubmissionEvent,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryStatusLedger {
    rows: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl StatusLedger for InMemoryStatusLedger {
    fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|_| LedgerError::Rejected("ledger mutex poisoned".to_string()))?;
        guard.push(entry);
        Ok(())
    }
}

impl InMemoryStatusLedger {
    pub(crate) fn rows(&self) -> Vec<LedgerEntry> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDispatchPublisher {
    events: Arc<Mutex<Vec<DispatchEvent>>>,
}

impl DispatchPublisher for InMemoryDispatchPublisher {
    fn publish(&self, event: &DispatchEvent) -> Result<(), DispatchError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| DispatchError::Transport("dispatch mutex poisoned".to_string()))?;
        guard.push(event.clone());
        Ok(())
    }
}

impl InMemoryDispatchPublisher {
    pub(crate) fn events(&self) -> Vec<DispatchEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

/// Explicit path first, then the CI-provided event file, then a local sample.
pub(crate) fn resolve_event_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    if let Some(path) = env::var_os("GITHUB_EVENT_PATH").map(PathBuf::from) {
        if path.is_file() {
            return path;
        }
    }

    env::var_os("LOCAL_EVENT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_event.json"))
}

/// Accepts native events and `repository_dispatch` envelopes alike.
pub(crate) fn read_event(path: &Path) -> Result<SubmissionEvent, AppError> {
    debug!(path = %path.display(), "reading submission event");
    let raw = fs::read_to_string(path)?;
    Ok(parse_event(&raw, Local::now().fixed_offset())?)
}
