use std::fmt::Display;

use chrono::{DateTime, FixedOffset, Local, TimeZone};

use super::domain::CaseId;

/// Source of "now" for case identifiers and ledger timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// Clock pinned to one instant; used by tests and dry runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Formats `PREFIX-YYYYMMDD-HHMM` labels.
///
/// Minute precision only: two submissions in the same minute share a label.
/// The ledger and the downstream job tolerate that, so no suffix is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseIdGenerator {
    prefix: String,
}

impl CaseIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim().to_string();
        Self {
            prefix: if prefix.is_empty() {
                "CASE".to_string()
            } else {
                prefix
            },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn generate<Tz>(&self, at: &DateTime<Tz>) -> CaseId
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        CaseId(format!("{}-{}", self.prefix, at.format("%Y%m%d-%H%M")))
    }
}
