//! Keystroke-driven lookups: last keystroke wins.
//!
//! A [`Debouncer`] holds at most one pending lookup. Each new call cancels
//! the pending one and restarts the delay.

use clap::ValueEnum;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::JobRecord;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 2;

pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `lookup` after the delay, cancelling whatever was pending.
    /// Must be called from within a tokio runtime.
    pub fn call<F>(&mut self, lookup: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            lookup.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("cancelled pending lookup");
            }
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the pending lookup, if any, to fire. A panic inside the
    /// lookup is reported as a warning instead of being propagated.
    pub async fn flush(&mut self) {
        let Some(handle) = self.pending.take() else {
            return;
        };
        match handle.await {
            Ok(()) => {}
            Err(e) if e.is_panic() => warn!(error = %e, "pending lookup panicked"),
            Err(_) => debug!("pending lookup was cancelled"),
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SuggestField {
    Organization,
    Location,
    Country,
    Sector,
}

/// Autocomplete source built from the loaded job records.
#[derive(Debug, Clone)]
pub struct Suggester {
    values: Vec<String>,
}

impl Suggester {
    pub fn from_records(records: &[JobRecord], field: SuggestField) -> Self {
        let mut seen = HashSet::new();
        let mut values: Vec<String> = records
            .iter()
            .filter_map(|job| match field {
                SuggestField::Organization => Some(job.organization.as_str()),
                SuggestField::Location => Some(job.location.as_str()),
                SuggestField::Country => Some(job.country.as_str()),
                SuggestField::Sector => job.sector.as_deref(),
            })
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .filter(|v| seen.insert(v.to_lowercase()))
            .map(str::to_string)
            .collect();
        values.sort_by_key(|v| v.to_lowercase());
        Self { values }
    }

    /// Prefix matches first, then substring matches, case-insensitive.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let (prefix, contains): (Vec<&String>, Vec<&String>) = self
            .values
            .iter()
            .filter(|v| v.to_lowercase().contains(&query))
            .partition(|v| v.to_lowercase().starts_with(&query));

        prefix
            .into_iter()
            .chain(contains)
            .take(limit)
            .cloned()
            .collect()
    }
}
