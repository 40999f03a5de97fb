use std::sync::atomic::{AtomicU64, Ordering};

use crate::data::filter::{TimeRange, filter_range};
use crate::data::loader::Loaded;
use crate::data::model::{Dataset, Diagnostic, Normalized};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Request tracking
// ---------------------------------------------------------------------------

/// Identifier of one data acquisition request. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// Issues monotonically increasing request ids and tells stale ones apart.
///
/// Cancellation is not propagated to the transport: a superseded request
/// simply has its result ignored when it arrives.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestId {
        RequestId(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `id` is the most recently issued request.
    pub fn is_current(&self, id: RequestId) -> bool {
        self.latest.load(Ordering::SeqCst) == id.0
    }

    /// Pass `value` through only if `id` is still current.
    pub fn accept<T>(&self, id: RequestId, value: T) -> Option<T> {
        if self.is_current(id) {
            Some(value)
        } else {
            log::debug!("discarding stale response for request {}", id.0);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard session state
// ---------------------------------------------------------------------------

/// State of one dashboard, independent of rendering.
#[derive(Debug, Default)]
pub struct Session {
    /// Loaded source (None until the first load completes).
    pub loaded: Option<Loaded>,

    /// Sheet picked by the user; `None` means the active one.
    pub sheet: Option<String>,

    /// Current time window; `None` covers the whole dataset.
    pub range: Option<TimeRange>,

    /// Variables picked for display, as canonical keys.
    pub variables: Vec<String>,

    /// Diagnostics from the last accepted load.
    pub diagnostics: Vec<Diagnostic>,

    /// Status / error message for the user.
    pub status_message: Option<String>,

    /// Whether a load is in flight.
    pub loading: bool,

    requests: RequestTracker,
}

impl Session {
    /// Mark a new load as started and return its id.
    pub fn begin_load(&mut self) -> RequestId {
        self.loading = true;
        self.status_message = None;
        self.requests.issue()
    }

    /// Apply a finished load. Returns `false` when the result was stale and
    /// has been dropped; the session is then left untouched.
    pub fn finish_load(&mut self, id: RequestId, result: Result<Normalized<Loaded>>) -> bool {
        let Some(result) = self.requests.accept(id, result) else {
            return false;
        };
        self.loading = false;
        match result {
            Ok(out) => {
                // Default window: the whole active dataset.
                self.range = TimeRange::covering(out.value.active());
                self.sheet = None;
                self.diagnostics = out.diagnostics;
                self.loaded = Some(out.value);
            }
            Err(e) => {
                log::warn!("load failed: {e}");
                self.status_message = Some(e.to_string());
            }
        }
        true
    }

    /// The dataset the filters apply to.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.loaded.as_ref()?.select(self.sheet.as_deref())
    }

    /// Switch to another sheet and reset the window to cover it.
    pub fn select_sheet(&mut self, name: &str) -> bool {
        let Some(ds) = self.loaded.as_ref().and_then(|l| l.select(Some(name))) else {
            return false;
        };
        self.range = TimeRange::covering(ds);
        self.sheet = Some(name.to_string());
        true
    }

    /// Toggle a variable in the selection.
    pub fn toggle_variable(&mut self, key: &str) {
        if let Some(pos) = self.variables.iter().position(|v| v == key) {
            self.variables.remove(pos);
        } else {
            self.variables.push(key.to_string());
        }
    }

    /// Recompute the filtered view for the current selection.
    pub fn filtered(&self) -> Option<Result<Normalized<Dataset>>> {
        let ds = self.dataset()?;
        let range = self.range.or_else(|| TimeRange::covering(ds))?;
        Some(filter_range(ds, &range, &self.variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{NormalizeOptions, normalize_csv};
    use crate::error::Error;

    fn loaded(text: &str) -> Result<Normalized<Loaded>> {
        normalize_csv(text, &NormalizeOptions::full()).map(|n| n.map(Loaded::Single))
    }

    #[test]
    fn ids_increase() {
        let t = RequestTracker::new();
        let a = t.issue();
        let b = t.issue();
        assert!(b > a);
        assert!(!t.is_current(a));
        assert!(t.is_current(b));
        assert_eq!(t.accept(a, 1), None);
        assert_eq!(t.accept(b, 2), Some(2));
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut s = Session::default();
        let first = s.begin_load();
        let second = s.begin_load();

        assert!(s.finish_load(second, loaded("time,v\n2024-01-01,2\n")));
        assert!(!s.finish_load(first, loaded("time,v\n2024-01-01,1\n")));
        assert_eq!(s.dataset().unwrap().values("v"), vec![2.0]);
        assert!(!s.loading);
    }

    #[test]
    fn failed_load_sets_status() {
        let mut s = Session::default();
        let id = s.begin_load();
        assert!(s.finish_load(id, Err(Error::EmptyDataset)));
        assert!(s.status_message.is_some());
        assert!(s.dataset().is_none());
        assert!(s.filtered().is_none());
    }

    #[test]
    fn filtered_view_follows_selection() {
        let mut s = Session::default();
        let id = s.begin_load();
        s.finish_load(id, loaded("time,a,b\n2024-01-01,1,2\n2024-01-02,3,4\n"));
        s.toggle_variable("b");
        s.toggle_variable("a");
        s.toggle_variable("b");
        let view = s.filtered().unwrap().unwrap().value;
        assert_eq!(view.catalog().keys(), ["a"]);
        assert_eq!(view.len(), 2);
        assert!(!s.select_sheet("Sheet2"));
    }
}
