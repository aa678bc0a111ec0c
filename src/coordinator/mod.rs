//! Range query coordination.
//!
//! Each view owns one [`ViewState`] behind the coordinator's lock. A refresh
//! takes a generation token when it is issued and may only commit if that token
//! is still the view's latest when its queries settle, so the most recently
//! issued refresh always wins regardless of completion order.

mod bundle;

pub use bundle::*;

use crate::cache::PaginatedListCache;
use crate::service::{CallRecord, DataService, DateRange, FetchError};

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// A screen of the monitoring client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Dashboard,
    Calls,
    Queues,
    Agents,
    Reports,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        ViewKind::Dashboard,
        ViewKind::Calls,
        ViewKind::Queues,
        ViewKind::Agents,
        ViewKind::Reports,
    ];
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewKind::Dashboard => "dashboard",
            ViewKind::Calls => "calls",
            ViewKind::Queues => "queues",
            ViewKind::Agents => "agents",
            ViewKind::Reports => "reports",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// A newer refresh was issued for the view; this result was discarded.
    #[error("{view} refresh {generation} superseded by a newer request")]
    Superseded { view: ViewKind, generation: u64 },
    #[error("{0} view is closed")]
    Closed(ViewKind),
}

/// Read-only copy of a view's state.
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    pub bundle: Option<Arc<AggregateBundle>>,
    /// Set when the view's primary query failed on the last committed refresh
    pub error: Option<FetchError>,
    pub last_update: Option<DateTime<Local>>,
    /// The latest issued refresh has not settled yet
    pub loading: bool,
}

struct ViewState {
    latest: u64,
    pending: Option<u64>,
    bundle: Option<Arc<AggregateBundle>>,
    error: Option<FetchError>,
    last_update: Option<DateTime<Local>>,
    records: PaginatedListCache,
}

impl ViewState {
    fn new(page_size: usize) -> Self {
        Self {
            latest: 0,
            pending: None,
            bundle: None,
            error: None,
            last_update: None,
            records: PaginatedListCache::new(page_size),
        }
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            bundle: self.bundle.clone(),
            error: self.error.clone(),
            last_update: self.last_update,
            loading: self.pending.is_some(),
        }
    }
}

/// Issues each view's queries and commits their results to the view's state.
pub struct RangeQueryCoordinator {
    service: Arc<dyn DataService>,
    call_list_limit: usize,
    page_size: usize,
    next_token: AtomicU64,
    views: RwLock<HashMap<ViewKind, ViewState>>,
}

impl RangeQueryCoordinator {
    pub fn new(service: Arc<dyn DataService>, call_list_limit: usize, page_size: usize) -> Self {
        Self {
            service,
            call_list_limit,
            page_size,
            next_token: AtomicU64::new(0),
            views: RwLock::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &Arc<dyn DataService> {
        &self.service
    }

    /// Create empty state for a view. Opening an open view keeps its state.
    pub async fn open(&self, view: ViewKind) {
        let mut views = self.views.write().await;
        views
            .entry(view)
            .or_insert_with(|| ViewState::new(self.page_size));
    }

    /// Drop a view's state. Refreshes still in flight for it are discarded.
    pub async fn close(&self, view: ViewKind) {
        if self.views.write().await.remove(&view).is_some() {
            tracing::debug!("Closed {} view", view);
        }
    }

    pub async fn is_open(&self, view: ViewKind) -> bool {
        self.views.read().await.contains_key(&view)
    }

    /// Mark any in-flight refresh of the view as stale without issuing a new one.
    pub async fn invalidate(&self, view: ViewKind) {
        let token = self.issue();
        if let Some(state) = self.views.write().await.get_mut(&view) {
            state.latest = token;
            state.pending = None;
        }
    }

    fn issue(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Fetch and commit a fresh bundle for `view`.
    ///
    /// The dashboard uses `range.start` as its reference day. Vacuous ranges
    /// are sent as-is; rejecting them is up to the data service.
    pub async fn refresh(
        &self,
        range: DateRange,
        view: ViewKind,
    ) -> Result<Arc<AggregateBundle>, RefreshError> {
        let token = {
            let mut views = self.views.write().await;
            let state = views.get_mut(&view).ok_or(RefreshError::Closed(view))?;
            let token = self.issue();
            state.latest = token;
            state.pending = Some(token);
            token
        };

        if range.is_vacuous() {
            tracing::debug!("{} refresh {} issued for vacuous range {}", view, token, range);
        } else {
            tracing::debug!("{} refresh {} issued for {}", view, token, range);
        }

        let result = bundle::fetch(self.service.as_ref(), view, range, self.call_list_limit).await;

        let mut views = self.views.write().await;
        let state = match views.get_mut(&view) {
            Some(state) => state,
            None => {
                tracing::debug!("Discarding {} refresh {}: view closed", view, token);
                return Err(RefreshError::Closed(view));
            }
        };
        if state.latest != token {
            tracing::debug!(
                "Discarding {} refresh {}: superseded by {}",
                view,
                token,
                state.latest
            );
            return Err(RefreshError::Superseded {
                view,
                generation: token,
            });
        }
        state.pending = None;

        match result {
            Ok(bundle) => {
                if let AggregateBundle::Calls(calls) = &bundle {
                    state.records.set_records(calls.calls.data.clone());
                }
                let bundle = Arc::new(bundle);
                state.bundle = Some(bundle.clone());
                state.error = None;
                state.last_update = Some(Local::now());
                tracing::info!("{} view refreshed for {}", view, range);
                Ok(bundle)
            }
            Err(e) => {
                tracing::error!("{} view refresh failed: {}", view, e);
                state.bundle = None;
                state.error = Some(e.clone());
                Err(RefreshError::Fetch(e))
            }
        }
    }

    pub async fn snapshot(&self, view: ViewKind) -> Option<ViewSnapshot> {
        self.views.read().await.get(&view).map(ViewState::snapshot)
    }

    /// Run `f` against the calls view's list cache, if the view is open.
    pub async fn with_call_list<R>(&self, f: impl FnOnce(&PaginatedListCache) -> R) -> Option<R> {
        self.views
            .read()
            .await
            .get(&ViewKind::Calls)
            .map(|state| f(&state.records))
    }

    /// Rows on the calls view's current page.
    pub async fn call_page(&self) -> Vec<CallRecord> {
        self.with_call_list(|cache| cache.current_page().to_vec())
            .await
            .unwrap_or_default()
    }

    /// Returns false if the calls view is not open.
    pub async fn set_call_page(&self, index: usize) -> bool {
        match self.views.write().await.get_mut(&ViewKind::Calls) {
            Some(state) => {
                state.records.set_page(index);
                true
            }
            None => false,
        }
    }

    /// Returns false if the calls view is not open.
    pub async fn set_call_page_size(&self, size: usize) -> bool {
        match self.views.write().await.get_mut(&ViewKind::Calls) {
            Some(state) => {
                state.records.set_page_size(size);
                true
            }
            None => false,
        }
    }
}
