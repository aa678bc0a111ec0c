//! View sessions: UI events in, view state out.
//!
//! A [`Monitor`] ties the coordinator, the polling scheduler and the playback
//! controller together. Every view that is mounted has a context (refresh mode
//! and date range); unmounting a view stops its polling, closes its state and
//! drops its context, in that order.

use crate::config::ClientConfig;
use crate::coordinator::{
    AggregateBundle, RangeQueryCoordinator, RefreshError, ViewKind, ViewSnapshot,
};
use crate::metrics::{derive_dashboard, DashboardMetrics, RefreshMode};
use crate::playback::{PlaybackState, RecordingPlaybackController};
use crate::scheduler::{PollingScheduler, Refresher, SchedulerState};
use crate::service::{CallRecord, DataService, DateRange, FetchError};

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;

/// Refresh mode and date range of a mounted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewContext {
    pub mode: RefreshMode,
    pub range: DateRange,
}

struct MonitorInner {
    coordinator: RangeQueryCoordinator,
    contexts: RwLock<HashMap<ViewKind, ViewContext>>,
}

#[async_trait]
impl Refresher for MonitorInner {
    async fn refresh(&self, view: ViewKind) {
        let range = match self.contexts.read().await.get(&view) {
            Some(context) => context.range,
            None => return,
        };

        match self.coordinator.refresh(range, view).await {
            Ok(_) => {}
            // Polling carries on; the next tick retries
            Err(RefreshError::Fetch(e)) => {
                tracing::warn!("Poll of {} view failed: {}", view, e);
            }
            Err(e) => {
                tracing::debug!("Poll of {} view dropped: {}", view, e);
            }
        }
    }
}

pub struct Monitor {
    inner: Arc<MonitorInner>,
    scheduler: PollingScheduler,
    playback: Mutex<RecordingPlaybackController>,
}

impl Monitor {
    pub fn new(service: Arc<dyn DataService>, config: &ClientConfig) -> Self {
        let inner = Arc::new(MonitorInner {
            coordinator: RangeQueryCoordinator::new(
                service.clone(),
                config.call_list_limit,
                config.page_size,
            ),
            contexts: RwLock::new(HashMap::new()),
        });
        let scheduler = PollingScheduler::new(inner.clone(), config.poll_interval);

        Self {
            inner,
            scheduler,
            playback: Mutex::new(RecordingPlaybackController::new(service)),
        }
    }

    /// Mode a view starts in: live views poll, history views wait for input.
    pub fn default_mode(view: ViewKind) -> RefreshMode {
        match view {
            ViewKind::Dashboard | ViewKind::Queues | ViewKind::Agents => RefreshMode::Realtime,
            ViewKind::Calls | ViewKind::Reports => RefreshMode::Manual,
        }
    }

    /// Mount a view on `today` in its default mode and load it.
    ///
    /// Realtime views are loaded by the scheduler's immediate first tick and
    /// return at once; manual views are loaded before returning. Mounting a
    /// mounted view does nothing.
    pub async fn mount(&self, view: ViewKind, today: NaiveDate) -> Result<(), RefreshError> {
        let context = ViewContext {
            mode: Self::default_mode(view),
            range: DateRange::day(today),
        };

        {
            let mut contexts = self.inner.contexts.write().await;
            if contexts.contains_key(&view) {
                return Ok(());
            }
            contexts.insert(view, context);
        }
        self.inner.coordinator.open(view).await;
        tracing::info!("Mounted {} view ({:?}, {})", view, context.mode, context.range);

        match context.mode {
            RefreshMode::Realtime => {
                self.scheduler.start(view);
                Ok(())
            }
            RefreshMode::Manual => self
                .inner
                .coordinator
                .refresh(context.range, view)
                .await
                .map(|_| ()),
        }
    }

    /// Tear a view down. Its timer is disarmed before its state is dropped.
    pub async fn unmount(&self, view: ViewKind) {
        self.scheduler.stop(view);
        self.inner.coordinator.close(view).await;
        self.inner.contexts.write().await.remove(&view);

        if view == ViewKind::Calls {
            let mut playback = self.playback();
            if let PlaybackState::Playing { call_id, date } = playback.state().clone() {
                playback.toggle(&call_id, date);
            }
        }
        tracing::info!("Unmounted {} view", view);
    }

    pub async fn switch_view(
        &self,
        from: ViewKind,
        to: ViewKind,
        today: NaiveDate,
    ) -> Result<(), RefreshError> {
        if from != to {
            self.unmount(from).await;
        }
        self.mount(to, today).await
    }

    /// Switch a mounted view between polling and manual refresh.
    ///
    /// Entering manual mode discards any refresh still in flight.
    pub async fn set_mode(&self, view: ViewKind, mode: RefreshMode) -> bool {
        {
            let mut contexts = self.inner.contexts.write().await;
            match contexts.get_mut(&view) {
                Some(context) => context.mode = mode,
                None => return false,
            }
        }

        match mode {
            RefreshMode::Realtime => {
                self.scheduler.start(view);
            }
            RefreshMode::Manual => {
                self.scheduler.stop(view);
                self.inner.coordinator.invalidate(view).await;
            }
        }
        true
    }

    /// Change a view's date range and reload it.
    ///
    /// A polling view gets an out-of-band refresh on its loop; a manual view is
    /// refreshed before returning.
    pub async fn set_range(&self, view: ViewKind, range: DateRange) -> Result<(), RefreshError> {
        {
            let mut contexts = self.inner.contexts.write().await;
            match contexts.get_mut(&view) {
                Some(context) => context.range = range,
                None => return Err(RefreshError::Closed(view)),
            }
        }

        if self.scheduler.nudge(view) {
            return Ok(());
        }
        self.inner.coordinator.refresh(range, view).await.map(|_| ())
    }

    /// Select a single day, as the dashboard's date picker does.
    pub async fn select_date(&self, view: ViewKind, date: NaiveDate) -> Result<(), RefreshError> {
        self.set_range(view, DateRange::day(date)).await
    }

    /// Refresh a view now, whatever its mode.
    pub async fn refresh_now(&self, view: ViewKind) -> Result<Arc<AggregateBundle>, RefreshError> {
        let range = self
            .context(view)
            .await
            .map(|c| c.range)
            .ok_or(RefreshError::Closed(view))?;
        self.inner.coordinator.refresh(range, view).await
    }

    pub async fn context(&self, view: ViewKind) -> Option<ViewContext> {
        self.inner.contexts.read().await.get(&view).copied()
    }

    pub async fn snapshot(&self, view: ViewKind) -> Option<ViewSnapshot> {
        self.inner.coordinator.snapshot(view).await
    }

    pub fn scheduler_state(&self, view: ViewKind) -> SchedulerState {
        self.scheduler.state(view)
    }

    /// Dashboard figures for the last committed summary, if there is one.
    pub async fn dashboard_metrics(&self, today: NaiveDate) -> Option<DashboardMetrics> {
        let context = self.context(ViewKind::Dashboard).await?;
        let bundle = self.snapshot(ViewKind::Dashboard).await?.bundle?;
        let dashboard = bundle.as_dashboard()?;
        Some(derive_dashboard(
            &dashboard.summary,
            context.mode,
            context.range.start,
            today,
        ))
    }

    // ==========================================================================
    // Call list
    // ==========================================================================

    pub async fn call_page(&self) -> Vec<CallRecord> {
        self.inner.coordinator.call_page().await
    }

    pub async fn set_call_page(&self, index: usize) -> bool {
        self.inner.coordinator.set_call_page(index).await
    }

    pub async fn set_call_page_size(&self, size: usize) -> bool {
        self.inner.coordinator.set_call_page_size(size).await
    }

    /// Filtered call count and page count at the current page size.
    pub async fn call_list_totals(&self) -> Option<(usize, usize)> {
        self.inner
            .coordinator
            .with_call_list(|cache| (cache.len(), cache.page_count()))
            .await
    }

    // ==========================================================================
    // Playback
    // ==========================================================================

    fn playback(&self) -> std::sync::MutexGuard<'_, RecordingPlaybackController> {
        self.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn toggle_playback(&self, record: &CallRecord) -> PlaybackState {
        self.playback().toggle_record(record).clone()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback().state().clone()
    }

    pub fn active_stream_url(&self) -> Option<String> {
        self.playback().active_stream_url()
    }

    pub fn download_url(&self, record: &CallRecord) -> String {
        self.playback()
            .download_url(&record.call_id, record.recording_date())
    }

    pub async fn recording_available(&self, record: &CallRecord) -> Result<bool, FetchError> {
        self.inner
            .coordinator
            .service()
            .recording_available(&record.call_id, record.recording_date())
            .await
    }

    /// Unmount every view.
    pub async fn shutdown(&self) {
        self.scheduler.stop_all();
        for view in ViewKind::ALL {
            if self.context(view).await.is_some() {
                self.unmount(view).await;
            }
        }
        tracing::info!("Monitor shut down");
    }
}
