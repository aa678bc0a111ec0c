//! Scheduler module for realtime polling.
//!
//! One poll loop runs per view. Each loop owns a single interval timer and a
//! stop channel; dropping the view's [`PollHandle`] stops the loop, so every
//! path that removes a handle disarms its timer.

use crate::coordinator::ViewKind;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Fallback used when a zero polling period is configured.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(30);

/// Whatever a poll tick refreshes.
#[async_trait]
pub trait Refresher: Send + Sync + 'static {
    async fn refresh(&self, view: ViewKind);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Armed poll loop of one view. Dropping it stops the loop.
struct PollHandle {
    stop_tx: broadcast::Sender<()>,
    nudge_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        self.task.abort();
    }
}

/// Starts and stops the per-view poll loops.
pub struct PollingScheduler {
    refresher: Arc<dyn Refresher>,
    period: Duration,
    handles: Mutex<HashMap<ViewKind, PollHandle>>,
}

impl PollingScheduler {
    pub fn new(refresher: Arc<dyn Refresher>, period: Duration) -> Self {
        let period = if period.is_zero() {
            tracing::warn!(
                "Zero polling period configured, using {}s",
                DEFAULT_POLL_PERIOD.as_secs()
            );
            DEFAULT_POLL_PERIOD
        } else {
            period
        };

        Self {
            refresher,
            period,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm the view's poll loop. The first refresh is issued immediately.
    ///
    /// Returns false if the view was already running. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, view: ViewKind) -> bool {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);

        if handles.contains_key(&view) {
            return false;
        }

        let (stop_tx, _) = broadcast::channel(1);
        let (nudge_tx, nudge_rx) = mpsc::channel(1);

        tracing::info!(
            "Scheduler: polling {} view every {}s",
            view,
            self.period.as_secs()
        );

        let task = tokio::spawn(run_poll_loop(
            view,
            self.refresher.clone(),
            self.period,
            stop_tx.subscribe(),
            nudge_rx,
        ));

        handles.insert(
            view,
            PollHandle {
                stop_tx,
                nudge_tx,
                task,
            },
        );
        true
    }

    /// Disarm the view's poll loop. Returns false if it was not running.
    pub fn stop(&self, view: ViewKind) -> bool {
        let removed = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&view);

        match removed {
            Some(handle) => {
                drop(handle);
                tracing::info!("Scheduler: stopped polling {} view", view);
                true
            }
            None => false,
        }
    }

    /// Request one out-of-band refresh from a running loop.
    ///
    /// Nudges arriving while one is already queued are coalesced. Returns
    /// false if the view is not running.
    pub fn nudge(&self, view: ViewKind) -> bool {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);

        match handles.get(&view) {
            Some(handle) => {
                // A full channel already holds a pending nudge
                let _ = handle.nudge_tx.try_send(());
                true
            }
            None => false,
        }
    }

    pub fn state(&self, view: ViewKind) -> SchedulerState {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if handles.contains_key(&view) {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn stop_all(&self) {
        let handles: Vec<(ViewKind, PollHandle)> = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        for (view, handle) in handles {
            drop(handle);
            tracing::info!("Scheduler: stopped polling {} view", view);
        }
    }
}

/// Run the poll loop for a single view.
async fn run_poll_loop(
    view: ViewKind,
    refresher: Arc<dyn Refresher>,
    period: Duration,
    mut stop_rx: broadcast::Receiver<()>,
    mut nudge_rx: mpsc::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                spawn_refresh(view, &refresher);
            }
            Some(()) = nudge_rx.recv() => {
                tracing::debug!("Out-of-band refresh of {} view", view);
                spawn_refresh(view, &refresher);
            }
        }
    }

    tracing::debug!("Poll loop for {} view exited", view);
}

// A slow refresh must not delay the next tick, so each one runs on its own task.
fn spawn_refresh(view: ViewKind, refresher: &Arc<dyn Refresher>) {
    let refresher = refresher.clone();
    tokio::spawn(async move {
        refresher.refresh(view).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRefresher {
        counts: Mutex<HashMap<ViewKind, usize>>,
        total: AtomicUsize,
    }

    impl CountingRefresher {
        fn count(&self, view: ViewKind) -> usize {
            self.counts.lock().unwrap().get(&view).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Refresher for CountingRefresher {
        async fn refresh(&self, view: ViewKind) {
            *self.counts.lock().unwrap().entry(view).or_insert(0) += 1;
            self.total.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Takes longer than two polling periods to finish.
    #[derive(Default)]
    struct SlowRefresher {
        issued: AtomicUsize,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl Refresher for SlowRefresher {
        async fn refresh(&self, _view: ViewKind) {
            self.issued.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(75)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scheduler() -> (Arc<CountingRefresher>, PollingScheduler) {
        let refresher = Arc::new(CountingRefresher::default());
        let scheduler = PollingScheduler::new(refresher.clone(), Duration::from_secs(30));
        (refresher, scheduler)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_refreshes_immediately_then_periodically() {
        let (refresher, scheduler) = scheduler();

        assert!(scheduler.start(ViewKind::Dashboard));
        settle().await;
        assert_eq!(refresher.count(ViewKind::Dashboard), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(refresher.count(ViewKind::Dashboard), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(refresher.count(ViewKind::Dashboard), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_disarms_timer() {
        let (refresher, scheduler) = scheduler();

        scheduler.start(ViewKind::Queues);
        settle().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(refresher.count(ViewKind::Queues), 2);

        assert!(scheduler.stop(ViewKind::Queues));
        assert_eq!(scheduler.state(ViewKind::Queues), SchedulerState::Stopped);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(refresher.count(ViewKind::Queues), 2);
        assert!(!scheduler.stop(ViewKind::Queues));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_loop_per_view() {
        let (refresher, scheduler) = scheduler();

        assert!(scheduler.start(ViewKind::Agents));
        assert!(!scheduler.start(ViewKind::Agents));
        assert_eq!(scheduler.state(ViewKind::Agents), SchedulerState::Running);

        settle().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(refresher.count(ViewKind::Agents), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fire_while_refresh_pending() {
        let refresher = Arc::new(SlowRefresher::default());
        let scheduler = PollingScheduler::new(refresher.clone(), Duration::from_secs(30));

        assert!(scheduler.start(ViewKind::Dashboard));
        tokio::time::sleep(Duration::from_secs(61)).await;

        // Ticks at 0s, 30s and 60s all went out before the first one finished
        assert_eq!(refresher.issued.load(Ordering::SeqCst), 3);
        assert_eq!(refresher.completed.load(Ordering::SeqCst), 0);
        assert!(!scheduler.start(ViewKind::Dashboard));
        assert_eq!(scheduler.state(ViewKind::Dashboard), SchedulerState::Running);

        scheduler.stop(ViewKind::Dashboard);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(refresher.issued.load(Ordering::SeqCst), 3);
        assert_eq!(refresher.completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nudge_only_while_running() {
        let (refresher, scheduler) = scheduler();

        assert!(!scheduler.nudge(ViewKind::Dashboard));

        scheduler.start(ViewKind::Dashboard);
        settle().await;
        assert!(scheduler.nudge(ViewKind::Dashboard));
        settle().await;
        assert_eq!(refresher.count(ViewKind::Dashboard), 2);

        // The regular tick still fires on schedule
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(refresher.count(ViewKind::Dashboard), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_and_drop() {
        let (refresher, scheduler) = scheduler();

        scheduler.start(ViewKind::Dashboard);
        scheduler.start(ViewKind::Queues);
        settle().await;
        scheduler.stop_all();

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(refresher.total.load(Ordering::SeqCst), 2);

        scheduler.start(ViewKind::Agents);
        settle().await;
        drop(scheduler);

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(refresher.total.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_period_falls_back() {
        let scheduler = PollingScheduler::new(
            Arc::new(CountingRefresher::default()),
            Duration::ZERO,
        );
        assert_eq!(scheduler.period(), DEFAULT_POLL_PERIOD);
    }
}
