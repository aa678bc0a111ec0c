//! callwatch - headless call-center monitor.
//!
//! Polls the dashboard of a live data service and logs its figures until
//! interrupted.

use callwatch::coordinator::ViewKind;
use callwatch::metrics::local_today;
use callwatch::{ClientConfig, HttpDataService, Monitor};

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("callwatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = ClientConfig::load();
    tracing::info!("Starting callwatch against {}...", cfg.api_url);
    tracing::info!(
        "Polling every {}s, call list limit {}",
        cfg.poll_interval.as_secs(),
        cfg.call_list_limit
    );

    let service = Arc::new(HttpDataService::new(&cfg.api_url, cfg.http_timeout)?);
    let monitor = Monitor::new(service, &cfg);
    monitor.mount(ViewKind::Dashboard, local_today()).await?;

    // Report shortly after each poll tick has had time to land
    let mut report = tokio::time::interval_at(
        tokio::time::Instant::now() + Duration::from_secs(5),
        cfg.poll_interval,
    );
    report.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            _ = report.tick() => {
                log_dashboard(&monitor).await;
            }
        }
    }

    tracing::info!("Shutting down...");
    monitor.shutdown().await;

    Ok(())
}

async fn log_dashboard(monitor: &Monitor) {
    let snapshot = match monitor.snapshot(ViewKind::Dashboard).await {
        Some(snapshot) => snapshot,
        None => return,
    };

    if let Some(e) = &snapshot.error {
        tracing::error!("Dashboard unavailable: {}", e);
        return;
    }

    let metrics = match monitor.dashboard_metrics(local_today()).await {
        Some(metrics) => metrics,
        None => {
            tracing::info!("Waiting for first dashboard summary...");
            return;
        }
    };

    let stand_in = if metrics.selection.is_stand_in() {
        " (showing yesterday)"
    } else {
        ""
    };
    tracing::info!(
        "{}{}: {} calls ({:+}%), {} answered ({:+}%), {}% abandoned, {} this week, {} agents active",
        metrics.selection.label,
        stand_in,
        metrics.main.total_calls,
        metrics.calls_trend,
        metrics.main.answered_calls,
        metrics.answered_trend,
        metrics.abandonment_share,
        metrics.week_calls,
        metrics.active_agents
    );

    if let Some(dashboard) = snapshot.bundle.as_deref().and_then(|b| b.as_dashboard()) {
        for queue in &dashboard.summary.queues {
            tracing::info!(
                "Queue {}: {} agents available, {} completed / {} abandoned in 5 min, service level {:.1}%",
                queue.queue_name,
                queue.available_agents,
                queue.calls_completed,
                queue.calls_abandoned,
                queue.service_level
            );
        }
    }

    if let Some(updated) = snapshot.last_update {
        tracing::debug!("Dashboard last updated {}", updated.format("%H:%M:%S"));
    }
}
