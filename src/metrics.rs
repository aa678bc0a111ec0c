//! Metric derivation over fetched snapshots.
//!
//! Everything here is pure: the same summary, mode and dates always derive the
//! same figures.

use crate::service::{AgentState, DashboardSummary, MetricSnapshot, Period, RealtimeAgentStatus};

use chrono::{Local, NaiveDate};
use std::fmt;

/// How a view is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefreshMode {
    /// Polled on a fixed period
    #[default]
    Realtime,
    /// Refreshed only on explicit date change or request
    Manual,
}

/// Display label of the period a dashboard is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodLabel {
    Today,
    Yesterday,
    /// Today has no calls yet, so yesterday is shown instead
    LatestAvailable,
    /// A manually selected day other than today or yesterday
    Date(NaiveDate),
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodLabel::Today => write!(f, "today"),
            PeriodLabel::Yesterday => write!(f, "yesterday"),
            PeriodLabel::LatestAvailable => write!(f, "yesterday (latest available)"),
            PeriodLabel::Date(date) => write!(f, "{}", date.format("%-d %b %Y")),
        }
    }
}

/// Which summary periods a dashboard shows and compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodSelection {
    pub main: Period,
    pub comparison: Option<Period>,
    pub label: PeriodLabel,
}

impl PeriodSelection {
    /// True when the figures shown are yesterday's standing in for another day.
    ///
    /// The summary only carries today, yesterday and the trailing week, so an
    /// arbitrary selected day has no snapshot of its own.
    pub fn is_stand_in(&self) -> bool {
        matches!(self.label, PeriodLabel::Date(_))
    }
}

/// Pick the main and comparison periods for the dashboard.
pub fn select_period(
    summary: &DashboardSummary,
    mode: RefreshMode,
    selected: NaiveDate,
    today: NaiveDate,
) -> PeriodSelection {
    match mode {
        RefreshMode::Realtime => {
            if summary.today.total_calls > 0 {
                PeriodSelection {
                    main: Period::Today,
                    comparison: Some(Period::Yesterday),
                    label: PeriodLabel::Today,
                }
            } else {
                PeriodSelection {
                    main: Period::Yesterday,
                    comparison: None,
                    label: PeriodLabel::LatestAvailable,
                }
            }
        }
        RefreshMode::Manual if selected == today => PeriodSelection {
            main: Period::Today,
            comparison: Some(Period::Yesterday),
            label: PeriodLabel::Today,
        },
        RefreshMode::Manual if today.pred_opt() == Some(selected) => PeriodSelection {
            main: Period::Yesterday,
            comparison: None,
            label: PeriodLabel::Yesterday,
        },
        RefreshMode::Manual => PeriodSelection {
            main: Period::Yesterday,
            comparison: None,
            label: PeriodLabel::Date(selected),
        },
    }
}

/// Round to the nearest integer, halves up (`floor(x + 0.5)`).
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Percent change from `previous` to `current`; 0 when there is nothing to compare.
pub fn trend(current: f64, previous: Option<f64>) -> i64 {
    match previous {
        Some(previous) if previous != 0.0 => {
            round_half_up((current - previous) / previous * 100.0)
        }
        _ => 0,
    }
}

/// Share of abandoned calls in percent. A zero total counts as one call.
pub fn abandonment_share(abandoned: u64, total: u64) -> i64 {
    round_half_up(abandoned as f64 / total.max(1) as f64 * 100.0)
}

/// Agents currently logged in to some queue.
pub fn active_agents(agents: &[RealtimeAgentStatus]) -> usize {
    agents
        .iter()
        .filter(|a| a.status != AgentState::Unavailable)
        .count()
}

/// Figures shown on the dashboard, derived from one summary.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    pub selection: PeriodSelection,
    pub main: MetricSnapshot,
    pub comparison: Option<MetricSnapshot>,
    pub calls_trend: i64,
    pub answered_trend: i64,
    pub abandonment_share: i64,
    pub week_calls: u64,
    pub active_agents: usize,
    /// Manual mode is showing today and no call has arrived yet
    pub no_calls_yet_today: bool,
}

pub fn derive_dashboard(
    summary: &DashboardSummary,
    mode: RefreshMode,
    selected: NaiveDate,
    today: NaiveDate,
) -> DashboardMetrics {
    let selection = select_period(summary, mode, selected, today);
    let main = summary.snapshot(selection.main).clone();
    let comparison = selection.comparison.map(|p| summary.snapshot(p).clone());

    let calls_trend = trend(
        main.total_calls as f64,
        comparison.as_ref().map(|c| c.total_calls as f64),
    );
    let answered_trend = trend(
        main.answered_calls as f64,
        comparison.as_ref().map(|c| c.answered_calls as f64),
    );

    DashboardMetrics {
        calls_trend,
        answered_trend,
        abandonment_share: abandonment_share(main.abandoned_calls, main.total_calls),
        week_calls: summary.week.total_calls,
        active_agents: active_agents(&summary.agents),
        no_calls_yet_today: mode == RefreshMode::Manual
            && selection.main == Period::Today
            && main.total_calls == 0,
        selection,
        main,
        comparison,
    }
}

/// `"{m}m {s}s"`, as used for wait and talk times.
pub fn format_minutes_seconds(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// `"HH:MM:SS"`; hours are not wrapped at 24.
pub fn format_hms(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// The client's local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
