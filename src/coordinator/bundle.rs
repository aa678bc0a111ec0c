use super::ViewKind;
use crate::cache::filter_external;
use crate::service::{
    AgentCalls, AgentInfo, AgentStat, CallRecord, ComparisonEntry, DailySummary,
    DashboardSummary, DataService, DateRange, DispositionEntry, FetchError, HourlyBucket,
    MetricSnapshot, QueueInfo, QueueStat, RealtimeAgentStatus, RealtimeQueueStatus,
};

/// Result of a secondary query. A failed section is empty and keeps its error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section<T> {
    pub data: T,
    pub error: Option<FetchError>,
}

impl<T: Default> Section<T> {
    fn settle(view: ViewKind, name: &str, result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Self { data, error: None },
            Err(e) => {
                tracing::warn!("{} view: {} unavailable: {}", view, name, e);
                Self {
                    data: T::default(),
                    error: Some(e),
                }
            }
        }
    }
}

impl<T> Section<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardBundle {
    pub summary: DashboardSummary,
    pub hourly: Section<Vec<HourlyBucket>>,
    pub dispositions: Section<Vec<DispositionEntry>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallsBundle {
    pub statistics: MetricSnapshot,
    /// External calls only; extensions and unknown numbers are dropped
    pub calls: Section<Vec<CallRecord>>,
    pub by_agent: Section<Vec<AgentCalls>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuesBundle {
    pub statistics: Vec<QueueStat>,
    pub queues: Section<Vec<QueueInfo>>,
    pub realtime: Section<Vec<RealtimeQueueStatus>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentsBundle {
    pub statistics: Vec<AgentStat>,
    pub agents: Section<Vec<AgentInfo>>,
    pub comparison: Section<Vec<ComparisonEntry>>,
    pub realtime: Section<Vec<RealtimeAgentStatus>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportsBundle {
    pub daily: Vec<DailySummary>,
    pub hourly: Section<Vec<HourlyBucket>>,
    pub dispositions: Section<Vec<DispositionEntry>>,
    pub queues: Section<Vec<QueueStat>>,
    pub comparison: Section<Vec<ComparisonEntry>>,
}

/// Everything one refresh of a view produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateBundle {
    Dashboard(DashboardBundle),
    Calls(CallsBundle),
    Queues(QueuesBundle),
    Agents(AgentsBundle),
    Reports(ReportsBundle),
}

impl AggregateBundle {
    pub fn view(&self) -> ViewKind {
        match self {
            AggregateBundle::Dashboard(_) => ViewKind::Dashboard,
            AggregateBundle::Calls(_) => ViewKind::Calls,
            AggregateBundle::Queues(_) => ViewKind::Queues,
            AggregateBundle::Agents(_) => ViewKind::Agents,
            AggregateBundle::Reports(_) => ViewKind::Reports,
        }
    }

    pub fn as_dashboard(&self) -> Option<&DashboardBundle> {
        match self {
            AggregateBundle::Dashboard(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_calls(&self) -> Option<&CallsBundle> {
        match self {
            AggregateBundle::Calls(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_queues(&self) -> Option<&QueuesBundle> {
        match self {
            AggregateBundle::Queues(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_agents(&self) -> Option<&AgentsBundle> {
        match self {
            AggregateBundle::Agents(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_reports(&self) -> Option<&ReportsBundle> {
        match self {
            AggregateBundle::Reports(b) => Some(b),
            _ => None,
        }
    }
}

/// Run the view's queries concurrently and assemble its bundle.
///
/// Every query settles before this returns. Only the view's primary aggregate
/// can fail the whole fetch.
pub(super) async fn fetch(
    service: &dyn DataService,
    view: ViewKind,
    range: DateRange,
    call_list_limit: usize,
) -> Result<AggregateBundle, FetchError> {
    match view {
        ViewKind::Dashboard => {
            // The dashboard works on a single reference day
            let day = DateRange::day(range.start);
            let (summary, hourly, dispositions) = tokio::join!(
                service.summary(),
                service.hourly_distribution(day),
                service.disposition_summary(day),
            );
            Ok(AggregateBundle::Dashboard(DashboardBundle {
                summary: summary?,
                hourly: Section::settle(view, "hourly distribution", hourly),
                dispositions: Section::settle(view, "disposition summary", dispositions),
            }))
        }
        ViewKind::Calls => {
            let (statistics, calls, by_agent) = tokio::join!(
                service.call_statistics(range),
                service.call_list(range, call_list_limit),
                service.calls_by_agent(range),
            );
            Ok(AggregateBundle::Calls(CallsBundle {
                statistics: statistics?,
                calls: Section::settle(view, "call list", calls.map(filter_external)),
                by_agent: Section::settle(view, "calls by agent", by_agent),
            }))
        }
        ViewKind::Queues => {
            let (statistics, queues, realtime) = tokio::join!(
                service.queue_statistics(range),
                service.queue_list(),
                service.queue_realtime(),
            );
            Ok(AggregateBundle::Queues(QueuesBundle {
                statistics: statistics?,
                queues: Section::settle(view, "queue list", queues),
                realtime: Section::settle(view, "realtime queue status", realtime),
            }))
        }
        ViewKind::Agents => {
            let (statistics, agents, comparison, realtime) = tokio::join!(
                service.agent_statistics(range),
                service.agent_list(),
                service.agent_comparison(range),
                service.agent_realtime(),
            );
            Ok(AggregateBundle::Agents(AgentsBundle {
                statistics: statistics?,
                agents: Section::settle(view, "agent list", agents),
                comparison: Section::settle(view, "agent comparison", comparison),
                realtime: Section::settle(view, "realtime agent status", realtime),
            }))
        }
        ViewKind::Reports => {
            let (daily, hourly, dispositions, queues, comparison) = tokio::join!(
                service.daily_summary(range),
                service.hourly_distribution(range),
                service.disposition_summary(range),
                service.queue_statistics(range),
                service.agent_comparison(range),
            );
            Ok(AggregateBundle::Reports(ReportsBundle {
                daily: daily?,
                hourly: Section::settle(view, "hourly distribution", hourly),
                dispositions: Section::settle(view, "disposition summary", dispositions),
                queues: Section::settle(view, "queue statistics", queues),
                comparison: Section::settle(view, "agent comparison", comparison),
            }))
        }
    }
}
