//! Wire model types returned by the data service.

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Inclusive calendar date range used by every historical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range covering a single calendar day.
    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// The trailing week ending on `today`, matching the summary's `week` period.
    pub fn trailing_week(today: NaiveDate) -> Self {
        Self {
            start: today - ChronoDuration::days(7),
            end: today,
        }
    }

    /// True when `start > end`. Such ranges are still sent to the service.
    pub fn is_vacuous(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Period a [`MetricSnapshot`] in the dashboard summary is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Yesterday,
    Week,
}

/// Aggregate call statistics for one period or date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSnapshot {
    pub total_calls: u64,
    pub answered_calls: u64,
    pub abandoned_calls: u64,
    /// Summed talk time in seconds
    pub total_duration: u64,
    /// Percentage in [0, 100]
    pub answer_rate: f64,
    pub avg_duration: f64,
    pub avg_wait_time: f64,
    pub max_wait_time: u64,
    pub min_wait_time: u64,
    pub max_talk_time: u64,
}

/// Display tone used by status chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Success,
    Error,
    Warning,
    Neutral,
}

/// Agent presence derived by the service from the latest queue event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    Available,
    InCall,
    Paused,
    Unavailable,
    #[serde(other)]
    Unknown,
}

impl AgentState {
    pub fn label(&self) -> &'static str {
        match self {
            AgentState::Available => "Available",
            AgentState::InCall => "In call",
            AgentState::Paused => "Paused",
            AgentState::Unavailable => "Unavailable",
            AgentState::Unknown => "Unknown",
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            AgentState::InCall => StatusTone::Error,
            AgentState::Available => StatusTone::Success,
            AgentState::Paused => StatusTone::Warning,
            AgentState::Unavailable | AgentState::Unknown => StatusTone::Neutral,
        }
    }
}

/// Terminal or current state of a queued call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Completed,
    Answered,
    Abandoned,
    Timeout,
    ExitedWithKey,
    Entered,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CallStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CallStatus::Completed => "Completed",
            CallStatus::Answered => "Answered",
            CallStatus::Abandoned => "Abandoned",
            CallStatus::Timeout => "Timed out",
            CallStatus::ExitedWithKey => "Exited with key",
            CallStatus::Entered => "In queue",
            CallStatus::Unknown => "Unknown",
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            CallStatus::Completed | CallStatus::Answered => StatusTone::Success,
            CallStatus::Abandoned => StatusTone::Error,
            CallStatus::Timeout | CallStatus::ExitedWithKey => StatusTone::Warning,
            CallStatus::Entered | CallStatus::Unknown => StatusTone::Neutral,
        }
    }
}

/// Queue log event, also used as the disposition key of the disposition summary.
///
/// Strings the service sends that are not a known event code are kept verbatim
/// in [`QueueEvent::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueEvent {
    EnterQueue,
    Connect,
    CompleteAgent,
    CompleteCaller,
    RingNoAnswer,
    RingCanceled,
    Abandon,
    ExitWithTimeout,
    ExitWithKey,
    Transfer,
    BlindTransfer,
    AttendedTransfer,
    Did,
    AddMember,
    RemoveMember,
    Pause,
    Unpause,
    AgentDump,
    SysCompat,
    ConfigReload,
    QueueStart,
    Other(String),
}

impl QueueEvent {
    /// The queue log code for this event.
    pub fn code(&self) -> &str {
        match self {
            QueueEvent::EnterQueue => "ENTERQUEUE",
            QueueEvent::Connect => "CONNECT",
            QueueEvent::CompleteAgent => "COMPLETEAGENT",
            QueueEvent::CompleteCaller => "COMPLETECALLER",
            QueueEvent::RingNoAnswer => "RINGNOANSWER",
            QueueEvent::RingCanceled => "RINGCANCELED",
            QueueEvent::Abandon => "ABANDON",
            QueueEvent::ExitWithTimeout => "EXITWITHTIMEOUT",
            QueueEvent::ExitWithKey => "EXITWITHKEY",
            QueueEvent::Transfer => "TRANSFER",
            QueueEvent::BlindTransfer => "BLINDTRANSFER",
            QueueEvent::AttendedTransfer => "ATTENDEDTRANSFER",
            QueueEvent::Did => "DID",
            QueueEvent::AddMember => "ADDMEMBER",
            QueueEvent::RemoveMember => "REMOVEMEMBER",
            QueueEvent::Pause => "PAUSE",
            QueueEvent::Unpause => "UNPAUSE",
            QueueEvent::AgentDump => "AGENTDUMP",
            QueueEvent::SysCompat => "SYSCOMPAT",
            QueueEvent::ConfigReload => "CONFIGRELOAD",
            QueueEvent::QueueStart => "QUEUESTART",
            QueueEvent::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            QueueEvent::EnterQueue => "Incoming call",
            QueueEvent::Connect => "Connected",
            QueueEvent::CompleteAgent => "Ended by agent",
            QueueEvent::CompleteCaller => "Ended by caller",
            QueueEvent::RingNoAnswer => "No answer",
            QueueEvent::RingCanceled => "Ring canceled",
            QueueEvent::Abandon => "Abandoned",
            QueueEvent::ExitWithTimeout => "Timed out",
            QueueEvent::ExitWithKey => "Exited with key",
            QueueEvent::Transfer => "Transferred",
            QueueEvent::BlindTransfer => "Blind transfer",
            QueueEvent::AttendedTransfer => "Attended transfer",
            QueueEvent::Did => "Dialed number",
            QueueEvent::AddMember => "Agent added",
            QueueEvent::RemoveMember => "Agent removed",
            QueueEvent::Pause => "Agent paused",
            QueueEvent::Unpause => "Agent active",
            QueueEvent::AgentDump => "Agent disconnected",
            QueueEvent::SysCompat => "System compatibility",
            QueueEvent::ConfigReload => "Configuration reload",
            QueueEvent::QueueStart => "Queue start",
            QueueEvent::Other(raw) => raw,
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            QueueEvent::Connect | QueueEvent::CompleteAgent | QueueEvent::CompleteCaller => {
                StatusTone::Success
            }
            QueueEvent::Abandon | QueueEvent::RingNoAnswer | QueueEvent::AgentDump => {
                StatusTone::Error
            }
            QueueEvent::ExitWithTimeout
            | QueueEvent::ExitWithKey
            | QueueEvent::RingCanceled
            | QueueEvent::Pause => StatusTone::Warning,
            QueueEvent::EnterQueue
            | QueueEvent::Transfer
            | QueueEvent::BlindTransfer
            | QueueEvent::AttendedTransfer
            | QueueEvent::Did
            | QueueEvent::AddMember
            | QueueEvent::RemoveMember
            | QueueEvent::Unpause
            | QueueEvent::SysCompat
            | QueueEvent::ConfigReload
            | QueueEvent::QueueStart
            | QueueEvent::Other(_) => StatusTone::Neutral,
        }
    }
}

impl From<String> for QueueEvent {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ENTERQUEUE" => QueueEvent::EnterQueue,
            "CONNECT" => QueueEvent::Connect,
            "COMPLETEAGENT" => QueueEvent::CompleteAgent,
            "COMPLETECALLER" => QueueEvent::CompleteCaller,
            "RINGNOANSWER" => QueueEvent::RingNoAnswer,
            "RINGCANCELED" => QueueEvent::RingCanceled,
            "ABANDON" => QueueEvent::Abandon,
            "EXITWITHTIMEOUT" => QueueEvent::ExitWithTimeout,
            "EXITWITHKEY" => QueueEvent::ExitWithKey,
            "TRANSFER" => QueueEvent::Transfer,
            "BLINDTRANSFER" => QueueEvent::BlindTransfer,
            "ATTENDEDTRANSFER" => QueueEvent::AttendedTransfer,
            "DID" => QueueEvent::Did,
            "ADDMEMBER" => QueueEvent::AddMember,
            "REMOVEMEMBER" => QueueEvent::RemoveMember,
            "PAUSE" => QueueEvent::Pause,
            "UNPAUSE" => QueueEvent::Unpause,
            "AGENTDUMP" => QueueEvent::AgentDump,
            "SYSCOMPAT" => QueueEvent::SysCompat,
            "CONFIGRELOAD" => QueueEvent::ConfigReload,
            "QUEUESTART" => QueueEvent::QueueStart,
            _ => QueueEvent::Other(raw),
        }
    }
}

impl From<QueueEvent> for String {
    fn from(event: QueueEvent) -> Self {
        match event {
            QueueEvent::Other(raw) => raw,
            known => known.code().to_string(),
        }
    }
}

/// Latest known presence of one agent. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeAgentStatus {
    pub agent: String,
    #[serde(default)]
    pub queue: Option<String>,
    pub status: AgentState,
    #[serde(default)]
    pub last_activity: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_event: Option<QueueEvent>,
}

/// Queue activity over the trailing five minutes. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeQueueStatus {
    pub queue_name: String,
    #[serde(default)]
    pub calls_waiting: u64,
    #[serde(default)]
    pub available_agents: u64,
    #[serde(rename = "calls_completed_5min", default)]
    pub calls_completed: u64,
    #[serde(rename = "calls_abandoned_5min", default)]
    pub calls_abandoned: u64,
    /// Percentage of entered calls answered in the window
    #[serde(rename = "service_level_5min", default)]
    pub service_level: f64,
}

/// One call reconstructed from the queue log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(rename = "callid")]
    pub call_id: String,
    #[serde(rename = "calldate")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "queuename", default)]
    pub queue: String,
    /// `None` when the service reports no agent (`N/A` / `NONE`)
    #[serde(default, deserialize_with = "sentinel_as_none")]
    pub agent: Option<String>,
    /// Raw caller number; may hold the unknown-number sentinel
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub status: CallStatus,
    #[serde(default)]
    pub wait_time: u64,
    #[serde(default)]
    pub talk_time: u64,
    #[serde(default)]
    pub total_time: u64,
    #[serde(default)]
    pub wait_time_formatted: String,
    #[serde(default)]
    pub talk_time_formatted: String,
    #[serde(default)]
    pub total_time_formatted: String,
    #[serde(default)]
    pub has_recording: bool,
}

impl CallRecord {
    /// Calendar date used to locate the call's recording.
    pub fn recording_date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// One call leg in the per-agent breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCallEntry {
    #[serde(rename = "callid")]
    pub call_id: String,
    #[serde(rename = "queuename", default)]
    pub queue: String,
    pub time: NaiveDateTime,
    pub event: QueueEvent,
    #[serde(default)]
    pub wait_time: u64,
    #[serde(default)]
    pub talk_time: u64,
}

/// Calls handled by one agent in a range, with aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentCalls {
    pub agent: String,
    pub agent_full: String,
    pub total_calls: u64,
    pub completed_calls: u64,
    pub total_talk_time: u64,
    pub total_wait_time: u64,
    pub avg_talk_time: f64,
    pub avg_wait_time: f64,
    pub total_talk_time_formatted: String,
    pub calls: Vec<AgentCallEntry>,
}

/// One hour-of-day bucket of the hourly distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyBucket {
    pub hour: u8,
    pub total_calls: u64,
    pub answered_calls: u64,
    pub missed_calls: u64,
    pub avg_duration: f64,
    pub avg_wait_time: f64,
}

/// Per-day aggregate of the daily summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub answered_calls: u64,
    #[serde(default)]
    pub missed_calls: u64,
    #[serde(default)]
    pub avg_duration: f64,
    #[serde(default)]
    pub total_duration: u64,
}

/// Count and share of one disposition in a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispositionEntry {
    pub disposition: QueueEvent,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub percentage: f64,
}

/// A queue known to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueInfo {
    pub queue_name: String,
    pub total_agents: u64,
}

/// Historical per-queue aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueStat {
    pub queue_name: String,
    pub total_calls: u64,
    pub answered_calls: u64,
    pub abandoned_calls: u64,
    pub avg_wait_time: f64,
    pub max_wait_time: u64,
    pub min_wait_time: u64,
    pub avg_talk_time: f64,
    /// Percentage of calls answered within 30 seconds
    pub service_level: f64,
    pub answer_rate: f64,
    pub abandon_rate: f64,
}

/// An agent known to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentInfo {
    pub agent: String,
    pub agent_full: String,
    pub queues: Vec<String>,
}

/// Historical per-agent aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStat {
    pub agent: String,
    pub agent_full: String,
    pub total_calls: u64,
    pub completed_calls: u64,
    pub total_talk_time: u64,
    pub total_talk_time_formatted: String,
    pub avg_talk_time: f64,
    pub max_talk_time: u64,
    pub min_talk_time: u64,
    pub avg_wait_before_answer: f64,
}

/// Agent aggregate ranked against its peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    #[serde(flatten)]
    pub stat: AgentStat,
    /// 1-based position by total calls
    pub rank: u32,
    /// Share of the top agent's call count, in [0, 100]
    #[serde(default)]
    pub efficiency: f64,
}

/// The fixed dashboard summary: three period snapshots plus realtime status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSummary {
    pub today: MetricSnapshot,
    pub yesterday: MetricSnapshot,
    pub week: MetricSnapshot,
    pub queues: Vec<RealtimeQueueStatus>,
    pub agents: Vec<RealtimeAgentStatus>,
    pub timestamp: Option<NaiveDateTime>,
}

impl DashboardSummary {
    pub fn snapshot(&self, period: Period) -> &MetricSnapshot {
        match period {
            Period::Today => &self.today,
            Period::Yesterday => &self.yesterday,
            Period::Week => &self.week,
        }
    }
}

/// Deserialize an optional string, mapping the service's "no value" sentinels to `None`.
fn sentinel_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty() && s != "N/A" && s != "NONE"))
}
