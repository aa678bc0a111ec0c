//! Data service contract.
//!
//! The monitoring core never talks HTTP directly: it consumes the [`DataService`]
//! trait, which [`HttpDataService`] implements against the call-center backend.

mod http;
mod models;
#[cfg(test)]
pub(crate) mod stub;

pub use http::*;
pub use models::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a single data service query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// No response reached the client.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with an error status or payload.
    #[error("server error: {message}")]
    Server { status: Option<u16>, message: String },
    /// The service rejected a malformed or missing query parameter.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl FetchError {
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        FetchError::Server {
            status,
            message: message.into(),
        }
    }
}

/// Typed access to the call-center data service.
///
/// Range queries take inclusive calendar dates. Validation of `start <= end` is
/// the service's concern and comes back as [`FetchError::Validation`].
#[async_trait]
pub trait DataService: Send + Sync {
    /// Today/yesterday/week snapshots plus realtime queue and agent status.
    async fn summary(&self) -> Result<DashboardSummary, FetchError>;

    async fn call_statistics(&self, range: DateRange) -> Result<MetricSnapshot, FetchError>;

    /// Calls in the range, newest first, at most `limit` rows.
    async fn call_list(&self, range: DateRange, limit: usize)
        -> Result<Vec<CallRecord>, FetchError>;

    async fn calls_by_agent(&self, range: DateRange) -> Result<Vec<AgentCalls>, FetchError>;

    async fn hourly_distribution(&self, range: DateRange)
        -> Result<Vec<HourlyBucket>, FetchError>;

    async fn daily_summary(&self, range: DateRange) -> Result<Vec<DailySummary>, FetchError>;

    async fn disposition_summary(&self, range: DateRange)
        -> Result<Vec<DispositionEntry>, FetchError>;

    async fn queue_list(&self) -> Result<Vec<QueueInfo>, FetchError>;

    async fn queue_statistics(&self, range: DateRange) -> Result<Vec<QueueStat>, FetchError>;

    async fn queue_realtime(&self) -> Result<Vec<RealtimeQueueStatus>, FetchError>;

    async fn agent_list(&self) -> Result<Vec<AgentInfo>, FetchError>;

    async fn agent_statistics(&self, range: DateRange) -> Result<Vec<AgentStat>, FetchError>;

    async fn agent_comparison(&self, range: DateRange)
        -> Result<Vec<ComparisonEntry>, FetchError>;

    async fn agent_realtime(&self) -> Result<Vec<RealtimeAgentStatus>, FetchError>;

    /// Whether a recording exists for the call on the given date.
    async fn recording_available(&self, call_id: &str, date: NaiveDate)
        -> Result<bool, FetchError>;

    fn recording_stream_url(&self, call_id: &str, date: NaiveDate) -> String;

    fn recording_download_url(&self, call_id: &str, date: NaiveDate) -> String;
}
