//! In-memory data service for exercising the monitoring core in tests.

use super::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable [`DataService`]: counts calls per endpoint, fails endpoints on
/// demand and delays range queries per range.
#[derive(Default)]
pub(crate) struct StubService {
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    delays: Mutex<HashMap<DateRange, Duration>>,
    summary: Mutex<DashboardSummary>,
    statistics: Mutex<HashMap<DateRange, MetricSnapshot>>,
    call_rows: Mutex<Vec<CallRecord>>,
    agents: Mutex<Vec<RealtimeAgentStatus>>,
}

impl StubService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub(crate) fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    pub(crate) fn delay(&self, range: DateRange, delay: Duration) {
        self.delays.lock().unwrap().insert(range, delay);
    }

    pub(crate) fn set_summary(&self, summary: DashboardSummary) {
        *self.summary.lock().unwrap() = summary;
    }

    pub(crate) fn set_statistics(&self, range: DateRange, snapshot: MetricSnapshot) {
        self.statistics.lock().unwrap().insert(range, snapshot);
    }

    pub(crate) fn set_calls(&self, calls: Vec<CallRecord>) {
        *self.call_rows.lock().unwrap() = calls;
    }

    pub(crate) fn set_agents(&self, agents: Vec<RealtimeAgentStatus>) {
        *self.agents.lock().unwrap() = agents;
    }

    pub(crate) fn count(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    async fn enter(
        &self,
        endpoint: &'static str,
        range: Option<DateRange>,
    ) -> Result<(), FetchError> {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;

        let delay = range.and_then(|r| self.delays.lock().unwrap().get(&r).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(FetchError::server(
                Some(500),
                format!("{} unavailable", endpoint),
            ));
        }
        Ok(())
    }
}

/// A call record with the given id and caller number, placed at 09:00 on 2024-03-05.
pub(crate) fn call_record(call_id: &str, phone: Option<&str>) -> CallRecord {
    CallRecord {
        call_id: call_id.to_string(),
        timestamp: NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap(),
        queue: "sales".to_string(),
        agent: Some("201".to_string()),
        phone_number: phone.map(str::to_string),
        status: CallStatus::Completed,
        wait_time: 4,
        talk_time: 90,
        total_time: 94,
        wait_time_formatted: "0m 4s".to_string(),
        talk_time_formatted: "1m 30s".to_string(),
        total_time_formatted: "1m 34s".to_string(),
        has_recording: true,
    }
}

#[async_trait]
impl DataService for StubService {
    async fn summary(&self) -> Result<DashboardSummary, FetchError> {
        self.enter("summary", None).await?;
        Ok(self.summary.lock().unwrap().clone())
    }

    async fn call_statistics(&self, range: DateRange) -> Result<MetricSnapshot, FetchError> {
        self.enter("call_statistics", Some(range)).await?;
        Ok(self
            .statistics
            .lock()
            .unwrap()
            .get(&range)
            .cloned()
            .unwrap_or_default())
    }

    async fn call_list(
        &self,
        range: DateRange,
        limit: usize,
    ) -> Result<Vec<CallRecord>, FetchError> {
        self.enter("call_list", Some(range)).await?;
        Ok(self.call_rows.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn calls_by_agent(&self, range: DateRange) -> Result<Vec<AgentCalls>, FetchError> {
        self.enter("calls_by_agent", Some(range)).await?;
        Ok(vec![AgentCalls {
            agent: "201".to_string(),
            total_calls: 1,
            ..Default::default()
        }])
    }

    async fn hourly_distribution(&self, range: DateRange) -> Result<Vec<HourlyBucket>, FetchError> {
        self.enter("hourly_distribution", Some(range)).await?;
        Ok((0..24)
            .map(|hour| HourlyBucket {
                hour,
                ..Default::default()
            })
            .collect())
    }

    async fn daily_summary(&self, range: DateRange) -> Result<Vec<DailySummary>, FetchError> {
        self.enter("daily_summary", Some(range)).await?;
        Ok(vec![DailySummary {
            date: range.start,
            total_calls: 10,
            answered_calls: 8,
            missed_calls: 2,
            avg_duration: 60.0,
            total_duration: 480,
        }])
    }

    async fn disposition_summary(
        &self,
        range: DateRange,
    ) -> Result<Vec<DispositionEntry>, FetchError> {
        self.enter("disposition_summary", Some(range)).await?;
        Ok(vec![DispositionEntry {
            disposition: QueueEvent::CompleteCaller,
            count: 8,
            percentage: 80.0,
        }])
    }

    async fn queue_list(&self) -> Result<Vec<QueueInfo>, FetchError> {
        self.enter("queue_list", None).await?;
        Ok(vec![QueueInfo {
            queue_name: "sales".to_string(),
            total_agents: 3,
        }])
    }

    async fn queue_statistics(&self, range: DateRange) -> Result<Vec<QueueStat>, FetchError> {
        self.enter("queue_statistics", Some(range)).await?;
        Ok(vec![QueueStat {
            queue_name: "sales".to_string(),
            total_calls: 10,
            ..Default::default()
        }])
    }

    async fn queue_realtime(&self) -> Result<Vec<RealtimeQueueStatus>, FetchError> {
        self.enter("queue_realtime", None).await?;
        Ok(self.summary.lock().unwrap().queues.clone())
    }

    async fn agent_list(&self) -> Result<Vec<AgentInfo>, FetchError> {
        self.enter("agent_list", None).await?;
        Ok(vec![AgentInfo {
            agent: "201".to_string(),
            agent_full: "SIP/201".to_string(),
            queues: vec!["sales".to_string()],
        }])
    }

    async fn agent_statistics(&self, range: DateRange) -> Result<Vec<AgentStat>, FetchError> {
        self.enter("agent_statistics", Some(range)).await?;
        Ok(vec![AgentStat {
            agent: "201".to_string(),
            total_calls: 10,
            ..Default::default()
        }])
    }

    async fn agent_comparison(&self, range: DateRange) -> Result<Vec<ComparisonEntry>, FetchError> {
        self.enter("agent_comparison", Some(range)).await?;
        Ok(Vec::new())
    }

    async fn agent_realtime(&self) -> Result<Vec<RealtimeAgentStatus>, FetchError> {
        self.enter("agent_realtime", None).await?;
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn recording_available(
        &self,
        call_id: &str,
        _date: NaiveDate,
    ) -> Result<bool, FetchError> {
        self.enter("recording_available", None).await?;
        Ok(!call_id.is_empty())
    }

    fn recording_stream_url(&self, call_id: &str, date: NaiveDate) -> String {
        format!("stub://recordings/stream/{}?date={}", call_id, date)
    }

    fn recording_download_url(&self, call_id: &str, date: NaiveDate) -> String {
        format!("stub://recordings/download/{}?date={}", call_id, date)
    }
}
