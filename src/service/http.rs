//! HTTP implementation of the data service.

use super::{
    AgentCalls, AgentInfo, AgentStat, CallRecord, ComparisonEntry, DailySummary,
    DashboardSummary, DataService, DateRange, DispositionEntry, FetchError, HourlyBucket,
    MetricSnapshot, QueueInfo, QueueStat, RealtimeAgentStatus, RealtimeQueueStatus,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Envelope wrapped around every successful response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
    message: Option<String>,
    error: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Error bodies carry either the envelope's message fields or a `detail`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message.or(self.error).or_else(|| {
            self.detail.map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
        })
    }
}

/// List endpoints wrap their rows under an endpoint-specific key.
#[derive(Debug, Deserialize)]
struct Listing<T> {
    #[serde(alias = "data", alias = "calls", alias = "queues", alias = "agents")]
    rows: Option<Vec<T>>,
}

impl<T> Listing<T> {
    fn into_rows(self) -> Vec<T> {
        self.rows.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct RecordingCheck {
    #[serde(default)]
    has_recording: bool,
}

/// Data service client talking to the call-center backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpDataService {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::Validation(format!("invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Validation(format!(
                "base URL cannot carry paths: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Cannot fail: `new` rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn recording_url(&self, action: &str, call_id: &str, date: NaiveDate) -> String {
        let mut url = self.endpoint(&["api", "recordings", action, call_id]);
        url.query_pairs_mut()
            .append_pair("date", &date.format("%Y-%m-%d").to_string());
        url.to_string()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::debug!("GET {} failed with {}: {}", url, status, message);

            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    FetchError::Validation(message)
                }
                _ => FetchError::server(Some(status.as_u16()), message),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            FetchError::server(Some(status.as_u16()), format!("malformed payload: {}", e))
        })?;

        if !envelope.success {
            let message = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "request failed".to_string());
            return Err(FetchError::server(Some(status.as_u16()), message));
        }

        envelope
            .data
            .ok_or_else(|| FetchError::server(Some(status.as_u16()), "response carried no data"))
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError> {
        let listing: Listing<T> = self.get(url, query).await?;
        Ok(listing.into_rows())
    }
}

fn range_query(range: DateRange) -> [(&'static str, String); 2] {
    [
        ("start_date", range.start.format("%Y-%m-%d").to_string()),
        ("end_date", range.end.format("%Y-%m-%d").to_string()),
    ]
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_decode() {
        FetchError::server(e.status().map(|s| s.as_u16()), e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn summary(&self) -> Result<DashboardSummary, FetchError> {
        self.get(self.endpoint(&["api", "dashboard", "summary"]), &[])
            .await
    }

    async fn call_statistics(&self, range: DateRange) -> Result<MetricSnapshot, FetchError> {
        self.get(
            self.endpoint(&["api", "calls", "statistics"]),
            &range_query(range),
        )
        .await
    }

    async fn call_list(
        &self,
        range: DateRange,
        limit: usize,
    ) -> Result<Vec<CallRecord>, FetchError> {
        let [start, end] = range_query(range);
        self.get_rows(
            self.endpoint(&["api", "calls", "list"]),
            &[start, end, ("limit", limit.to_string())],
        )
        .await
    }

    async fn calls_by_agent(&self, range: DateRange) -> Result<Vec<AgentCalls>, FetchError> {
        self.get_rows(
            self.endpoint(&["api", "calls", "by-agent"]),
            &range_query(range),
        )
        .await
    }

    async fn hourly_distribution(
        &self,
        range: DateRange,
    ) -> Result<Vec<HourlyBucket>, FetchError> {
        self.get_rows(
            self.endpoint(&["api", "calls", "hourly-distribution"]),
            &range_query(range),
        )
        .await
    }

    async fn daily_summary(&self, range: DateRange) -> Result<Vec<DailySummary>, FetchError> {
        self.get_rows(
            self.endpoint(&["api", "calls", "daily-summary"]),
            &range_query(range),
        )
        .await
    }

    async fn disposition_summary(
        &self,
        range: DateRange,
    ) -> Result<Vec<DispositionEntry>, FetchError> {
        self.get_rows(
            self.endpoint(&["api", "calls", "disposition-summary"]),
            &range_query(range),
        )
        .await
    }

    async fn queue_list(&self) -> Result<Vec<QueueInfo>, FetchError> {
        self.get_rows(self.endpoint(&["api", "queues", "list"]), &[])
            .await
    }

    async fn queue_statistics(&self, range: DateRange) -> Result<Vec<QueueStat>, FetchError> {
        self.get_rows(
            self.endpoint(&["api", "queues", "statistics"]),
            &range_query(range),
        )
        .await
    }

    async fn queue_realtime(&self) -> Result<Vec<RealtimeQueueStatus>, FetchError> {
        self.get_rows(self.endpoint(&["api", "queues", "realtime"]), &[])
            .await
    }

    async fn agent_list(&self) -> Result<Vec<AgentInfo>, FetchError> {
        self.get_rows(self.endpoint(&["api", "agents", "list"]), &[])
            .await
    }

    async fn agent_statistics(&self, range: DateRange) -> Result<Vec<AgentStat>, FetchError> {
        self.get_rows(
            self.endpoint(&["api", "agents", "statistics"]),
            &range_query(range),
        )
        .await
    }

    async fn agent_comparison(
        &self,
        range: DateRange,
    ) -> Result<Vec<ComparisonEntry>, FetchError> {
        self.get_rows(
            self.endpoint(&["api", "agents", "comparison"]),
            &range_query(range),
        )
        .await
    }

    async fn agent_realtime(&self) -> Result<Vec<RealtimeAgentStatus>, FetchError> {
        self.get_rows(self.endpoint(&["api", "agents", "realtime"]), &[])
            .await
    }

    async fn recording_available(
        &self,
        call_id: &str,
        date: NaiveDate,
    ) -> Result<bool, FetchError> {
        let check: RecordingCheck = self
            .get(
                self.endpoint(&["api", "recordings", "check", call_id]),
                &[("date", date.format("%Y-%m-%d").to_string())],
            )
            .await?;
        Ok(check.has_recording)
    }

    fn recording_stream_url(&self, call_id: &str, date: NaiveDate) -> String {
        self.recording_url("stream", call_id, date)
    }

    fn recording_download_url(&self, call_id: &str, date: NaiveDate) -> String {
        self.recording_url("download", call_id, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode as AxumStatus, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_call_list_sends_range_and_limit() {
        let router = Router::new().route(
            "/api/calls/list",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("start_date").map(String::as_str), Some("2024-03-01"));
                assert_eq!(q.get("end_date").map(String::as_str), Some("2024-03-05"));
                assert_eq!(q.get("limit").map(String::as_str), Some("500"));
                Json(json!({
                    "success": true,
                    "data": {
                        "calls": [{
                            "callid": "1709650000.7",
                            "calldate": "2024-03-05T09:15:00",
                            "queuename": "sales",
                            "agent": "201",
                            "phone_number": "5550001111",
                            "status": "COMPLETED",
                            "wait_time": 5,
                            "talk_time": 120,
                            "total_time": 125
                        }],
                        "total": 1,
                        "showing": 1
                    }
                }))
            }),
        );
        let base = serve(router).await;
        let service = HttpDataService::new(&base, Duration::from_secs(5)).unwrap();

        let calls = service
            .call_list(DateRange::new(date(2024, 3, 1), date(2024, 3, 5)), 500)
            .await
            .unwrap();

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].agent.as_deref(), Some("201"));
        assert_eq!(calls[0].talk_time, 120);
    }

    #[tokio::test]
    async fn test_summary_envelope() {
        let router = Router::new().route(
            "/api/dashboard/summary",
            get(|| async {
                Json(json!({
                    "success": true,
                    "data": {
                        "today": {"total_calls": 0},
                        "yesterday": {"total_calls": 42, "answered_calls": 40},
                        "week": {"total_calls": 300},
                        "queues": [{"queue_name": "sales", "available_agents": 3,
                                    "calls_completed_5min": 2, "calls_abandoned_5min": 1,
                                    "service_level_5min": 66.67}],
                        "agents": [{"agent": "201", "status": "IN_CALL", "queue": "sales",
                                    "last_activity": "2024-03-05T09:15:00",
                                    "last_event": "CONNECT"}],
                        "timestamp": "2024-03-05T09:16:00.123456"
                    }
                }))
            }),
        );
        let base = serve(router).await;
        let service = HttpDataService::new(&base, Duration::from_secs(5)).unwrap();

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.yesterday.total_calls, 42);
        assert_eq!(summary.queues[0].calls_completed, 2);
        assert_eq!(summary.agents[0].status, crate::service::AgentState::InCall);
    }

    #[tokio::test]
    async fn test_error_classification() {
        let router = Router::new()
            .route(
                "/api/calls/statistics",
                get(|| async {
                    (
                        AxumStatus::UNPROCESSABLE_ENTITY,
                        Json(json!({"detail": [{"loc": ["query", "start_date"], "msg": "field required"}]})),
                    )
                }),
            )
            .route(
                "/api/queues/list",
                get(|| async {
                    (
                        AxumStatus::INTERNAL_SERVER_ERROR,
                        Json(json!({"detail": "queue log unreadable"})),
                    )
                }),
            )
            .route(
                "/api/agents/list",
                get(|| async { Json(json!({"success": false, "error": "backend offline"})) }),
            );
        let base = serve(router).await;
        let service = HttpDataService::new(&base, Duration::from_secs(5)).unwrap();
        let range = DateRange::day(date(2024, 3, 5));

        let err = service.call_statistics(range).await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)), "got {:?}", err);

        let err = service.queue_list().await.unwrap_err();
        assert_eq!(err, FetchError::server(Some(500), "queue log unreadable"));

        let err = service.agent_list().await.unwrap_err();
        assert_eq!(err, FetchError::server(Some(200), "backend offline"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service =
            HttpDataService::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = service.queue_realtime().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
    }

    #[test]
    fn test_recording_urls() {
        let service =
            HttpDataService::new("http://pbx.local:8000/", Duration::from_secs(1)).unwrap();
        let day = date(2024, 3, 5);

        assert_eq!(
            service.recording_stream_url("1709650000.7", day),
            "http://pbx.local:8000/api/recordings/stream/1709650000.7?date=2024-03-05"
        );
        assert_eq!(
            service.recording_download_url("1709650000.7", day),
            "http://pbx.local:8000/api/recordings/download/1709650000.7?date=2024-03-05"
        );

        let prefixed =
            HttpDataService::new("http://pbx.local/monitor", Duration::from_secs(1)).unwrap();
        assert_eq!(
            prefixed.recording_stream_url("a/b", day),
            "http://pbx.local/monitor/api/recordings/stream/a%2Fb?date=2024-03-05"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpDataService::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpDataService::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
    }
}
