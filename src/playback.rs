//! Single-active recording playback.

use crate::service::{CallRecord, DataService};

use chrono::NaiveDate;
use std::sync::Arc;

/// At most one recording plays at a time. Only `toggle` changes it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing { call_id: String, date: NaiveDate },
}

/// Owns the playback state; only `toggle` changes it.
pub struct RecordingPlaybackController {
    service: Arc<dyn DataService>,
    state: PlaybackState,
}

impl RecordingPlaybackController {
    pub fn new(service: Arc<dyn DataService>) -> Self {
        Self {
            service,
            state: PlaybackState::Idle,
        }
    }

    /// Stop `call_id` if it is playing, otherwise play it in place of whatever
    /// was playing. Returns the new state.
    pub fn toggle(&mut self, call_id: &str, date: NaiveDate) -> &PlaybackState {
        self.state = match &self.state {
            PlaybackState::Playing { call_id: active, .. } if active == call_id => {
                tracing::debug!("Stopping recording {}", call_id);
                PlaybackState::Idle
            }
            _ => {
                tracing::debug!("Playing recording {} from {}", call_id, date);
                PlaybackState::Playing {
                    call_id: call_id.to_string(),
                    date,
                }
            }
        };
        &self.state
    }

    /// Toggle a listed call, locating its recording by the call's own date.
    pub fn toggle_record(&mut self, record: &CallRecord) -> &PlaybackState {
        self.toggle(&record.call_id, record.recording_date())
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self, call_id: &str) -> bool {
        matches!(&self.state, PlaybackState::Playing { call_id: active, .. } if active == call_id)
    }

    pub fn stream_url(&self, call_id: &str, date: NaiveDate) -> String {
        self.service.recording_stream_url(call_id, date)
    }

    pub fn download_url(&self, call_id: &str, date: NaiveDate) -> String {
        self.service.recording_download_url(call_id, date)
    }

    /// Stream URL of the playing recording, if any.
    pub fn active_stream_url(&self) -> Option<String> {
        match &self.state {
            PlaybackState::Idle => None,
            PlaybackState::Playing { call_id, date } => Some(self.stream_url(call_id, *date)),
        }
    }
}
