//! callwatch - call-center monitoring client core.
//!
//! Reconciles realtime agent and queue status with date-ranged call
//! statistics from the call-center data service, polls live views, pages the
//! call list and plays back one recording at a time.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod metrics;
pub mod monitor;
pub mod playback;
pub mod scheduler;
pub mod service;

pub use config::ClientConfig;
pub use coordinator::{AggregateBundle, RangeQueryCoordinator, RefreshError, ViewKind};
pub use monitor::Monitor;
pub use service::{DataService, DateRange, FetchError, HttpDataService};
