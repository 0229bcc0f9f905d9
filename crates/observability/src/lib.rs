use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use replybot_core::{ResolutionOutcome, ResolveError};
use serde::Serialize;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    replies_found_total: AtomicU64,
    not_found_total: AtomicU64,
    seeded_total: AtomicU64,
    classifier_errors_total: AtomicU64,
    store_errors_total: AtomicU64,
    validation_errors_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub replies_found_total: u64,
    pub not_found_total: u64,
    pub seeded_total: u64,
    pub classifier_errors_total: u64,
    pub store_errors_total: u64,
    pub validation_errors_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_validation_error(&self) {
        self.validation_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: &ResolutionOutcome) {
        match outcome {
            ResolutionOutcome::Matched { .. } => {
                self.replies_found_total.fetch_add(1, Ordering::Relaxed);
            }
            ResolutionOutcome::Unmatched { seeded, .. } => {
                if *seeded {
                    self.seeded_total.fetch_add(1, Ordering::Relaxed);
                }
                self.not_found_total.fetch_add(1, Ordering::Relaxed);
            }
            ResolutionOutcome::NoIntents | ResolutionOutcome::BelowThreshold => {
                self.not_found_total.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_error(&self, error: &ResolveError) {
        let counter = match error {
            ResolveError::Classifier(_) => &self.classifier_errors_total,
            ResolveError::Store(_) => &self.store_errors_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            replies_found_total: self.replies_found_total.load(Ordering::Relaxed),
            not_found_total: self.not_found_total.load(Ordering::Relaxed),
            seeded_total: self.seeded_total.load(Ordering::Relaxed),
            classifier_errors_total: self.classifier_errors_total.load(Ordering::Relaxed),
            store_errors_total: self.store_errors_total.load(Ordering::Relaxed),
            validation_errors_total: self.validation_errors_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

/// JSON logs on stdout for the server.
pub fn init_tracing(service_name: &str) {
    init_tracing_with_writer(service_name, std::io::stdout);
}

/// JSON logs on stderr, leaving stdout to command output.
pub fn init_cli_tracing(service_name: &str) {
    init_tracing_with_writer(service_name, std::io::stderr);
}

pub fn init_tracing_with_writer<W>(service_name: &str, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,replybot_api=info,replybot_storage=info,tower_http=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(writer)
            .init();
    });
}
