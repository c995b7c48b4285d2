use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::db::types::ResultStatus;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_http_request(method: &str, route: &str, status: u16, seconds: f64) {
    let status = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status
    )
    .record(seconds);
}

pub(crate) fn record_result_created() {
    metrics::counter!("exam_results_created_total").increment(1);
}

pub(crate) fn record_submission(outcome: SubmissionOutcome) {
    metrics::counter!("exam_submissions_total", "outcome" => outcome.as_str()).increment(1);
}

pub(crate) fn record_notification(delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    metrics::counter!("exam_notifications_total", "outcome" => outcome).increment(1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmissionOutcome {
    Finished,
    TimeUp,
    Malformed,
    Stale,
}

impl SubmissionOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::TimeUp => "time_up",
            Self::Malformed => "malformed",
            Self::Stale => "stale",
        }
    }

    pub(crate) fn from_status(status: ResultStatus) -> Self {
        match status {
            ResultStatus::TimeUp => Self::TimeUp,
            _ => Self::Finished,
        }
    }
}
