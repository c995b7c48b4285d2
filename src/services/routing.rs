use serde::Serialize;

use crate::db::models::ExamResult;
use crate::db::types::ResultStatus;

/// Where the candidate UI should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ExamRoute {
    Intro,
    Answering,
    TimeUp,
    Results,
    Finished,
    Error,
}

impl ExamRoute {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Answering => "answering",
            Self::TimeUp => "time_up",
            Self::Results => "results",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }
}

/// Home route for a candidate given their latest active result.
pub(crate) fn route_for(result: Option<&ExamResult>) -> ExamRoute {
    match result.map(|result| result.status) {
        None => ExamRoute::Intro,
        Some(ResultStatus::Answering) => ExamRoute::Answering,
        Some(ResultStatus::TimeUp) => ExamRoute::TimeUp,
        Some(ResultStatus::Finished) => ExamRoute::Results,
    }
}

/// Route shown right after a successful submission.
pub(crate) fn after_submission(status: ResultStatus) -> ExamRoute {
    match status {
        ResultStatus::TimeUp => ExamRoute::TimeUp,
        _ => ExamRoute::Finished,
    }
}

/// Admits the request only when the result is in `expected` status.
///
/// On mismatch the error carries the route the candidate belongs on.
pub(crate) fn require_status(
    result: Option<&ExamResult>,
    expected: ResultStatus,
) -> Result<&ExamResult, ExamRoute> {
    match result {
        Some(result) if result.status == expected => Ok(result),
        other => Err(route_for(other)),
    }
}
