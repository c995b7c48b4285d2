use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::ExamResult;
use crate::db::types::ResultStatus;
use crate::schemas::exam::{PaperResponse, SettingsResponse};
use crate::services::routing::ExamRoute;
use crate::services::scoring::{self, Scorecard};

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) id: i64,
    pub(crate) user_id: String,
    pub(crate) status: ResultStatus,
    pub(crate) status_code: i16,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    pub(crate) deadline: String,
    pub(crate) disabled: bool,
}

impl ResultResponse {
    pub(crate) fn from_db(result: &ExamResult) -> Self {
        Self {
            id: result.id,
            user_id: result.user_id.clone(),
            status: result.status,
            status_code: result.status.code(),
            start_time: format_primitive(result.start_time),
            end_time: result.end_time.map(format_primitive),
            deadline: format_primitive(result.deadline),
            disabled: result.disabled,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamHomeResponse {
    pub(crate) route: ExamRoute,
    pub(crate) settings: SettingsResponse,
    /// Deadline a result started now would get.
    pub(crate) deadline_preview: String,
    pub(crate) completed: bool,
    pub(crate) result: Option<ResultResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartResponse {
    pub(crate) created: bool,
    pub(crate) route: ExamRoute,
    pub(crate) result: ResultResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnsweringResponse {
    pub(crate) route: ExamRoute,
    pub(crate) result: ResultResponse,
    pub(crate) seconds_remaining: i64,
    pub(crate) paper: Option<PaperResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) route: ExamRoute,
    pub(crate) result: ResultResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct SectionBreakdown {
    pub(crate) section_id: i64,
    pub(crate) title: String,
    pub(crate) correct: usize,
    pub(crate) total: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectBreakdown {
    pub(crate) subject_id: i64,
    pub(crate) title: String,
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) sections: Vec<SectionBreakdown>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreSummary {
    pub(crate) exam_id: Option<i64>,
    pub(crate) answered: usize,
    pub(crate) score: usize,
    pub(crate) total: usize,
    pub(crate) elapsed_seconds: Option<i64>,
}

impl ScoreSummary {
    pub(crate) fn new(result: &ExamResult, scorecard: &Scorecard) -> Self {
        Self {
            exam_id: scorecard.exam_id(),
            answered: scorecard.answered_count(),
            score: scorecard.correct_count(),
            total: scorecard.question_count(),
            elapsed_seconds: scoring::elapsed_time(result).map(|elapsed| elapsed.whole_seconds()),
        }
    }
}

/// Candidate results page.
#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) route: ExamRoute,
    pub(crate) result: ResultResponse,
    #[serde(flatten)]
    pub(crate) summary: ScoreSummary,
    pub(crate) subjects: Vec<SubjectBreakdown>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultReportRow {
    #[serde(flatten)]
    pub(crate) result: ResultResponse,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) email: Option<String>,
    #[serde(flatten)]
    pub(crate) summary: ScoreSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultReportDetail {
    #[serde(flatten)]
    pub(crate) row: ResultReportRow,
    pub(crate) subjects: Vec<SubjectBreakdown>,
}
