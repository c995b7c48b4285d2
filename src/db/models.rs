use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::ResultStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) email: Option<String>,
    pub(crate) is_staff: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) disabled: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Extra {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) image_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) title: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Section {
    pub(crate) id: i64,
    pub(crate) subject_id: i64,
    pub(crate) title: String,
    pub(crate) instructions: String,
    pub(crate) extra_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: i64,
    pub(crate) section_id: i64,
    pub(crate) text: String,
    pub(crate) image_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: i64,
    pub(crate) question_id: i64,
    pub(crate) text: String,
    pub(crate) image_path: Option<String>,
    pub(crate) is_correct: bool,
}

/// The single stored exam configuration row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamConfiguration {
    pub(crate) current_exam_id: i64,
    pub(crate) minutes_to_finish: i32,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One exam attempt by one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamResult {
    pub(crate) id: i64,
    pub(crate) user_id: String,
    pub(crate) status: ResultStatus,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) disabled: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A response joined with the catalog chain it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub(crate) struct ScoredResponse {
    pub(crate) response_id: i64,
    pub(crate) answer_id: i64,
    pub(crate) is_correct: bool,
    pub(crate) question_id: i64,
    pub(crate) section_id: i64,
    pub(crate) subject_id: i64,
    pub(crate) exam_id: i64,
}

/// A question's position in the catalog, used for totals.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub(crate) struct QuestionPlacement {
    pub(crate) question_id: i64,
    pub(crate) section_id: i64,
    pub(crate) subject_id: i64,
}
