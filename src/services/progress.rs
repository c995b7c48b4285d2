use crate::db::models::ExamResult;

/// Whether the candidate's latest active attempt has ended, in time or not.
pub(crate) fn exam_completed(latest: Option<&ExamResult>) -> bool {
    latest.is_some_and(|result| result.status.is_terminal())
}
