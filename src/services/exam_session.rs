use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::metrics::{self, SubmissionOutcome};
use crate::core::state::AppState;
use crate::core::time::deadline_after;
use crate::db::models::{ExamResult, User};
use crate::db::types::ResultStatus;
use crate::repositories;
use crate::repositories::results::CreateResult;
use crate::services::notifications::ResultNotification;
use crate::services::scoring::{self, Scorecard};
use crate::services::submission::{self, SubmissionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SettingsSource {
    Configured,
    Default,
}

/// The exam configuration in force, stored or constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct EffectiveSettings {
    pub(crate) current_exam_id: Option<i64>,
    pub(crate) minutes_to_finish: i32,
    pub(crate) source: SettingsSource,
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("exam {0} does not exist or is disabled")]
    UnknownExam(i64),
    #[error("minutes_to_finish must be positive, got {0}")]
    InvalidMinutes(i32),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub(crate) enum FinishError {
    #[error("result is no longer accepting answers")]
    Stale,
    #[error("malformed submission: {0}")]
    Malformed(#[from] SubmissionError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub(crate) enum ResultOutcome {
    Created(ExamResult),
    Existing(ExamResult),
}

impl ResultOutcome {
    pub(crate) fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub(crate) fn result(&self) -> &ExamResult {
        match self {
            Self::Created(result) | Self::Existing(result) => result,
        }
    }
}

/// Stored configuration, or the latest active exam with `default_minutes`.
pub(crate) async fn get_settings(
    conn: &mut PgConnection,
    default_minutes: i32,
) -> Result<EffectiveSettings, sqlx::Error> {
    if let Some(stored) = repositories::exam_settings::find(&mut *conn).await? {
        return Ok(EffectiveSettings {
            current_exam_id: Some(stored.current_exam_id),
            minutes_to_finish: stored.minutes_to_finish,
            source: SettingsSource::Configured,
        });
    }

    let current_exam_id = repositories::catalog::latest_active_exam_id(&mut *conn).await?;
    Ok(EffectiveSettings {
        current_exam_id,
        minutes_to_finish: default_minutes,
        source: SettingsSource::Default,
    })
}

pub(crate) async fn upsert_settings(
    pool: &PgPool,
    current_exam_id: i64,
    minutes_to_finish: i32,
    now: PrimitiveDateTime,
) -> Result<EffectiveSettings, SettingsError> {
    if minutes_to_finish < 1 {
        return Err(SettingsError::InvalidMinutes(minutes_to_finish));
    }

    let mut tx = pool.begin().await?;
    if repositories::catalog::find_active_exam(&mut *tx, current_exam_id).await?.is_none() {
        return Err(SettingsError::UnknownExam(current_exam_id));
    }
    let stored =
        repositories::exam_settings::upsert(&mut *tx, current_exam_id, minutes_to_finish, now)
            .await?;
    tx.commit().await?;

    tracing::info!(current_exam_id, minutes_to_finish, "Exam settings updated");
    Ok(EffectiveSettings {
        current_exam_id: Some(stored.current_exam_id),
        minutes_to_finish: stored.minutes_to_finish,
        source: SettingsSource::Configured,
    })
}

/// Returns the candidate's active result, creating one when none exists.
///
/// Concurrent calls for the same candidate are serialized by an advisory
/// lock, so at most one active result is ever created.
pub(crate) async fn get_or_create_result(
    state: &AppState,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<ResultOutcome, sqlx::Error> {
    let mut tx = state.db().begin().await?;
    repositories::results::acquire_user_lock(&mut *tx, user_id).await?;

    if let Some(existing) =
        repositories::results::find_latest_active_for_user(&mut *tx, user_id).await?
    {
        tx.commit().await?;
        return Ok(ResultOutcome::Existing(existing));
    }

    let settings =
        get_settings(&mut *tx, state.settings().exam().default_minutes_to_finish).await?;
    let created = repositories::results::create(
        &mut *tx,
        CreateResult {
            user_id,
            start_time: now,
            deadline: deadline_after(now, settings.minutes_to_finish),
        },
    )
    .await?;
    tx.commit().await?;

    metrics::record_result_created();
    tracing::info!(
        result_id = created.id,
        user_id = %user_id,
        deadline = %created.deadline,
        "Exam result created"
    );
    Ok(ResultOutcome::Created(created))
}

/// `true` once the attempt has timed out; a finished attempt is never late.
pub(crate) fn is_past_deadline(result: &ExamResult, now: PrimitiveDateTime) -> bool {
    match result.status {
        ResultStatus::TimeUp => true,
        ResultStatus::Finished => false,
        ResultStatus::Answering => now > result.deadline,
    }
}

/// Records a whole answer sheet and closes the attempt.
///
/// Validation happens before any write. Responses and the status change are
/// committed together or not at all.
pub(crate) async fn finish(
    state: &AppState,
    candidate: &User,
    result: &ExamResult,
    fields: &[(String, String)],
    now: PrimitiveDateTime,
) -> Result<ExamResult, FinishError> {
    let outcome = record_submission(state, result, fields, now).await;

    match &outcome {
        Ok(updated) => {
            metrics::record_submission(SubmissionOutcome::from_status(updated.status));
            tracing::info!(
                result_id = updated.id,
                status = ?updated.status,
                "Exam submission recorded"
            );
            if updated.status == ResultStatus::Finished {
                notify_finished(state, candidate, updated).await;
            }
        }
        Err(FinishError::Stale) => {
            metrics::record_submission(SubmissionOutcome::Stale);
            tracing::warn!(result_id = result.id, "Stale exam submission rejected");
        }
        Err(FinishError::Malformed(err)) => {
            metrics::record_submission(SubmissionOutcome::Malformed);
            tracing::warn!(result_id = result.id, error = %err, "Malformed exam submission");
        }
        Err(FinishError::Database(_)) => {}
    }

    outcome
}

async fn record_submission(
    state: &AppState,
    result: &ExamResult,
    fields: &[(String, String)],
    now: PrimitiveDateTime,
) -> Result<ExamResult, FinishError> {
    if result.status.is_terminal() || result.disabled {
        return Err(FinishError::Stale);
    }

    let entries = submission::parse_fields(fields, &state.settings().exam().form_token_field)?;
    let requested: Vec<i64> = entries.iter().map(|entry| entry.answer_id).collect();
    let answers = if requested.is_empty() {
        Vec::new()
    } else {
        repositories::catalog::find_active_answers(state.db(), &requested).await?
    };
    let answer_ids = submission::resolve_answers(&entries, &answers)?;

    let status =
        if is_past_deadline(result, now) { ResultStatus::TimeUp } else { ResultStatus::Finished };

    let mut tx = state.db().begin().await?;
    repositories::responses::insert_batch(&mut *tx, result.id, &answer_ids, now).await?;
    let Some(updated) = repositories::results::complete(&mut *tx, result.id, status, now).await?
    else {
        tx.rollback().await?;
        return Err(FinishError::Stale);
    };
    tx.commit().await?;

    Ok(updated)
}

async fn notify_finished(state: &AppState, candidate: &User, result: &ExamResult) {
    if !state.notifier().enabled() {
        return;
    }

    let scorecard = match Scorecard::load(state.db(), result.id).await {
        Ok(scorecard) => scorecard,
        Err(err) => {
            tracing::warn!(
                result_id = result.id,
                error = %err,
                "Failed to score result for notification"
            );
            return;
        }
    };

    state.notifier().dispatch(ResultNotification {
        result_id: result.id,
        user_id: candidate.id.clone(),
        username: candidate.username.clone(),
        email: candidate.email.clone(),
        score: scorecard.correct_count(),
        total: scorecard.question_count(),
        elapsed_seconds: scoring::elapsed_time(result).map(|elapsed| elapsed.whole_seconds()),
    });
}
