use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::db::models::Answer;

/// One `question -> answer` pair taken from a submitted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SubmittedAnswer {
    pub(crate) question_id: i64,
    pub(crate) answer_id: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SubmissionError {
    #[error("question key {0:?} is not a valid identifier")]
    InvalidKey(String),
    #[error("answer {value:?} for question {question_id} is not a valid identifier")]
    InvalidValue { question_id: i64, value: String },
    #[error("answer {0} does not exist")]
    UnknownAnswer(i64),
    #[error("question {0} was answered more than once")]
    DuplicateQuestion(i64),
}

fn is_question_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Extracts question/answer pairs from raw form fields.
///
/// The form token field and every key that is not made of ASCII digits are
/// skipped. Nothing is looked up here; see [`resolve_answers`].
pub(crate) fn parse_fields(
    fields: &[(String, String)],
    token_field: &str,
) -> Result<Vec<SubmittedAnswer>, SubmissionError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (key, value) in fields {
        if key == token_field || !is_question_key(key) {
            continue;
        }

        let question_id: i64 =
            key.parse().map_err(|_| SubmissionError::InvalidKey(key.clone()))?;
        let answer_id: i64 = value.trim().parse().map_err(|_| SubmissionError::InvalidValue {
            question_id,
            value: value.clone(),
        })?;

        if !seen.insert(question_id) {
            return Err(SubmissionError::DuplicateQuestion(question_id));
        }
        entries.push(SubmittedAnswer { question_id, answer_id });
    }

    Ok(entries)
}

/// Checks parsed entries against the active answers fetched for them.
///
/// Returns the answer ids to record, in submission order. Two entries whose
/// answers belong to the same question are rejected.
pub(crate) fn resolve_answers(
    entries: &[SubmittedAnswer],
    answers: &[Answer],
) -> Result<Vec<i64>, SubmissionError> {
    let by_id: HashMap<i64, &Answer> = answers.iter().map(|answer| (answer.id, answer)).collect();
    let mut questions = HashSet::new();
    let mut answer_ids = Vec::with_capacity(entries.len());

    for entry in entries {
        let answer =
            by_id.get(&entry.answer_id).ok_or(SubmissionError::UnknownAnswer(entry.answer_id))?;
        if !questions.insert(answer.question_id) {
            return Err(SubmissionError::DuplicateQuestion(answer.question_id));
        }
        answer_ids.push(answer.id);
    }

    Ok(answer_ids)
}
