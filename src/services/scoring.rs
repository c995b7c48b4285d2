use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use sqlx::PgPool;
use time::Duration;

use crate::db::models::{ExamResult, QuestionPlacement, ScoredResponse};
use crate::db::types::ResultStatus;
use crate::repositories;
use crate::schemas::result::{SectionBreakdown, SubjectBreakdown};

/// Read-only score aggregation for one result.
///
/// The exam is taken from the first recorded response. Responses that point
/// into another exam are ignored, and a result without responses scores
/// zero everywhere.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scorecard {
    exam_id: Option<i64>,
    responses: Vec<ScoredResponse>,
    questions: Vec<QuestionPlacement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SectionScore {
    pub(crate) section_id: i64,
    pub(crate) correct: usize,
    pub(crate) total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SubjectScore {
    pub(crate) subject_id: i64,
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) sections: Vec<SectionScore>,
}

impl Scorecard {
    /// `responses` must be ordered by response id; `questions` are the
    /// active questions of the exam the first response belongs to.
    pub(crate) fn new(responses: Vec<ScoredResponse>, questions: Vec<QuestionPlacement>) -> Self {
        let Some(exam_id) = responses.first().map(|response| response.exam_id) else {
            return Self::default();
        };

        let responses =
            responses.into_iter().filter(|response| response.exam_id == exam_id).collect();
        Self { exam_id: Some(exam_id), responses, questions }
    }

    pub(crate) async fn load(pool: &PgPool, result_id: i64) -> Result<Self, sqlx::Error> {
        let responses = repositories::responses::list_scored(pool, result_id).await?;
        let questions = match responses.first() {
            Some(first) => {
                repositories::catalog::list_question_placements(pool, first.exam_id).await?
            }
            None => Vec::new(),
        };
        Ok(Self::new(responses, questions))
    }

    pub(crate) fn exam_id(&self) -> Option<i64> {
        self.exam_id
    }

    /// Responses recorded against the inferred exam.
    pub(crate) fn answered_count(&self) -> usize {
        self.responses.len()
    }

    fn correct(&self) -> impl Iterator<Item = &ScoredResponse> {
        self.responses.iter().filter(|response| response.is_correct)
    }

    pub(crate) fn correct_count(&self) -> usize {
        self.correct().count()
    }

    pub(crate) fn correct_count_by_subject(&self, subject_id: i64) -> usize {
        self.correct().filter(|response| response.subject_id == subject_id).count()
    }

    pub(crate) fn correct_count_by_section(&self, section_id: i64) -> usize {
        self.correct().filter(|response| response.section_id == section_id).count()
    }

    pub(crate) fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub(crate) fn question_count_by_subject(&self, subject_id: i64) -> usize {
        self.questions.iter().filter(|question| question.subject_id == subject_id).count()
    }

    pub(crate) fn question_count_by_section(&self, section_id: i64) -> usize {
        self.questions.iter().filter(|question| question.section_id == section_id).count()
    }

    /// Per-subject and per-section totals, ordered by id.
    pub(crate) fn breakdown(&self) -> Vec<SubjectScore> {
        let mut subjects: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        for question in &self.questions {
            subjects.entry(question.subject_id).or_default().insert(question.section_id);
        }

        subjects
            .into_iter()
            .map(|(subject_id, sections)| SubjectScore {
                subject_id,
                correct: self.correct_count_by_subject(subject_id),
                total: self.question_count_by_subject(subject_id),
                sections: sections
                    .into_iter()
                    .map(|section_id| SectionScore {
                        section_id,
                        correct: self.correct_count_by_section(section_id),
                        total: self.question_count_by_section(section_id),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// [`Scorecard::breakdown`] with subject and section titles attached.
pub(crate) async fn titled_breakdown(
    pool: &PgPool,
    scorecard: &Scorecard,
) -> Result<Vec<SubjectBreakdown>, sqlx::Error> {
    let Some(exam_id) = scorecard.exam_id() else {
        return Ok(Vec::new());
    };

    let subjects = repositories::catalog::list_subjects(pool, exam_id).await?;
    let sections = repositories::catalog::list_sections(pool, exam_id).await?;
    let subject_titles: HashMap<i64, String> =
        subjects.into_iter().map(|subject| (subject.id, subject.title)).collect();
    let section_titles: HashMap<i64, String> =
        sections.into_iter().map(|section| (section.id, section.title)).collect();

    Ok(scorecard
        .breakdown()
        .into_iter()
        .map(|subject| SubjectBreakdown {
            subject_id: subject.subject_id,
            title: subject_titles.get(&subject.subject_id).cloned().unwrap_or_default(),
            correct: subject.correct,
            total: subject.total,
            sections: subject
                .sections
                .into_iter()
                .map(|section| SectionBreakdown {
                    section_id: section.section_id,
                    title: section_titles.get(&section.section_id).cloned().unwrap_or_default(),
                    correct: section.correct,
                    total: section.total,
                })
                .collect(),
        })
        .collect())
}

/// Time spent on a finished attempt. Timed-out and open attempts have none.
pub(crate) fn elapsed_time(result: &ExamResult) -> Option<Duration> {
    if result.status != ResultStatus::Finished {
        return None;
    }
    result.end_time.map(|end| end - result.start_time)
}
