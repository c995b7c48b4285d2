use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::db::models::Exam;
use crate::repositories;
use crate::schemas::exam::{
    ExamResponse, ExamTreeCreate, ExtraResponse, PaperAnswer, PaperQuestion, PaperResponse,
    PaperSection, PaperSubject, QuestionCreate,
};

#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn check_single_correct(subject: &str, question: &QuestionCreate) -> Result<(), CatalogError> {
    let correct = question.answers.iter().filter(|answer| answer.is_correct).count();
    if correct == 1 {
        Ok(())
    } else {
        Err(CatalogError::Invalid(format!(
            "question {:?} in subject {subject:?} must have exactly one correct answer, found {correct}",
            question.text
        )))
    }
}

/// Checks the rules the derive attributes cannot express.
pub(crate) fn check_tree(payload: &ExamTreeCreate) -> Result<(), CatalogError> {
    for subject in &payload.subjects {
        for section in &subject.sections {
            for question in &section.questions {
                check_single_correct(&subject.title, question)?;
            }
        }
    }
    Ok(())
}

/// Inserts an exam with its full subject tree in one transaction.
pub(crate) async fn create_exam_tree(
    pool: &PgPool,
    payload: &ExamTreeCreate,
    now: PrimitiveDateTime,
) -> Result<Exam, CatalogError> {
    check_tree(payload)?;

    let mut tx = pool.begin().await?;
    let exam =
        repositories::catalog::insert_exam(&mut *tx, &payload.title, &payload.description, now)
            .await?;

    for subject in &payload.subjects {
        let subject_id =
            repositories::catalog::insert_subject(&mut *tx, exam.id, &subject.title, now).await?;

        for section in &subject.sections {
            let extra_id = match &section.extra {
                Some(extra) => Some(
                    repositories::catalog::insert_extra(
                        &mut *tx,
                        &extra.title,
                        &extra.text,
                        extra.image_path.as_deref(),
                        now,
                    )
                    .await?,
                ),
                None => None,
            };
            let section_id = repositories::catalog::insert_section(
                &mut *tx,
                subject_id,
                &section.title,
                &section.instructions,
                extra_id,
                now,
            )
            .await?;

            for question in &section.questions {
                let question_id = repositories::catalog::insert_question(
                    &mut *tx,
                    section_id,
                    &question.text,
                    question.image_path.as_deref(),
                    now,
                )
                .await?;

                for answer in &question.answers {
                    repositories::catalog::insert_answer(
                        &mut *tx,
                        question_id,
                        &answer.text,
                        answer.image_path.as_deref(),
                        answer.is_correct,
                        now,
                    )
                    .await?;
                }
            }
        }
    }

    tx.commit().await?;
    tracing::info!(exam_id = exam.id, title = %exam.title, "Exam catalog created");
    Ok(exam)
}

/// Active catalog tree of an exam. `reveal_correct` exposes the answer key.
pub(crate) async fn exam_paper(
    pool: &PgPool,
    exam: Exam,
    reveal_correct: bool,
) -> Result<PaperResponse, sqlx::Error> {
    let subjects = repositories::catalog::list_subjects(pool, exam.id).await?;
    let sections = repositories::catalog::list_sections(pool, exam.id).await?;
    let extras = repositories::catalog::list_extras(pool, exam.id).await?;
    let questions = repositories::catalog::list_questions(pool, exam.id).await?;
    let answers = repositories::catalog::list_answers(pool, exam.id).await?;

    let extras: HashMap<i64, _> = extras.iter().map(|extra| (extra.id, extra)).collect();

    let mut answers_by_question: HashMap<i64, Vec<PaperAnswer>> = HashMap::new();
    for answer in &answers {
        answers_by_question
            .entry(answer.question_id)
            .or_default()
            .push(PaperAnswer::from_db(answer, reveal_correct));
    }

    let mut questions_by_section: HashMap<i64, Vec<PaperQuestion>> = HashMap::new();
    for question in &questions {
        let answers = answers_by_question.remove(&question.id).unwrap_or_default();
        questions_by_section
            .entry(question.section_id)
            .or_default()
            .push(PaperQuestion::from_db(question, answers));
    }

    let mut sections_by_subject: HashMap<i64, Vec<PaperSection>> = HashMap::new();
    for section in sections {
        let extra = section
            .extra_id
            .and_then(|id| extras.get(&id))
            .map(|extra| ExtraResponse::from_db(extra));
        sections_by_subject.entry(section.subject_id).or_default().push(PaperSection {
            id: section.id,
            questions: questions_by_section.remove(&section.id).unwrap_or_default(),
            title: section.title,
            instructions: section.instructions,
            extra,
        });
    }

    let subjects = subjects
        .into_iter()
        .map(|subject| PaperSubject {
            id: subject.id,
            sections: sections_by_subject.remove(&subject.id).unwrap_or_default(),
            title: subject.title,
        })
        .collect();

    Ok(PaperResponse { exam: ExamResponse::from_db(exam), subjects })
}
