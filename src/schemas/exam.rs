use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Answer, Exam, Extra, Question};
use crate::services::exam_session::{EffectiveSettings, SettingsSource};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerCreate {
    #[validate(length(min = 1, message = "answer text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "imagePath")]
    pub(crate) image_path: Option<String>,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "imagePath")]
    pub(crate) image_path: Option<String>,
    #[validate(length(min = 2, message = "a question needs at least two answers"), nested)]
    pub(crate) answers: Vec<AnswerCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExtraCreate {
    #[validate(length(min = 1, message = "extra title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "imagePath")]
    pub(crate) image_path: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionCreate {
    #[validate(length(min = 1, message = "section title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) instructions: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) extra: Option<ExtraCreate>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, message = "subject title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) sections: Vec<SectionCreate>,
}

/// A whole exam catalog tree, created in one request.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamTreeCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) subjects: Vec<SubjectCreate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) disabled: bool,
    pub(crate) created_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            disabled: exam.disabled,
            created_at: format_primitive(exam.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtraResponse {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) image_path: Option<String>,
}

impl ExtraResponse {
    pub(crate) fn from_db(extra: &Extra) -> Self {
        Self {
            id: extra.id,
            title: extra.title.clone(),
            text: extra.text.clone(),
            image_path: extra.image_path.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperAnswer {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) image_path: Option<String>,
    /// Present only in back-office views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_correct: Option<bool>,
}

impl PaperAnswer {
    pub(crate) fn from_db(answer: &Answer, reveal_correct: bool) -> Self {
        Self {
            id: answer.id,
            text: answer.text.clone(),
            image_path: answer.image_path.clone(),
            is_correct: reveal_correct.then_some(answer.is_correct),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperQuestion {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) image_path: Option<String>,
    pub(crate) answers: Vec<PaperAnswer>,
}

impl PaperQuestion {
    pub(crate) fn from_db(question: &Question, answers: Vec<PaperAnswer>) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            image_path: question.image_path.clone(),
            answers,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperSection {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) instructions: String,
    pub(crate) extra: Option<ExtraResponse>,
    pub(crate) questions: Vec<PaperQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperSubject {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) sections: Vec<PaperSection>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperResponse {
    pub(crate) exam: ExamResponse,
    pub(crate) subjects: Vec<PaperSubject>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SettingsUpdate {
    #[serde(alias = "currentExamId")]
    pub(crate) current_exam_id: i64,
    #[serde(alias = "minutesToFinish")]
    #[validate(range(min = 1, message = "minutes_to_finish must be positive"))]
    pub(crate) minutes_to_finish: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct SettingsResponse {
    pub(crate) current_exam_id: Option<i64>,
    pub(crate) minutes_to_finish: i32,
    pub(crate) source: SettingsSource,
}

impl From<EffectiveSettings> for SettingsResponse {
    fn from(settings: EffectiveSettings) -> Self {
        Self {
            current_exam_id: settings.current_exam_id,
            minutes_to_finish: settings.minutes_to_finish,
            source: settings.source,
        }
    }
}
