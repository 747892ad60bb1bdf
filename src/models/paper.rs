// src/models/paper.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::utils::html::clean_html;

/// Number of options every multiple-choice question carries.
pub const MCQ_OPTION_COUNT: usize = 4;

/// How a question is answered and graded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Pick one of four options; graded by exact string equality.
    #[default]
    Mcq,
    /// Free text; graded by normalized equality with the answer key.
    Descriptive,
}

/// A question as stored inside a paper document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub question: String,
    pub kind: QuestionKind,
    /// Empty for descriptive questions.
    #[serde(default)]
    pub options: Vec<String>,
    /// The correct answer.
    pub answer: String,
    pub marks: i32,
}

/// A published question paper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPaper {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub class_stream: String,
    pub total_marks: i32,
    /// Minutes.
    pub time_limit: i32,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

/// Question sent to students (answer key removed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub marks: i32,
}

/// Paper sent to students before and during an attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicPaper {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub class_stream: String,
    pub total_marks: i32,
    pub time_limit: i32,
    pub questions: Vec<PublicQuestion>,
    pub created_at: DateTime<Utc>,
}

/// Listing entry for the paper catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaperSummary {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub class_stream: String,
    pub total_marks: i32,
    pub time_limit: i32,
    pub question_count: usize,
    pub created_at: DateTime<Utc>,
}

/// What `GET /api/papers/{id}` returns depending on the caller's role.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PaperView {
    Full(QuestionPaper),
    Public(PublicPaper),
}

/// Query parameters for the paper catalogue.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperFilter {
    pub class_stream: Option<String>,
    pub subject: Option<String>,
}

impl PaperFilter {
    pub fn matches(&self, paper: &QuestionPaper) -> bool {
        self.class_stream
            .as_deref()
            .is_none_or(|class_stream| paper.class_stream == class_stream)
            && self
                .subject
                .as_deref()
                .is_none_or(|subject| paper.subject == subject)
    }
}

impl QuestionPaper {
    pub fn to_public(&self) -> PublicPaper {
        PublicPaper {
            id: self.id,
            title: self.title.clone(),
            subject: self.subject.clone(),
            class_stream: self.class_stream.clone(),
            total_marks: self.total_marks,
            time_limit: self.time_limit,
            questions: self
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id,
                    question: q.question.clone(),
                    kind: q.kind,
                    options: q.options.clone(),
                    marks: q.marks,
                })
                .collect(),
            created_at: self.created_at,
        }
    }

    pub fn summary(&self) -> PaperSummary {
        PaperSummary {
            id: self.id,
            title: self.title.clone(),
            subject: self.subject.clone(),
            class_stream: self.class_stream.clone(),
            total_marks: self.total_marks,
            time_limit: self.time_limit,
            question_count: self.questions.len(),
            created_at: self.created_at,
        }
    }
}

/// DTO for creating a new question inside a paper.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_question_shape))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "Question text is required"))]
    pub question: String,
    #[serde(default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 2000, message = "Answer is required"))]
    pub answer: String,
    #[validate(range(min = 1, max = 1000, message = "Marks must be between 1 and 1000"))]
    pub marks: i32,
}

/// DTO for creating a new question paper.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_paper_marks))]
pub struct CreatePaperRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, max = 100, message = "Class/stream is required"))]
    pub class_stream: String,
    #[validate(range(min = 1, max = 10000, message = "Total marks must be positive"))]
    pub total_marks: i32,
    #[validate(range(min = 1, max = 600, message = "Time limit must be between 1 and 600 minutes"))]
    pub time_limit: i32,
    #[validate(length(min = 1, message = "At least one question is required"), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

fn validate_question_shape(req: &CreateQuestionRequest) -> Result<(), ValidationError> {
    match req.kind {
        QuestionKind::Mcq => {
            if req.options.len() != MCQ_OPTION_COUNT {
                return Err(ValidationError::new("option_count")
                    .with_message("Multiple-choice questions need exactly four options".into()));
            }
            if req.options.iter().any(|opt| opt.trim().is_empty() || opt.len() > 500) {
                return Err(ValidationError::new("invalid_option")
                    .with_message("Options must be between 1 and 500 characters".into()));
            }
            if !req.options.contains(&req.answer) {
                return Err(ValidationError::new("answer_not_in_options")
                    .with_message("The correct answer must match one of the options".into()));
            }
        }
        QuestionKind::Descriptive => {
            if !req.options.is_empty() {
                return Err(ValidationError::new("unexpected_options")
                    .with_message("Descriptive questions take no options".into()));
            }
            if req.answer.trim().is_empty() {
                return Err(ValidationError::new("blank_answer")
                    .with_message("Descriptive questions need a model answer".into()));
            }
        }
    }
    Ok(())
}

fn validate_paper_marks(req: &CreatePaperRequest) -> Result<(), ValidationError> {
    let sum: i64 = req.questions.iter().map(|q| i64::from(q.marks)).sum();
    if sum != i64::from(req.total_marks) {
        return Err(ValidationError::new("marks_mismatch").with_message(
            format!(
                "Question marks add up to {} but total marks is {}",
                sum, req.total_marks
            )
            .into(),
        ));
    }
    Ok(())
}

impl CreatePaperRequest {
    /// Builds the stored paper, sanitizing every piece of free text.
    ///
    /// Mcq options and answers go through the same cleaner so an answer
    /// that matched an option before sanitizing still matches afterwards.
    /// Descriptive keys are compared with typed text and stay unescaped.
    pub fn into_paper(self, now: DateTime<Utc>) -> QuestionPaper {
        QuestionPaper {
            id: Uuid::new_v4(),
            title: clean_html(self.title.trim()),
            subject: clean_html(self.subject.trim()),
            class_stream: clean_html(self.class_stream.trim()),
            total_marks: self.total_marks,
            time_limit: self.time_limit,
            questions: self
                .questions
                .into_iter()
                .map(|q| Question {
                    id: Uuid::new_v4(),
                    question: clean_html(&q.question),
                    kind: q.kind,
                    options: q.options.iter().map(|o| clean_html(o)).collect(),
                    answer: match q.kind {
                        QuestionKind::Mcq => clean_html(&q.answer),
                        QuestionKind::Descriptive => q.answer.trim().to_string(),
                    },
                    marks: q.marks,
                })
                .collect(),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(answer: &str, marks: i32) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question: "Pick one".to_string(),
            kind: QuestionKind::Mcq,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: answer.to_string(),
            marks,
        }
    }

    fn request(questions: Vec<CreateQuestionRequest>, total_marks: i32) -> CreatePaperRequest {
        CreatePaperRequest {
            title: "Algebra".to_string(),
            subject: "Maths".to_string(),
            class_stream: "10A".to_string(),
            total_marks,
            time_limit: 30,
            questions,
        }
    }

    #[test]
    fn accepts_consistent_paper() {
        let req = request(vec![mcq("A", 5), mcq("C", 3)], 8);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_marks_that_do_not_add_up() {
        let req = request(vec![mcq("A", 5), mcq("C", 3)], 10);
        let errors = req.validate().unwrap_err();
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn rejects_answer_outside_options() {
        let req = request(vec![mcq("E", 5)], 5);
        let errors = req.validate().unwrap_err();
        assert!(errors.errors().contains_key("questions"));
    }

    #[test]
    fn descriptive_questions_take_no_options() {
        let mut question = mcq("Photosynthesis", 4);
        question.kind = QuestionKind::Descriptive;
        assert!(question.validate().is_err());

        question.options.clear();
        assert!(question.validate().is_ok());
    }

    #[test]
    fn public_view_hides_answers() {
        let paper = request(vec![mcq("B", 2)], 2).into_paper(Utc::now());
        let public = serde_json::to_value(paper.to_public()).unwrap();
        assert!(public["questions"][0].get("answer").is_none());
        assert_eq!(public["questions"][0]["marks"], 2);
        assert_eq!(public["classStream"], "10A");
    }

    #[test]
    fn sanitizing_keeps_answer_in_options() {
        let mut question = mcq("a < b", 1);
        question.options[0] = "a < b".to_string();
        let paper = request(vec![question], 1).into_paper(Utc::now());
        let stored = &paper.questions[0];
        assert!(stored.options.contains(&stored.answer));
    }

    #[test]
    fn descriptive_key_is_stored_as_typed() {
        let mut question = mcq(" Boyle & Mariotte ", 1);
        question.kind = QuestionKind::Descriptive;
        question.options.clear();
        let paper = request(vec![question], 1).into_paper(Utc::now());
        assert_eq!(paper.questions[0].answer, "Boyle & Mariotte");
    }

    #[test]
    fn filter_matches_exact_fields() {
        let paper = request(vec![mcq("A", 1)], 1).into_paper(Utc::now());
        assert!(PaperFilter::default().matches(&paper));
        let filter = PaperFilter {
            class_stream: Some("10A".into()),
            subject: Some("Physics".into()),
        };
        assert!(!filter.matches(&paper));
    }
}
