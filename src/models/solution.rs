// src/models/solution.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::paper::QuestionPaper;

/// How an attempt ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Submitted by the student before time ran out.
    #[default]
    Completed,
    /// The countdown reached zero.
    Timeout,
    /// Auto-submitted after repeated visibility violations.
    Submitted,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Timeout => "timeout",
            SubmissionStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SubmissionStatus::Completed),
            "timeout" => Ok(SubmissionStatus::Timeout),
            "submitted" => Ok(SubmissionStatus::Submitted),
            other => Err(format!("unknown submission status '{}'", other)),
        }
    }
}

/// One graded question inside a stored attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question_id: Uuid,
    pub question: String,
    pub selected_option: Option<String>,
    pub correct_option: String,
    /// Maximum marks for the question.
    pub marks: i32,
    /// Marks earned: `marks` when correct, otherwise zero.
    pub awarded: i32,
    pub is_correct: bool,
}

/// A stored exam attempt ("solution").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub id: Uuid,
    pub student_id: Uuid,
    pub paper_id: Uuid,
    pub title: String,
    pub subject: String,
    pub time_limit: i32,
    pub total_marks: i32,
    pub class_stream: String,
    pub questions: Vec<AnsweredQuestion>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub total_score: i32,
    pub status: SubmissionStatus,
}

/// A single answer inside a submission payload.
///
/// Anything else a client sends per question (correctness flags, the
/// correct option, marks) is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    #[serde(default)]
    pub selected_option: Option<String>,
}

/// DTO for submitting an exam attempt.
///
/// Required fields are optional here so a missing one produces the
/// "Missing required fields" response instead of a JSON rejection.
/// Client-computed scores are not part of the contract and are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExamRequest {
    pub student_id: Option<Uuid>,
    pub paper_id: Option<Uuid>,
    pub questions: Option<Vec<SubmittedAnswer>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
}

/// Aggregate over all attempts of one paper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub attempts: usize,
    pub average_score: f64,
    pub highest_score: Option<i32>,
    pub lowest_score: Option<i32>,
}

/// Response of the per-paper stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperStats {
    pub paper_id: Uuid,
    pub summary: ScoreSummary,
    pub solutions: Vec<Solution>,
}

/// One attempt joined with its originating paper, for answer review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionReview {
    pub solution: Solution,
    pub paper: Option<QuestionPaper>,
}
