// src/exam/grading.rs

//! Authoritative scoring of an attempt against a paper's answer key.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{
    paper::{Question, QuestionKind, QuestionPaper},
    solution::{AnsweredQuestion, ScoreSummary, Solution, SubmittedAnswer},
};

/// Result of grading one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAttempt {
    pub questions: Vec<AnsweredQuestion>,
    pub total_score: i32,
}

/// Grades submitted answers question by question, in paper order.
///
/// Answers for questions that are not on the paper are ignored; when a
/// question is answered more than once the last answer counts.
pub fn grade(paper: &QuestionPaper, answers: &[SubmittedAnswer]) -> GradedAttempt {
    let selected: HashMap<Uuid, Option<&str>> = answers
        .iter()
        .map(|a| (a.question_id, a.selected_option.as_deref()))
        .collect();

    let questions: Vec<AnsweredQuestion> = paper
        .questions
        .iter()
        .map(|question| {
            let choice = selected.get(&question.id).copied().flatten();
            let correct = is_correct(question, choice);
            AnsweredQuestion {
                question_id: question.id,
                question: question.question.clone(),
                selected_option: choice.map(str::to_string),
                correct_option: question.answer.clone(),
                marks: question.marks,
                awarded: if correct { question.marks } else { 0 },
                is_correct: correct,
            }
        })
        .collect();

    let total_score = questions.iter().map(|q| q.awarded).sum();

    GradedAttempt {
        questions,
        total_score,
    }
}

/// Whether `selected` answers `question` correctly.
pub fn is_correct(question: &Question, selected: Option<&str>) -> bool {
    let Some(selected) = selected else {
        return false;
    };
    match question.kind {
        QuestionKind::Mcq => selected == question.answer,
        QuestionKind::Descriptive => {
            let given = normalize(selected);
            !given.is_empty() && given == normalize(&question.answer)
        }
    }
}

/// Lowercases and collapses runs of whitespace.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Aggregates scores over a set of attempts.
pub fn summarize(solutions: &[Solution]) -> ScoreSummary {
    let attempts = solutions.len();
    let total: i64 = solutions.iter().map(|s| i64::from(s.total_score)).sum();
    let average_score = if attempts == 0 {
        0.0
    } else {
        total as f64 / attempts as f64
    };

    ScoreSummary {
        attempts,
        average_score,
        highest_score: solutions.iter().map(|s| s.total_score).max(),
        lowest_score: solutions.iter().map(|s| s.total_score).min(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::solution::SubmissionStatus;
    use chrono::Utc;

    fn question(answer: &str, marks: i32) -> Question {
        Question {
            id: Uuid::new_v4(),
            question: format!("Which is {}?", answer),
            kind: QuestionKind::Mcq,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: answer.to_string(),
            marks,
        }
    }

    fn paper(questions: Vec<Question>) -> QuestionPaper {
        QuestionPaper {
            id: Uuid::new_v4(),
            title: "Quiz".into(),
            subject: "Maths".into(),
            class_stream: "10A".into(),
            total_marks: questions.iter().map(|q| q.marks).sum(),
            time_limit: 10,
            questions,
            created_at: Utc::now(),
        }
    }

    fn answer(q: &Question, option: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: q.id,
            selected_option: Some(option.to_string()),
        }
    }

    #[test]
    fn scores_only_correct_questions() {
        let p = paper(vec![question("A", 5), question("C", 3)]);
        let answers = vec![answer(&p.questions[0], "A"), answer(&p.questions[1], "B")];

        let graded = grade(&p, &answers);
        assert_eq!(graded.total_score, 5);
        assert!(graded.questions[0].is_correct);
        assert_eq!(graded.questions[0].awarded, 5);
        assert!(!graded.questions[1].is_correct);
        assert_eq!(graded.questions[1].awarded, 0);
        assert_eq!(graded.questions[1].marks, 3);
        assert_eq!(graded.questions[1].correct_option, "C");
    }

    #[test]
    fn unanswered_questions_score_zero() {
        let p = paper(vec![question("A", 5), question("C", 3)]);
        let graded = grade(&p, &[answer(&p.questions[1], "C")]);

        assert_eq!(graded.total_score, 3);
        assert_eq!(graded.questions[0].selected_option, None);
        assert!(!graded.questions[0].is_correct);
    }

    #[test]
    fn last_answer_wins_and_unknown_ids_are_ignored() {
        let p = paper(vec![question("A", 4)]);
        let stray = SubmittedAnswer {
            question_id: Uuid::new_v4(),
            selected_option: Some("A".into()),
        };
        let answers = vec![
            answer(&p.questions[0], "B"),
            stray,
            answer(&p.questions[0], "A"),
        ];

        let graded = grade(&p, &answers);
        assert_eq!(graded.questions.len(), 1);
        assert_eq!(graded.total_score, 4);
    }

    #[test]
    fn mcq_comparison_is_exact() {
        let q = question("Paris", 1);
        assert!(is_correct(&q, Some("Paris")));
        assert!(!is_correct(&q, Some("paris")));
        assert!(!is_correct(&q, Some("Paris ")));
        assert!(!is_correct(&q, None));
    }

    #[test]
    fn descriptive_comparison_is_normalized() {
        let mut q = question("Light energy", 2);
        q.kind = QuestionKind::Descriptive;
        q.options.clear();
        assert!(is_correct(&q, Some("  light   ENERGY ")));
        assert!(!is_correct(&q, Some("heat")));
        assert!(!is_correct(&q, Some("   ")));
    }

    #[test]
    fn summary_over_attempts() {
        let p = paper(vec![question("A", 5)]);
        let make = |score: i32| Solution {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            paper_id: p.id,
            title: p.title.clone(),
            subject: p.subject.clone(),
            time_limit: p.time_limit,
            total_marks: p.total_marks,
            class_stream: p.class_stream.clone(),
            questions: Vec::new(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            submitted_at: Utc::now(),
            total_score: score,
            status: SubmissionStatus::Completed,
        };

        let summary = summarize(&[make(5), make(0), make(4)]);
        assert_eq!(summary.attempts, 3);
        assert_eq!(summary.average_score, 3.0);
        assert_eq!(summary.highest_score, Some(5));
        assert_eq!(summary.lowest_score, Some(0));

        let empty = summarize(&[]);
        assert_eq!(empty.attempts, 0);
        assert_eq!(empty.highest_score, None);
    }
}
