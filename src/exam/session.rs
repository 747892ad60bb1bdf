// src/exam/session.rs

//! Client-side exam session: countdown, answer capture, visibility policy
//! and the submission lifecycle.
//!
//! The session never grades anything. It packages the student's answers
//! and lets the server compute the score.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    exam::timing::{format_countdown, remaining_seconds},
    models::{
        paper::PublicPaper,
        solution::{SubmissionStatus, SubmitExamRequest, SubmittedAnswer},
    },
};

/// Visibility losses tolerated before the exam is submitted automatically.
pub const VISIBILITY_WARNING_LIMIT: u32 = 1;

/// Where the start timestamp of each paper is persisted between reloads.
pub trait StartTimeStore {
    fn get(&self, paper_id: Uuid) -> Option<DateTime<Utc>>;
    fn set(&mut self, paper_id: Uuid, started_at: DateTime<Utc>);
    fn remove(&mut self, paper_id: Uuid);
}

/// In-memory [`StartTimeStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStartTimes {
    entries: HashMap<Uuid, DateTime<Utc>>,
}

impl StartTimeStore for MemoryStartTimes {
    fn get(&self, paper_id: Uuid) -> Option<DateTime<Utc>> {
        self.entries.get(&paper_id).copied()
    }

    fn set(&mut self, paper_id: Uuid, started_at: DateTime<Utc>) {
        self.entries.insert(paper_id, started_at);
    }

    fn remove(&mut self, paper_id: Uuid) {
        self.entries.remove(&paper_id);
    }
}

/// Why a submission was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    /// The student pressed submit.
    Manual,
    /// The countdown reached zero.
    TimeUp,
    /// Too many visibility violations.
    VisibilityViolation,
}

impl SubmitReason {
    pub fn status(&self) -> SubmissionStatus {
        match self {
            SubmitReason::Manual => SubmissionStatus::Completed,
            SubmitReason::TimeUp => SubmissionStatus::Timeout,
            SubmitReason::VisibilityViolation => SubmissionStatus::Submitted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Submitting(SubmitReason),
    Submitted,
}

/// Outcome of a single visibility-loss event.
#[derive(Debug, Clone, PartialEq)]
pub enum VisibilityOutcome {
    /// A warning overlay should be shown; nothing is submitted.
    Warned { violations: u32 },
    /// The exam must be submitted with this payload.
    AutoSubmit(SubmitExamRequest),
    /// The event changes nothing (already submitting or submitted).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    UnknownQuestion,
    /// The session no longer accepts answers.
    Closed,
}

/// Counts visibility losses and decides when to auto-submit.
#[derive(Debug, Clone, Default)]
struct VisibilityMonitor {
    violations: u32,
    warning_visible: bool,
    auto_submitted: bool,
}

impl VisibilityMonitor {
    /// Records one loss. Returns true exactly once, when the limit is passed.
    fn record(&mut self) -> bool {
        if self.auto_submitted {
            return false;
        }
        self.violations += 1;
        if self.violations > VISIBILITY_WARNING_LIMIT {
            self.warning_visible = false;
            self.auto_submitted = true;
            true
        } else {
            self.warning_visible = true;
            false
        }
    }
}

/// One student's attempt at one paper.
#[derive(Debug, Clone)]
pub struct ExamSession {
    student_id: Uuid,
    paper: PublicPaper,
    started_at: DateTime<Utc>,
    answers: HashMap<Uuid, String>,
    visibility: VisibilityMonitor,
    state: SessionState,
}

impl ExamSession {
    /// Opens a session, reusing a previously stored start time so that a
    /// reload does not reset the clock.
    pub fn start(
        student_id: Uuid,
        paper: PublicPaper,
        storage: &mut dyn StartTimeStore,
        now: DateTime<Utc>,
    ) -> Self {
        let started_at = match storage.get(paper.id) {
            Some(started_at) => started_at,
            None => {
                storage.set(paper.id, now);
                now
            }
        };

        Self {
            student_id,
            paper,
            started_at,
            answers: HashMap::new(),
            visibility: VisibilityMonitor::default(),
            state: SessionState::Active,
        }
    }

    pub fn paper(&self) -> &PublicPaper {
        &self.paper
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn violations(&self) -> u32 {
        self.visibility.violations
    }

    pub fn warning_visible(&self) -> bool {
        self.visibility.warning_visible
    }

    pub fn selected(&self, question_id: Uuid) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        remaining_seconds(self.started_at, self.paper.time_limit, now)
    }

    /// Countdown text, e.g. `09:58`.
    pub fn countdown(&self, now: DateTime<Utc>) -> String {
        format_countdown(self.remaining_seconds(now))
    }

    /// Records the student's choice for a question.
    pub fn select(&mut self, question_id: Uuid, option: impl Into<String>) -> Result<(), SelectError> {
        if self.state != SessionState::Active {
            return Err(SelectError::Closed);
        }
        if !self.paper.questions.iter().any(|q| q.id == question_id) {
            return Err(SelectError::UnknownQuestion);
        }
        self.answers.insert(question_id, option.into());
        Ok(())
    }

    /// Called once per second. Starts a submission when time runs out.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<SubmitExamRequest> {
        if self.state == SessionState::Active && self.remaining_seconds(now) == 0 {
            return self.begin_submit(SubmitReason::TimeUp, now);
        }
        None
    }

    /// Handles the page becoming hidden.
    pub fn visibility_lost(&mut self, now: DateTime<Utc>) -> VisibilityOutcome {
        if self.state != SessionState::Active {
            return VisibilityOutcome::Ignored;
        }
        if self.visibility.record() {
            match self.begin_submit(SubmitReason::VisibilityViolation, now) {
                Some(payload) => VisibilityOutcome::AutoSubmit(payload),
                None => VisibilityOutcome::Ignored,
            }
        } else if self.visibility.auto_submitted {
            VisibilityOutcome::Ignored
        } else {
            VisibilityOutcome::Warned {
                violations: self.visibility.violations,
            }
        }
    }

    /// Dismisses the warning overlay. The violation count is kept.
    pub fn acknowledge_warning(&mut self) {
        self.visibility.warning_visible = false;
    }

    /// Manual submission.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Option<SubmitExamRequest> {
        self.begin_submit(SubmitReason::Manual, now)
    }

    /// Moves to `Submitting` and builds the payload. Returns `None` while
    /// another submission is in flight or after success.
    pub fn begin_submit(
        &mut self,
        reason: SubmitReason,
        now: DateTime<Utc>,
    ) -> Option<SubmitExamRequest> {
        if self.state != SessionState::Active {
            return None;
        }
        self.state = SessionState::Submitting(reason);
        Some(self.payload(reason, now))
    }

    /// The server stored the attempt: forget the start time.
    pub fn submission_succeeded(&mut self, storage: &mut dyn StartTimeStore) {
        storage.remove(self.paper.id);
        self.state = SessionState::Submitted;
    }

    /// The submission failed: go back to `Active` without touching answers
    /// or the stored start time. There is no automatic retry.
    pub fn submission_failed(&mut self) {
        if matches!(self.state, SessionState::Submitting(_)) {
            self.state = SessionState::Active;
        }
    }

    fn payload(&self, reason: SubmitReason, now: DateTime<Utc>) -> SubmitExamRequest {
        let questions = self
            .paper
            .questions
            .iter()
            .map(|q| SubmittedAnswer {
                question_id: q.id,
                selected_option: self.answers.get(&q.id).cloned(),
            })
            .collect();

        SubmitExamRequest {
            student_id: Some(self.student_id),
            paper_id: Some(self.paper.id),
            questions: Some(questions),
            started_at: Some(self.started_at),
            completed_at: Some(now),
            status: Some(reason.status()),
        }
    }
}
