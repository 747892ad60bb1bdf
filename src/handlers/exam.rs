// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    exam::{grading, timing::is_overdue},
    handlers::parse_id,
    models::solution::{PaperStats, Solution, SolutionReview, SubmissionStatus, SubmitExamRequest},
    store::DynStore,
    utils::{json::AppJson, jwt::Claims},
};

/// Submits an exam attempt.
/// Student only.
///
/// The score is computed here from the stored answer key. Correctness
/// flags or totals sent by the client are discarded during deserialization.
pub async fn submit_exam(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(student_id), Some(paper_id), Some(answers)) =
        (payload.student_id, payload.paper_id, payload.questions)
    else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    if student_id != claims.user_id()? {
        return Err(AppError::Forbidden(
            "Cannot submit an exam for another student".to_string(),
        ));
    }

    let paper = store
        .get_paper(paper_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Paper not found".to_string()))?;

    let graded = grading::grade(&paper, &answers);

    let now = Utc::now();
    // Client clocks are not trusted past the server's own
    let completed_at = payload.completed_at.unwrap_or(now).min(now);
    let started_at = payload.started_at.unwrap_or(now).min(completed_at);
    let mut status = payload.status.unwrap_or_default();
    if status == SubmissionStatus::Completed && is_overdue(started_at, completed_at, paper.time_limit)
    {
        status = SubmissionStatus::Timeout;
    }

    let solution = Solution {
        id: Uuid::new_v4(),
        student_id,
        paper_id,
        title: paper.title.clone(),
        subject: paper.subject.clone(),
        time_limit: paper.time_limit,
        total_marks: paper.total_marks,
        class_stream: claims
            .class_stream
            .clone()
            .unwrap_or_else(|| paper.class_stream.clone()),
        questions: graded.questions,
        started_at,
        completed_at,
        submitted_at: now,
        total_score: graded.total_score,
        status,
    };

    let solution = store.insert_solution(solution).await?;

    tracing::info!(
        "Student {} scored {}/{} on paper {} ({})",
        student_id,
        solution.total_score,
        solution.total_marks,
        paper_id,
        solution.status
    );

    Ok((StatusCode::CREATED, Json(solution)))
}

/// All attempts at a paper with a score summary.
pub async fn exam_stats(
    State(store): State<DynStore>,
    Path(paper_id): Path<String>,
) -> Result<Json<PaperStats>, AppError> {
    let not_found = || AppError::NotFound("Paper not found".to_string());
    let paper_id = parse_id(&paper_id).ok_or_else(not_found)?;
    store.get_paper(paper_id).await?.ok_or_else(not_found)?;

    let solutions = store.solutions_for_paper(paper_id).await?;

    Ok(Json(PaperStats {
        paper_id,
        summary: grading::summarize(&solutions),
        solutions,
    }))
}

/// One attempt with its paper, for answer review.
/// Visible to the student who made it and to staff.
pub async fn get_solution(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<SolutionReview>, AppError> {
    let not_found = || AppError::NotFound("Solution not found".to_string());
    let id = parse_id(&id).ok_or_else(not_found)?;
    let solution = store.get_solution(id).await?.ok_or_else(not_found)?;

    if !claims.role.is_staff() && claims.user_id()? != solution.student_id {
        return Err(AppError::Forbidden(
            "You can only review your own attempts".to_string(),
        ));
    }

    let paper = store.get_paper(solution.paper_id).await?;

    Ok(Json(SolutionReview { solution, paper }))
}

/// The calling student's attempts, newest first.
pub async fn my_solutions(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Solution>>, AppError> {
    let student_id = claims.user_id()?;
    Ok(Json(store.solutions_for_student(student_id).await?))
}
