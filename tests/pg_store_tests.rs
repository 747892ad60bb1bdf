// tests/pg_store_tests.rs
//
// Runs against the Postgres named by DATABASE_URL. Every test returns early
// when no database is configured.

mod common;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use common::*;
use quested::{
    error::AppError,
    models::{
        paper::{PaperFilter, Question, QuestionKind, QuestionPaper},
        solution::{AnsweredQuestion, Solution, SubmissionStatus},
        user::{Role, Student},
    },
    store::{DUPLICATE_EMAIL, Store},
};
use serde_json::{Value, json};
use uuid::Uuid;

macro_rules! require_db {
    ($setup:expr) => {
        match $setup.await {
            Some(value) => value,
            None => {
                eprintln!("DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}

// Postgres keeps microseconds
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn student(email: &str) -> Student {
    Student {
        id: Uuid::new_v4(),
        full_name: "Sam".into(),
        email: email.into(),
        password: "hash".into(),
        roll_number: "42".into(),
        class: "10A".into(),
        stream: Some("Science".into()),
        year: None,
        student_type: None,
        subject: "Physics".into(),
        created_at: now(),
    }
}

fn paper(class_stream: &str) -> QuestionPaper {
    QuestionPaper {
        id: Uuid::new_v4(),
        title: "Gas laws".into(),
        subject: "Physics".into(),
        class_stream: class_stream.into(),
        total_marks: 6,
        time_limit: 15,
        questions: vec![
            Question {
                id: Uuid::new_v4(),
                question: "Unit of pressure?".into(),
                kind: QuestionKind::Mcq,
                options: vec!["Pa".into(), "N".into(), "J".into(), "W".into()],
                answer: "Pa".into(),
                marks: 2,
            },
            Question {
                id: Uuid::new_v4(),
                question: "Which law relates pressure & volume?".into(),
                kind: QuestionKind::Descriptive,
                options: vec![],
                answer: "Boyle & Mariotte".into(),
                marks: 4,
            },
        ],
        created_at: now(),
    }
}

#[tokio::test]
async fn duplicate_student_email_is_a_conflict() {
    let store = require_db!(pg_store());
    let email = unique_email("pg_dup");

    store.insert_student(student(&email)).await.unwrap();
    let err = store.insert_student(student(&email)).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(msg) if msg == DUPLICATE_EMAIL));
    assert!(store.email_exists(&email).await.unwrap());
}

#[tokio::test]
async fn accounts_are_found_and_passwords_updated() {
    let store = require_db!(pg_store());
    let email = unique_email("pg_account");
    let inserted = store.insert_student(student(&email)).await.unwrap();

    let found = store.find_account(&email, None).await.unwrap().unwrap();
    assert_eq!(found.id(), inserted.id);
    assert!(store.find_account(&email, Some(Role::Teacher)).await.unwrap().is_none());

    assert!(store.update_password(Role::Student, &email, "new-hash").await.unwrap());
    let reloaded = store.get_student(inserted.id).await.unwrap().unwrap();
    assert_eq!(reloaded.password, "new-hash");
    assert_eq!(reloaded.class_stream(), "Science");
}

#[tokio::test]
async fn paper_questions_round_trip_through_jsonb() {
    let store = require_db!(pg_store());
    let class_stream = format!("pg-{}", Uuid::new_v4());
    let original = paper(&class_stream);

    store.insert_paper(original.clone()).await.unwrap();
    let stored = store.get_paper(original.id).await.unwrap().unwrap();
    assert_eq!(stored, original);

    let filter = PaperFilter {
        class_stream: Some(class_stream),
        subject: None,
    };
    let listed = store.list_papers(&filter).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, original.id);

    let unfiltered = store.list_papers(&PaperFilter::default()).await.unwrap();
    assert!(unfiltered.iter().any(|p| p.id == original.id));
}

#[tokio::test]
async fn solution_status_round_trips() {
    let store = require_db!(pg_store());
    let owner = store
        .insert_student(student(&unique_email("pg_solution")))
        .await
        .unwrap();
    let exam = paper("10A");
    store.insert_paper(exam.clone()).await.unwrap();

    let started = now() - Duration::minutes(40);
    let solution = Solution {
        id: Uuid::new_v4(),
        student_id: owner.id,
        paper_id: exam.id,
        title: exam.title.clone(),
        subject: exam.subject.clone(),
        time_limit: exam.time_limit,
        total_marks: exam.total_marks,
        class_stream: owner.class_stream().to_string(),
        questions: vec![AnsweredQuestion {
            question_id: exam.questions[0].id,
            question: exam.questions[0].question.clone(),
            selected_option: Some("Pa".into()),
            correct_option: "Pa".into(),
            marks: 2,
            awarded: 2,
            is_correct: true,
        }],
        started_at: started,
        completed_at: started + Duration::minutes(30),
        submitted_at: now(),
        total_score: 2,
        status: SubmissionStatus::Timeout,
    };

    store.insert_solution(solution.clone()).await.unwrap();

    let stored = store.get_solution(solution.id).await.unwrap().unwrap();
    assert_eq!(stored, solution);
    assert_eq!(stored.status, SubmissionStatus::Timeout);

    let for_paper = store.solutions_for_paper(exam.id).await.unwrap();
    assert_eq!(for_paper, vec![solution.clone()]);
    let for_student = store.solutions_for_student(owner.id).await.unwrap();
    assert_eq!(for_student.len(), 1);

    let counts = store.counts().await.unwrap();
    assert!(counts.students >= 1 && counts.papers >= 1 && counts.solutions >= 1);
}

#[tokio::test]
async fn http_flow_on_postgres() {
    let address = require_db!(spawn_pg_app());
    let client = browser();
    let email = unique_email("pg_http");

    register_student(&client, &address, &email).await;
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "userType": "teacher",
            "fullName": "Tess Teacher",
            "email": email,
            "password": PASSWORD,
            "subject": "Maths",
            "qualification": "MSc"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let teacher = teacher_session(&address).await;
    let paper = create_paper(&teacher, &address).await;
    let fetched: Value = teacher
        .get(format!("{}/api/papers/{}", address, paper["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["questions"], paper["questions"]);

    let (student, student_id) = student_session(&address).await;
    let started = Utc::now() - Duration::minutes(30);
    let response = student
        .post(format!("{}/api/exams/submit", address))
        .json(&json!({
            "studentId": student_id,
            "paperId": paper["id"],
            "questions": [{ "questionId": paper["questions"][0]["id"], "selectedOption": "4" }],
            "startedAt": started,
            "completedAt": started + Duration::minutes(25),
            "status": "completed"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let solution: Value = response.json().await.unwrap();

    let review: Value = student
        .get(format!(
            "{}/api/exams/solutions/{}",
            address,
            solution["id"].as_str().unwrap()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(review["solution"]["status"], "timeout");
    assert_eq!(review["solution"]["totalScore"], 5);
}
