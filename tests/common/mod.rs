// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use quested::{
    config::{Config, MEMORY_DATABASE_URL},
    routes,
    state::AppState,
    store::{DynStore, MemoryStore, PgStore},
};
use sqlx::postgres::PgPoolOptions;
use serde_json::{Value, json};

pub const ADMIN_EMAIL: &str = "admin@quested.io";
pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const PASSWORD: &str = "password123";

fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        cookie_secure: false,
        bind_addr: ([127, 0, 0, 1], 0).into(),
        log_dir: "logs".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
    }
}

/// Spawns the app on a random port with a fresh in-memory store.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app() -> String {
    serve(Arc::new(MemoryStore::new()), test_config(MEMORY_DATABASE_URL)).await
}

/// Connects to the Postgres named by DATABASE_URL and runs migrations.
/// Returns None when no database is configured, so callers can skip.
pub async fn pg_store() -> Option<PgStore> {
    let database_url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty() && url != MEMORY_DATABASE_URL)?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

/// Like `spawn_app`, but backed by Postgres. None without DATABASE_URL.
pub async fn spawn_pg_app() -> Option<String> {
    let store = pg_store().await?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();
    Some(serve(Arc::new(store), test_config(&database_url)).await)
}

async fn serve(store: DynStore, config: Config) -> String {
    let state = AppState { store, config };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// A client that keeps the session cookie, like a browser.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@quested.io", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

pub async fn register_student(client: &reqwest::Client, address: &str, email: &str) -> Value {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "userType": "student",
            "fullName": "Sam Student",
            "email": email,
            "password": PASSWORD,
            "rollNumber": "17",
            "class": "10A",
            "studentSubject": "Science"
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

pub async fn register_teacher(client: &reqwest::Client, address: &str, email: &str) -> Value {
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
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

/// Logs `client` in; the cookie lands in its store.
pub async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> Value {
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

/// Registers and logs in a fresh teacher.
pub async fn teacher_session(address: &str) -> reqwest::Client {
    let client = browser();
    let email = unique_email("teacher");
    register_teacher(&client, address, &email).await;
    login(&client, address, &email, PASSWORD).await;
    client
}

/// Registers and logs in a fresh student. Returns the client and the id.
pub async fn student_session(address: &str) -> (reqwest::Client, String) {
    let client = browser();
    let email = unique_email("student");
    register_student(&client, address, &email).await;
    let body = login(&client, address, &email, PASSWORD).await;
    let id = body["userId"].as_str().unwrap().to_string();
    (client, id)
}

/// Body of a two-question paper worth 5 + 3 marks.
pub fn sample_paper() -> Value {
    json!({
        "title": "Unit test 1",
        "subject": "Maths",
        "classStream": "10A",
        "totalMarks": 8,
        "timeLimit": 10,
        "questions": [
            {
                "question": "2 + 2 = ?",
                "kind": "mcq",
                "options": ["3", "4", "5", "6"],
                "answer": "4",
                "marks": 5
            },
            {
                "question": "Capital of France?",
                "options": ["Paris", "Rome", "Berlin", "Madrid"],
                "answer": "Paris",
                "marks": 3
            }
        ]
    })
}

/// Publishes `sample_paper` as a teacher and returns the stored paper.
pub async fn create_paper(teacher: &reqwest::Client, address: &str) -> Value {
    let response = teacher
        .post(format!("{}/api/papers", address))
        .json(&sample_paper())
        .send()
        .await
        .expect("Create paper failed");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}
