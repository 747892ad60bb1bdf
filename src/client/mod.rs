// src/client/mod.rs

//! HTTP client for the exam API, used by exam front-ends and the
//! integration tests. It keeps the session cookie between calls.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    exam::session::{ExamSession, StartTimeStore},
    models::{
        paper::PublicPaper,
        solution::{PaperStats, Solution, SubmitExamRequest},
        user::{LoginResponse, Role, VerifyResponse},
    },
};

#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, decode).
    Http(reqwest::Error),
    /// The server answered with an error status.
    Api { status: StatusCode, message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(err) => write!(f, "request failed: {}", err),
            ClientError::Api { status, message } => write!(f, "{}: {}", status, message),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(err) => Some(err),
            ClientError::Api { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(err) => err.status(),
            ClientError::Api { status, .. } => Some(*status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExamClient {
    http: Client,
    base_url: String,
}

impl ExamClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<LoginResponse, ClientError> {
        let body = json!({ "email": email, "password": password, "role": role });
        self.post("/auth/login", &body).await
    }

    pub async fn verify(&self) -> Result<VerifyResponse, ClientError> {
        self.get("/auth/verify").await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: Value = self.post("/auth/logout", &json!({})).await?;
        Ok(())
    }

    /// Fetches a paper in its student form (no answer key).
    pub async fn fetch_paper(&self, paper_id: Uuid) -> Result<PublicPaper, ClientError> {
        self.get(&format!("/papers/{}", paper_id)).await
    }

    pub async fn submit(&self, payload: &SubmitExamRequest) -> Result<Solution, ClientError> {
        self.post("/exams/submit", payload).await
    }

    pub async fn exam_stats(&self, paper_id: Uuid) -> Result<PaperStats, ClientError> {
        self.get(&format!("/exams/stats/{}", paper_id)).await
    }

    /// Sends a payload produced by `session` and reports the outcome back
    /// to it. On failure the session is active again; nothing is retried.
    pub async fn submit_session(
        &self,
        session: &mut ExamSession,
        payload: &SubmitExamRequest,
        storage: &mut (dyn StartTimeStore + Send),
    ) -> Result<Solution, ClientError> {
        match self.submit(payload).await {
            Ok(solution) => {
                session.submission_succeeded(storage);
                Ok(solution)
            }
            Err(err) => {
                tracing::warn!("Exam submission failed: {}", err);
                session.submission_failed();
                Err(err)
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Request failed")
            .to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };

    Err(ClientError::Api { status, message })
}
