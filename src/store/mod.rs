// src/store/mod.rs

//! Persistence for the five collections.
//!
//! Handlers talk to a [`Store`] trait object so the same router runs on
//! PostgreSQL in production and on the in-process store in tests.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        paper::{PaperFilter, QuestionPaper},
        solution::Solution,
        stats::CollectionCounts,
        user::{Account, Role, Student, Teacher},
        video::Video,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle stored in the application state.
pub type DynStore = Arc<dyn Store>;

/// Message returned when an email is already registered.
pub const DUPLICATE_EMAIL: &str = "Email already exists";

#[async_trait]
pub trait Store: Send + Sync {
    /// Whether any student or teacher uses `email`.
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Inserts a student. Fails with `Conflict` when the email is taken.
    async fn insert_student(&self, student: Student) -> Result<Student, AppError>;

    /// Inserts a teacher. Fails with `Conflict` when the email is taken.
    async fn insert_teacher(&self, teacher: Teacher) -> Result<Teacher, AppError>;

    /// Finds a student or teacher by email. With `role` set only that
    /// collection is searched; otherwise students are searched first.
    async fn find_account(&self, email: &str, role: Option<Role>)
    -> Result<Option<Account>, AppError>;

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>, AppError>;

    async fn get_teacher(&self, id: Uuid) -> Result<Option<Teacher>, AppError>;

    /// Replaces the password hash of the account with `email` in the
    /// collection of `role`. Returns false when no such account exists.
    async fn update_password(
        &self,
        role: Role,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, AppError>;

    async fn insert_paper(&self, paper: QuestionPaper) -> Result<QuestionPaper, AppError>;

    /// Papers matching `filter`, newest first.
    async fn list_papers(&self, filter: &PaperFilter) -> Result<Vec<QuestionPaper>, AppError>;

    async fn get_paper(&self, id: Uuid) -> Result<Option<QuestionPaper>, AppError>;

    async fn insert_solution(&self, solution: Solution) -> Result<Solution, AppError>;

    async fn get_solution(&self, id: Uuid) -> Result<Option<Solution>, AppError>;

    /// All attempts at one paper, in submission order.
    async fn solutions_for_paper(&self, paper_id: Uuid) -> Result<Vec<Solution>, AppError>;

    /// All attempts by one student, newest first.
    async fn solutions_for_student(&self, student_id: Uuid) -> Result<Vec<Solution>, AppError>;

    async fn insert_video(&self, video: Video) -> Result<Video, AppError>;

    /// Videos, optionally for one subject, newest first.
    async fn list_videos(&self, subject: Option<&str>) -> Result<Vec<Video>, AppError>;

    async fn counts(&self) -> Result<CollectionCounts, AppError>;
}
