// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        paper::{PaperFilter, Question, QuestionPaper},
        solution::{AnsweredQuestion, Solution, SubmissionStatus},
        stats::CollectionCounts,
        user::{Account, Role, Student, Teacher},
        video::Video,
    },
    store::{DUPLICATE_EMAIL, Store},
};

const STUDENT_COLUMNS: &str = "id, full_name, email, password, roll_number, class, stream, year, \
                               student_type, subject, created_at";
const TEACHER_COLUMNS: &str = "id, full_name, email, password, subject, qualification, created_at";
const PAPER_COLUMNS: &str =
    "id, title, subject, class_stream, total_marks, time_limit, questions, created_at";
const SOLUTION_COLUMNS: &str = "id, student_id, paper_id, title, subject, time_limit, total_marks, \
                                class_stream, questions, started_at, completed_at, submitted_at, \
                                total_score, status";
const VIDEO_COLUMNS: &str = "id, title, link, subject, teacher_id, uploaded_at";

/// Row of the 'question_papers' table; questions live in a JSONB column.
#[derive(FromRow)]
struct PaperRow {
    id: Uuid,
    title: String,
    subject: String,
    class_stream: String,
    total_marks: i32,
    time_limit: i32,
    questions: Json<Vec<Question>>,
    created_at: DateTime<Utc>,
}

impl From<PaperRow> for QuestionPaper {
    fn from(row: PaperRow) -> Self {
        QuestionPaper {
            id: row.id,
            title: row.title,
            subject: row.subject,
            class_stream: row.class_stream,
            total_marks: row.total_marks,
            time_limit: row.time_limit,
            questions: row.questions.0,
            created_at: row.created_at,
        }
    }
}

/// Row of the 'solutions' table.
#[derive(FromRow)]
struct SolutionRow {
    id: Uuid,
    student_id: Uuid,
    paper_id: Uuid,
    title: String,
    subject: String,
    time_limit: i32,
    total_marks: i32,
    class_stream: String,
    questions: Json<Vec<AnsweredQuestion>>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    submitted_at: DateTime<Utc>,
    total_score: i32,
    status: String,
}

impl TryFrom<SolutionRow> for Solution {
    type Error = AppError;

    fn try_from(row: SolutionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<SubmissionStatus>()
            .map_err(AppError::InternalServerError)?;

        Ok(Solution {
            id: row.id,
            student_id: row.student_id,
            paper_id: row.paper_id,
            title: row.title,
            subject: row.subject,
            time_limit: row.time_limit,
            total_marks: row.total_marks,
            class_stream: row.class_stream,
            questions: row.questions.0,
            started_at: row.started_at,
            completed_at: row.completed_at,
            submitted_at: row.submitted_at,
            total_score: row.total_score,
            status,
        })
    }
}

/// Maps a unique violation on `email` to the duplicate-email conflict.
fn insert_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(DUPLICATE_EMAIL.to_string());
        }
    }
    tracing::error!("Insert failed: {:?}", err);
    AppError::from(err)
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_student(&self, email: &str) -> Result<Option<Student>, AppError> {
        let sql = format!("SELECT {} FROM students WHERE email = $1", STUDENT_COLUMNS);
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_teacher(&self, email: &str) -> Result<Option<Teacher>, AppError> {
        let sql = format!("SELECT {} FROM teachers WHERE email = $1", TEACHER_COLUMNS);
        Ok(sqlx::query_as::<_, Teacher>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn fetch_solutions(&self, sql: &str, id: Uuid) -> Result<Vec<Solution>, AppError> {
        sqlx::query_as::<_, SolutionRow>(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Solution::try_from)
            .collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM students WHERE email = $1)
                OR EXISTS (SELECT 1 FROM teachers WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_student(&self, student: Student) -> Result<Student, AppError> {
        sqlx::query(
            r#"
            INSERT INTO students
            (id, full_name, email, password, roll_number, class, stream, year, student_type, subject, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(student.id)
        .bind(&student.full_name)
        .bind(&student.email)
        .bind(&student.password)
        .bind(&student.roll_number)
        .bind(&student.class)
        .bind(&student.stream)
        .bind(&student.year)
        .bind(&student.student_type)
        .bind(&student.subject)
        .bind(student.created_at)
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(student)
    }

    async fn insert_teacher(&self, teacher: Teacher) -> Result<Teacher, AppError> {
        sqlx::query(
            r#"
            INSERT INTO teachers
            (id, full_name, email, password, subject, qualification, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(teacher.id)
        .bind(&teacher.full_name)
        .bind(&teacher.email)
        .bind(&teacher.password)
        .bind(&teacher.subject)
        .bind(&teacher.qualification)
        .bind(teacher.created_at)
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(teacher)
    }

    async fn find_account(
        &self,
        email: &str,
        role: Option<Role>,
    ) -> Result<Option<Account>, AppError> {
        match role {
            Some(Role::Student) => Ok(self.find_student(email).await?.map(Account::Student)),
            Some(Role::Teacher) => Ok(self.find_teacher(email).await?.map(Account::Teacher)),
            Some(Role::Admin) => Ok(None),
            None => {
                if let Some(student) = self.find_student(email).await? {
                    return Ok(Some(Account::Student(student)));
                }
                Ok(self.find_teacher(email).await?.map(Account::Teacher))
            }
        }
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let sql = format!("SELECT {} FROM students WHERE id = $1", STUDENT_COLUMNS);
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_teacher(&self, id: Uuid) -> Result<Option<Teacher>, AppError> {
        let sql = format!("SELECT {} FROM teachers WHERE id = $1", TEACHER_COLUMNS);
        Ok(sqlx::query_as::<_, Teacher>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_password(
        &self,
        role: Role,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let sql = match role {
            Role::Student => "UPDATE students SET password = $1 WHERE email = $2",
            Role::Teacher => "UPDATE teachers SET password = $1 WHERE email = $2",
            Role::Admin => return Ok(false),
        };

        let result = sqlx::query(sql)
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update password: {:?}", e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_paper(&self, paper: QuestionPaper) -> Result<QuestionPaper, AppError> {
        sqlx::query(
            r#"
            INSERT INTO question_papers
            (id, title, subject, class_stream, total_marks, time_limit, questions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(paper.id)
        .bind(&paper.title)
        .bind(&paper.subject)
        .bind(&paper.class_stream)
        .bind(paper.total_marks)
        .bind(paper.time_limit)
        .bind(Json(&paper.questions))
        .bind(paper.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create paper: {:?}", e);
            AppError::from(e)
        })?;

        Ok(paper)
    }

    async fn list_papers(&self, filter: &PaperFilter) -> Result<Vec<QuestionPaper>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM question_papers
            WHERE ($1::TEXT IS NULL OR class_stream = $1)
              AND ($2::TEXT IS NULL OR subject = $2)
            ORDER BY created_at DESC
            "#,
            PAPER_COLUMNS
        );

        let rows = sqlx::query_as::<_, PaperRow>(&sql)
            .bind(&filter.class_stream)
            .bind(&filter.subject)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(QuestionPaper::from).collect())
    }

    async fn get_paper(&self, id: Uuid) -> Result<Option<QuestionPaper>, AppError> {
        let sql = format!("SELECT {} FROM question_papers WHERE id = $1", PAPER_COLUMNS);
        let row = sqlx::query_as::<_, PaperRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(QuestionPaper::from))
    }

    async fn insert_solution(&self, solution: Solution) -> Result<Solution, AppError> {
        sqlx::query(
            r#"
            INSERT INTO solutions
            (id, student_id, paper_id, title, subject, time_limit, total_marks, class_stream,
             questions, started_at, completed_at, submitted_at, total_score, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(solution.id)
        .bind(solution.student_id)
        .bind(solution.paper_id)
        .bind(&solution.title)
        .bind(&solution.subject)
        .bind(solution.time_limit)
        .bind(solution.total_marks)
        .bind(&solution.class_stream)
        .bind(Json(&solution.questions))
        .bind(solution.started_at)
        .bind(solution.completed_at)
        .bind(solution.submitted_at)
        .bind(solution.total_score)
        .bind(solution.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store solution: {:?}", e);
            AppError::from(e)
        })?;

        Ok(solution)
    }

    async fn get_solution(&self, id: Uuid) -> Result<Option<Solution>, AppError> {
        let sql = format!("SELECT {} FROM solutions WHERE id = $1", SOLUTION_COLUMNS);
        sqlx::query_as::<_, SolutionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Solution::try_from)
            .transpose()
    }

    async fn solutions_for_paper(&self, paper_id: Uuid) -> Result<Vec<Solution>, AppError> {
        let sql = format!(
            "SELECT {} FROM solutions WHERE paper_id = $1 ORDER BY submitted_at",
            SOLUTION_COLUMNS
        );
        self.fetch_solutions(&sql, paper_id).await
    }

    async fn solutions_for_student(&self, student_id: Uuid) -> Result<Vec<Solution>, AppError> {
        let sql = format!(
            "SELECT {} FROM solutions WHERE student_id = $1 ORDER BY submitted_at DESC",
            SOLUTION_COLUMNS
        );
        self.fetch_solutions(&sql, student_id).await
    }

    async fn insert_video(&self, video: Video) -> Result<Video, AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (id, title, link, subject, teacher_id, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.link)
        .bind(&video.subject)
        .bind(video.teacher_id)
        .bind(video.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store video: {:?}", e);
            AppError::from(e)
        })?;

        Ok(video)
    }

    async fn list_videos(&self, subject: Option<&str>) -> Result<Vec<Video>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM videos
            WHERE ($1::TEXT IS NULL OR subject = $1)
            ORDER BY uploaded_at DESC
            "#,
            VIDEO_COLUMNS
        );

        Ok(sqlx::query_as::<_, Video>(&sql)
            .bind(subject)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn counts(&self) -> Result<CollectionCounts, AppError> {
        let counts = sqlx::query_as::<_, CollectionCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM students) AS students,
                (SELECT COUNT(*) FROM teachers) AS teachers,
                (SELECT COUNT(*) FROM question_papers) AS papers,
                (SELECT COUNT(*) FROM solutions) AS solutions,
                (SELECT COUNT(*) FROM videos) AS videos
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
