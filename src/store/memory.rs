// src/store/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;
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
    store::{DUPLICATE_EMAIL, Store},
};

#[derive(Default)]
struct Collections {
    students: Vec<Student>,
    teachers: Vec<Teacher>,
    papers: Vec<QuestionPaper>,
    solutions: Vec<Solution>,
    videos: Vec<Video>,
}

impl Collections {
    fn email_taken(&self, email: &str) -> bool {
        self.students.iter().any(|s| s.email == email)
            || self.teachers.iter().any(|t| t.email == email)
    }
}

/// In-process store used by tests and `DATABASE_URL=memory`.
///
/// Inserts take the write lock for the duplicate check and the insert, so
/// two registrations with the same email cannot both succeed.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, by a timestamp key.
fn newest_first<T: Clone, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut out: Vec<T> = items.collect();
    out.reverse();
    out.sort_by(|a, b| key(b).cmp(&key(a)));
    out
}

#[async_trait]
impl Store for MemoryStore {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.inner.read().await.email_taken(email))
    }

    async fn insert_student(&self, student: Student) -> Result<Student, AppError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&student.email) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        inner.students.push(student.clone());
        Ok(student)
    }

    async fn insert_teacher(&self, teacher: Teacher) -> Result<Teacher, AppError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&teacher.email) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        inner.teachers.push(teacher.clone());
        Ok(teacher)
    }

    async fn find_account(
        &self,
        email: &str,
        role: Option<Role>,
    ) -> Result<Option<Account>, AppError> {
        let inner = self.inner.read().await;
        let student = || {
            inner
                .students
                .iter()
                .find(|s| s.email == email)
                .cloned()
                .map(Account::Student)
        };
        let teacher = || {
            inner
                .teachers
                .iter()
                .find(|t| t.email == email)
                .cloned()
                .map(Account::Teacher)
        };

        Ok(match role {
            Some(Role::Student) => student(),
            Some(Role::Teacher) => teacher(),
            Some(Role::Admin) => None,
            None => student().or_else(teacher),
        })
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.students.iter().find(|s| s.id == id).cloned())
    }

    async fn get_teacher(&self, id: Uuid) -> Result<Option<Teacher>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.teachers.iter().find(|t| t.id == id).cloned())
    }

    async fn update_password(
        &self,
        role: Role,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let slot = match role {
            Role::Student => inner
                .students
                .iter_mut()
                .find(|s| s.email == email)
                .map(|s| &mut s.password),
            Role::Teacher => inner
                .teachers
                .iter_mut()
                .find(|t| t.email == email)
                .map(|t| &mut t.password),
            Role::Admin => None,
        };

        match slot {
            Some(password) => {
                *password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_paper(&self, paper: QuestionPaper) -> Result<QuestionPaper, AppError> {
        self.inner.write().await.papers.push(paper.clone());
        Ok(paper)
    }

    async fn list_papers(&self, filter: &PaperFilter) -> Result<Vec<QuestionPaper>, AppError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner.papers.iter().filter(|p| filter.matches(p)).cloned(),
            |p| p.created_at,
        ))
    }

    async fn get_paper(&self, id: Uuid) -> Result<Option<QuestionPaper>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.papers.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_solution(&self, solution: Solution) -> Result<Solution, AppError> {
        self.inner.write().await.solutions.push(solution.clone());
        Ok(solution)
    }

    async fn get_solution(&self, id: Uuid) -> Result<Option<Solution>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.solutions.iter().find(|s| s.id == id).cloned())
    }

    async fn solutions_for_paper(&self, paper_id: Uuid) -> Result<Vec<Solution>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .solutions
            .iter()
            .filter(|s| s.paper_id == paper_id)
            .cloned()
            .collect())
    }

    async fn solutions_for_student(&self, student_id: Uuid) -> Result<Vec<Solution>, AppError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner
                .solutions
                .iter()
                .filter(|s| s.student_id == student_id)
                .cloned(),
            |s| s.submitted_at,
        ))
    }

    async fn insert_video(&self, video: Video) -> Result<Video, AppError> {
        self.inner.write().await.videos.push(video.clone());
        Ok(video)
    }

    async fn list_videos(&self, subject: Option<&str>) -> Result<Vec<Video>, AppError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner
                .videos
                .iter()
                .filter(|v| subject.is_none_or(|subject| v.subject == subject))
                .cloned(),
            |v| v.uploaded_at,
        ))
    }

    async fn counts(&self) -> Result<CollectionCounts, AppError> {
        let inner = self.inner.read().await;
        Ok(CollectionCounts {
            students: inner.students.len() as i64,
            teachers: inner.teachers.len() as i64,
            papers: inner.papers.len() as i64,
            solutions: inner.solutions.len() as i64,
            videos: inner.videos.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn student(email: &str) -> Student {
        Student {
            id: Uuid::new_v4(),
            full_name: "Sam".into(),
            email: email.into(),
            password: "hash".into(),
            roll_number: "42".into(),
            class: "10A".into(),
            stream: None,
            year: None,
            student_type: None,
            subject: "Science".into(),
            created_at: Utc::now(),
        }
    }

    fn teacher(email: &str) -> Teacher {
        Teacher {
            id: Uuid::new_v4(),
            full_name: "Ada".into(),
            email: email.into(),
            password: "hash".into(),
            subject: "Maths".into(),
            qualification: "PhD".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_across_roles() {
        let store = MemoryStore::new();
        store.insert_student(student("a@b.io")).await.unwrap();

        let err = store.insert_teacher(teacher("a@b.io")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == DUPLICATE_EMAIL));
        assert_eq!(store.counts().await.unwrap().teachers, 0);
    }

    #[tokio::test]
    async fn find_account_prefers_requested_role() {
        let store = MemoryStore::new();
        store.insert_teacher(teacher("t@b.io")).await.unwrap();

        let found = store.find_account("t@b.io", None).await.unwrap();
        assert!(matches!(found, Some(Account::Teacher(_))));
        let wrong_role = store.find_account("t@b.io", Some(Role::Student)).await.unwrap();
        assert!(wrong_role.is_none());
    }

    #[tokio::test]
    async fn update_password_reports_missing_accounts() {
        let store = MemoryStore::new();
        store.insert_student(student("s@b.io")).await.unwrap();

        assert!(store.update_password(Role::Student, "s@b.io", "new").await.unwrap());
        assert!(!store.update_password(Role::Teacher, "s@b.io", "new").await.unwrap());

        let Some(Account::Student(s)) = store.find_account("s@b.io", None).await.unwrap() else {
            panic!("student should exist");
        };
        assert_eq!(s.password, "new");
    }

    #[tokio::test]
    async fn videos_are_listed_newest_first() {
        let store = MemoryStore::new();
        let teacher_id = Uuid::new_v4();
        let now = Utc::now();
        for (offset, subject) in [(0, "Maths"), (5, "Physics"), (10, "Maths")] {
            store
                .insert_video(Video {
                    id: Uuid::new_v4(),
                    title: format!("{} {}", subject, offset),
                    link: "https://youtu.be/x".into(),
                    subject: subject.into(),
                    teacher_id,
                    uploaded_at: now + Duration::seconds(offset),
                })
                .await
                .unwrap();
        }

        let maths = store.list_videos(Some("Maths")).await.unwrap();
        assert_eq!(maths.len(), 2);
        assert_eq!(maths[0].title, "Maths 10");
        assert_eq!(store.list_videos(None).await.unwrap().len(), 3);
    }
}
