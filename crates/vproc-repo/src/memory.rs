//! In-memory job repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use vproc_models::{Job, JobId, JobStatus, NewJob};

use crate::error::{RepoError, RepoResult};
use crate::repository::JobRepository;

/// Thread-safe in-memory [`JobRepository`] adapter.
///
/// Identities are assigned from a process-wide sequence. Locks are never
/// held across await points.
#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<i64, Job>>,
    next_id: AtomicI64,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: NewJob) -> RepoResult<Job> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();
        let row = Job {
            id: JobId::new(id),
            user_id: job.user_id,
            filename: job.filename,
            stored_filename: job.stored_filename,
            status: JobStatus::Pending,
            message: String::new(),
            zip_path: None,
            frame_count: None,
            created_at: now,
            updated_at: now,
        };

        let mut jobs = self
            .jobs
            .write()
            .map_err(|e| RepoError::CreateFailed(e.to_string()))?;
        jobs.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, job: &Job) -> RepoResult<()> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|e| RepoError::UpdateFailed(e.to_string()))?;
        match jobs.get_mut(&job.id.as_i64()) {
            Some(stored) => {
                // Status is monotonic: Pending → Processing → terminal.
                if stored.status != job.status && !stored.status.can_transition_to(job.status) {
                    return Err(RepoError::UpdateFailed(format!(
                        "illegal status transition {} -> {}",
                        stored.status, job.status
                    )));
                }
                let mut row = job.clone();
                row.updated_at = Utc::now();
                *stored = row;
                Ok(())
            }
            None => Err(RepoError::NotFound(job.id)),
        }
    }

    async fn get(&self, id: JobId) -> RepoResult<Job> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| RepoError::QueryFailed(e.to_string()))?;
        jobs.get(&id.as_i64())
            .cloned()
            .ok_or(RepoError::NotFound(id))
    }

    async fn find_by_owner(&self, user_id: i64) -> RepoResult<Vec<Job>> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| RepoError::QueryFailed(e.to_string()))?;
        let mut owned: Vec<Job> = jobs
            .values()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job(user_id: i64, filename: &str) -> NewJob {
        NewJob {
            user_id,
            filename: filename.to_string(),
            stored_filename: format!("20260807_120000_1_{filename}"),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_pending_status() {
        let repo = InMemoryJobRepository::new();

        let first = repo.create(new_job(1, "a.mp4")).await.unwrap();
        let second = repo.create(new_job(1, "b.mp4")).await.unwrap();

        assert_eq!(first.id, JobId::new(1));
        assert_eq!(second.id, JobId::new(2));
        assert_eq!(first.status, JobStatus::Pending);
        assert!(first.zip_path.is_none());
    }

    #[tokio::test]
    async fn update_overwrites_the_row() {
        let repo = InMemoryJobRepository::new();
        let mut job = repo.create(new_job(1, "a.mp4")).await.unwrap();

        job.status = JobStatus::Processing;
        repo.update(&job).await.unwrap();

        job.status = JobStatus::Completed;
        job.zip_path = Some("frames_20260807_120000_1.zip".to_string());
        job.frame_count = Some(12);
        repo.update(&job).await.unwrap();

        let stored = repo.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.frame_count, Some(12));
        assert!(stored.updated_at >= job.created_at);
    }

    #[tokio::test]
    async fn update_rejects_leaving_a_terminal_state() {
        let repo = InMemoryJobRepository::new();
        let mut job = repo.create(new_job(1, "a.mp4")).await.unwrap();

        job.status = JobStatus::Processing;
        repo.update(&job).await.unwrap();
        job.status = JobStatus::Failed;
        repo.update(&job).await.unwrap();

        job.status = JobStatus::Processing;
        assert!(matches!(
            repo.update(&job).await,
            Err(RepoError::UpdateFailed(_))
        ));
        assert_eq!(
            repo.get(job.id).await.unwrap().status,
            JobStatus::Failed
        );
    }

    #[tokio::test]
    async fn update_of_unknown_job_is_not_found() {
        let repo = InMemoryJobRepository::new();
        let mut job = repo.create(new_job(1, "a.mp4")).await.unwrap();
        job.id = JobId::new(999);

        assert!(matches!(
            repo.update(&job).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_by_owner_filters_and_orders_newest_first() {
        let repo = InMemoryJobRepository::new();
        repo.create(new_job(1, "a.mp4")).await.unwrap();
        repo.create(new_job(2, "b.mp4")).await.unwrap();
        repo.create(new_job(1, "c.mp4")).await.unwrap();

        let owned = repo.find_by_owner(1).await.unwrap();
        let names: Vec<_> = owned.iter().map(|j| j.filename.as_str()).collect();
        assert_eq!(names, ["c.mp4", "a.mp4"]);
    }
}
