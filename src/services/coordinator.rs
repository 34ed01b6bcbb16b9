use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::entities::analysis_request::RequestStatus;
use crate::error::TaskError;
use crate::models::algorithms::find_algorithm;
use crate::models::session::SessionTracker;
use crate::repository;
use crate::services::analysis_client::{AnalysisClient, RemoteStatus};
use crate::services::notifier::{notify_document, notify_message, Notifier};
use crate::utils::file_validator::validate_file;

/// What the presentation layer hands over: a saved upload plus the operator's
/// choice. Everything else the lifecycle needs is derived from this.
#[derive(Debug, Clone)]
pub struct Submission {
    pub user_id: i64,
    pub username: Option<String>,
    pub file_path: PathBuf,
    pub file_size: u64,
    pub algorithm_id: String,
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub request_id: Uuid,
    pub task_id: String,
}

/// Drives one submission through
/// validate -> submit -> poll -> deliver. Cheap to clone: each accepted
/// submission gets its own spawned monitor task, and tasks share nothing but
/// the database handle and the client/notifier seams.
#[derive(Clone)]
pub struct Coordinator {
    db: Arc<DatabaseConnection>,
    client: Arc<dyn AnalysisClient>,
    notifier: Arc<dyn Notifier>,
    sessions: Arc<SessionTracker>,
    max_file_size: u64,
    poll_interval: Duration,
    poll_max_attempts: u32,
}

impl Coordinator {
    pub fn new(
        db: Arc<DatabaseConnection>,
        client: Arc<dyn AnalysisClient>,
        notifier: Arc<dyn Notifier>,
        max_file_size: u64,
        poll_interval: Duration,
        poll_max_attempts: u32,
    ) -> Self {
        Self {
            db,
            client,
            notifier,
            sessions: Arc::new(SessionTracker::new()),
            max_file_size,
            poll_interval,
            poll_max_attempts,
        }
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Validates and submits synchronously, then spawns the polling monitor.
    /// Validation failures leave no trace in the store; a remote submission
    /// failure leaves the request in ERROR.
    pub async fn submit(&self, submission: Submission) -> Result<SubmissionReceipt, TaskError> {
        if !self.sessions.try_begin(submission.user_id) {
            remove_quietly(&submission.file_path).await;
            return Err(TaskError::Busy);
        }

        match self.submit_inner(&submission).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                remove_quietly(&submission.file_path).await;
                self.client.close().await;
                self.sessions.finish(submission.user_id);
                Err(e)
            }
        }
    }

    async fn submit_inner(&self, submission: &Submission) -> Result<SubmissionReceipt, TaskError> {
        validate_file(&submission.file_path, submission.file_size, self.max_file_size)
            .map_err(TaskError::Validation)?;

        let algorithm = find_algorithm(&submission.algorithm_id).ok_or_else(|| {
            TaskError::Validation(format!("Unknown algorithm '{}'", submission.algorithm_id))
        })?;

        repository::get_or_create_user(
            &self.db,
            submission.user_id,
            submission.username.as_deref(),
        )
        .await?;

        let request = repository::create_analysis_request(
            &self.db,
            submission.user_id,
            &submission.file_path.to_string_lossy(),
            submission.file_size as i64,
            algorithm.id,
        )
        .await?;
        self.sessions.attach_request(submission.user_id, request.id);

        let task_id = match self
            .client
            .start_analysis(algorithm.id, &submission.file_path, submission.user_id)
            .await
        {
            Ok(task_id) => task_id,
            Err(e) => {
                self.force_error(request.id).await;
                return Err(TaskError::Transport(e));
            }
        };

        // Losing this write is tolerable: the poll loop persists the mapped
        // status on every iteration anyway.
        if let Err(e) = repository::update_status(&self.db, request.id, RequestStatus::Processing).await
        {
            eprintln!("Coordinator | request {} | status write failed: {}", request.id, e);
        }

        println!(
            "Coordinator | request {} submitted as {} for user {}",
            request.id, task_id, submission.user_id
        );

        let monitor = self.clone();
        let user_id = submission.user_id;
        let request_id = request.id;
        let file_path = submission.file_path.clone();
        let algorithm_name = algorithm.name;
        let monitor_task_id = task_id.clone();
        tokio::spawn(async move {
            monitor
                .monitor(user_id, request_id, monitor_task_id, file_path, algorithm_name)
                .await;
        });

        Ok(SubmissionReceipt {
            request_id: request.id,
            task_id,
        })
    }

    /// Polls until a terminal outcome, delivers, then releases the client and
    /// the user's session slot. Never returns an error to anyone; terminal
    /// outcomes are reported through the notifier.
    async fn monitor(
        &self,
        user_id: i64,
        request_id: Uuid,
        task_id: String,
        file_path: PathBuf,
        algorithm_name: &'static str,
    ) {
        let outcome = self
            .poll_and_deliver(user_id, request_id, &task_id, &file_path, algorithm_name)
            .await;

        match outcome {
            Ok(()) => {
                println!("Coordinator | request {} | result delivered", request_id);
            }
            Err(TaskError::Timeout) => {
                notify_message(
                    self.notifier.as_ref(),
                    user_id,
                    "Timed out waiting for the analysis result. Please submit the file again.",
                )
                .await;
            }
            Err(TaskError::Transport(msg)) => {
                notify_message(
                    self.notifier.as_ref(),
                    user_id,
                    &format!("Analysis failed: {}. Please try again.", msg),
                )
                .await;
            }
            Err(TaskError::Delivery(msg)) => {
                // The result is committed; only the hand-off failed.
                eprintln!(
                    "Coordinator | request {} | delivery failed, needs manual follow-up: {}",
                    request_id, msg
                );
            }
            Err(e) => {
                eprintln!("Coordinator | request {} | {}", request_id, e);
                notify_message(
                    self.notifier.as_ref(),
                    user_id,
                    "Something went wrong while processing your file. Please try again.",
                )
                .await;
            }
        }

        self.client.close().await;
        self.sessions.finish(user_id);
    }

    async fn poll_and_deliver(
        &self,
        user_id: i64,
        request_id: Uuid,
        task_id: &str,
        file_path: &Path,
        algorithm_name: &'static str,
    ) -> Result<(), TaskError> {
        for _attempt in 1..=self.poll_max_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let remote = match self.client.check_status(task_id).await {
                Ok(remote) => remote,
                Err(e) => {
                    self.force_error(request_id).await;
                    return Err(TaskError::Transport(e));
                }
            };

            // Once a terminal decision is reached the loop exits, so a stale
            // replica answering "processing" later cannot revert it.
            match remote {
                RemoteStatus::Completed => {
                    // COMPLETED is persisted together with the result row.
                    return self
                        .deliver(user_id, request_id, task_id, file_path, algorithm_name)
                        .await;
                }
                RemoteStatus::Failed => {
                    self.force_error(request_id).await;
                    return Err(TaskError::Transport(
                        "the analysis ended with an error".to_string(),
                    ));
                }
                other => {
                    if let Err(e) =
                        repository::update_status(&self.db, request_id, other.to_request_status())
                            .await
                    {
                        eprintln!(
                            "Coordinator | request {} | status write failed: {}",
                            request_id, e
                        );
                    }
                }
            }
        }

        self.force_error(request_id).await;
        Err(TaskError::Timeout)
    }

    async fn deliver(
        &self,
        user_id: i64,
        request_id: Uuid,
        task_id: &str,
        file_path: &Path,
        algorithm_name: &'static str,
    ) -> Result<(), TaskError> {
        let artifact = match self.client.get_result(task_id).await {
            Ok(path) => path,
            Err(e) => {
                // COMPLETED without a result row is not allowed to stand.
                self.force_error(request_id).await;
                return Err(TaskError::Transport(e));
            }
        };

        let metadata = serde_json::json!({
            "task_id": task_id,
            "algorithm": algorithm_name,
            "artifact_path": artifact.to_string_lossy(),
        });

        if let Err(e) = repository::complete_with_result(&self.db, request_id, metadata).await {
            self.force_error(request_id).await;
            return Err(TaskError::Persistence(e));
        }

        let caption = format!("Analysis result\nAlgorithm: {}", algorithm_name);
        if !notify_document(self.notifier.as_ref(), user_id, &artifact, &caption).await {
            // Keep both files around so the result can be re-sent later.
            return Err(TaskError::Delivery(format!(
                "artifact kept at {}",
                artifact.display()
            )));
        }

        notify_message(self.notifier.as_ref(), user_id, "Result delivered successfully.").await;

        remove_quietly(file_path).await;
        remove_quietly(&artifact).await;
        Ok(())
    }

    /// Best-effort transition to ERROR; a failure here is logged, not raised,
    /// so the caller can still report the primary fault.
    async fn force_error(&self, request_id: Uuid) {
        if let Err(e) = repository::update_status(&self.db, request_id, RequestStatus::Error).await {
            eprintln!(
                "Coordinator | request {} | could not record ERROR: {}",
                request_id, e
            );
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            eprintln!("Coordinator | could not remove {}: {}", path.display(), e);
        }
    }
}
