use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::entities::analysis_request::RequestStatus;
use crate::models::algorithms::find_algorithm;

/// Status vocabulary of the remote analysis service. Kept separate from the
/// stored [`RequestStatus`] and joined by one fixed mapping so the two cannot
/// drift apart silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl RemoteStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(RemoteStatus::Queued),
            "processing" => Some(RemoteStatus::Processing),
            "completed" => Some(RemoteStatus::Completed),
            "failed" => Some(RemoteStatus::Failed),
            _ => None,
        }
    }

    pub fn to_request_status(self) -> RequestStatus {
        match self {
            RemoteStatus::Queued => RequestStatus::Pending,
            RemoteStatus::Processing => RequestStatus::Processing,
            RemoteStatus::Completed => RequestStatus::Completed,
            RemoteStatus::Failed => RequestStatus::Error,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RemoteStatus::Completed | RemoteStatus::Failed)
    }
}

/// Narrow seam towards the analysis service: three verbs plus a resource
/// release. Transport faults surface as `Err` with a human-readable message,
/// never as a panic, so the whole remote system can be swapped out (HTTP,
/// queue-based or simulated) without touching the coordinator.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Submits a job, returning the remote task id.
    async fn start_analysis(
        &self,
        algorithm_id: &str,
        file_path: &Path,
        user_id: i64,
    ) -> Result<String, String>;

    /// Reflects monotonic progress for a given task under normal operation.
    async fn check_status(&self, task_id: &str) -> Result<RemoteStatus, String>;

    /// Materializes the artifact of a completed task onto local storage.
    async fn get_result(&self, task_id: &str) -> Result<PathBuf, String>;

    /// Releases held network resources. Idempotent.
    async fn close(&self);
}

#[derive(Deserialize)]
struct StartAnalysisResponse {
    task_id: String,
}

#[derive(Deserialize)]
struct TaskStatusResponse {
    status: String,
}

/// HTTP transport towards a real analysis server.
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
    results_dir: PathBuf,
}

impl HttpAnalysisClient {
    pub fn new(base_url: &str, results_dir: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            results_dir: PathBuf::from(results_dir),
        }
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn start_analysis(
        &self,
        algorithm_id: &str,
        file_path: &Path,
        user_id: i64,
    ) -> Result<String, String> {
        // Stream the upload off disk instead of buffering whole imagery files.
        let file = tokio::fs::File::open(file_path)
            .await
            .map_err(|e| format!("Failed to open upload {}: {}", file_path.display(), e))?;
        let file_len = file
            .metadata()
            .await
            .map_err(|e| format!("Failed to stat upload {}: {}", file_path.display(), e))?
            .len();
        let filename = file_path
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("upload")
            .to_string();

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(ReaderStream::new(file)),
            file_len,
        )
        .file_name(filename);
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("algorithm_id", algorithm_id.to_string())
            .text("user_id", user_id.to_string());

        let resp = self
            .http
            .post(format!("{}/api/start_analysis", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to reach analysis server: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Analysis server rejected the job ({}): {}", status, body));
        }

        let parsed: StartAnalysisResponse = resp
            .json()
            .await
            .map_err(|e| format!("Malformed start_analysis response: {}", e))?;
        Ok(parsed.task_id)
    }

    async fn check_status(&self, task_id: &str) -> Result<RemoteStatus, String> {
        let resp = self
            .http
            .get(format!("{}/api/task/{}/status", self.base_url, task_id))
            .send()
            .await
            .map_err(|e| format!("Failed to check task status: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Status check failed: {}", resp.status()));
        }

        let parsed: TaskStatusResponse = resp
            .json()
            .await
            .map_err(|e| format!("Malformed status response: {}", e))?;
        RemoteStatus::parse(&parsed.status)
            .ok_or_else(|| format!("Unknown remote status '{}'", parsed.status))
    }

    async fn get_result(&self, task_id: &str) -> Result<PathBuf, String> {
        let mut resp = self
            .http
            .get(format!("{}/api/task/{}/result", self.base_url, task_id))
            .send()
            .await
            .map_err(|e| format!("Failed to fetch result: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Result fetch failed: {}", resp.status()));
        }

        tokio::fs::create_dir_all(&self.results_dir)
            .await
            .map_err(|e| format!("Failed to create results directory: {}", e))?;
        let result_path = self.results_dir.join(format!("{}_result.zip", task_id));

        // Chunked copy to disk; artifacts can be far larger than memory allows.
        let mut out = tokio::fs::File::create(&result_path)
            .await
            .map_err(|e| format!("Failed to create result artifact: {}", e))?;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| format!("Failed to read result body: {}", e))?
        {
            out.write_all(&chunk)
                .await
                .map_err(|e| format!("Failed to store result artifact: {}", e))?;
        }
        out.flush()
            .await
            .map_err(|e| format!("Failed to store result artifact: {}", e))?;
        Ok(result_path)
    }

    async fn close(&self) {
        // reqwest's pool is released when the client drops; nothing to do here.
    }
}

/// In-process stand-in for the analysis server. The task registry lives inside
/// the client, mirroring where the real deployment keeps it (on the server).
pub struct SimulatedClient {
    tasks: Mutex<HashMap<String, Instant>>,
    processing_time: Duration,
    results_dir: PathBuf,
}

impl SimulatedClient {
    pub fn new(results_dir: &str) -> Self {
        Self::with_processing_time(results_dir, Duration::from_secs(30))
    }

    pub fn with_processing_time(results_dir: &str, processing_time: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            processing_time,
            results_dir: PathBuf::from(results_dir),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Instant>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AnalysisClient for SimulatedClient {
    async fn start_analysis(
        &self,
        algorithm_id: &str,
        _file_path: &Path,
        user_id: i64,
    ) -> Result<String, String> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| e.to_string())?
            .as_millis();
        let task_id = format!("task_{}_{}_{}", user_id, algorithm_id, now_ms);
        self.lock().insert(task_id.clone(), Instant::now());
        Ok(task_id)
    }

    async fn check_status(&self, task_id: &str) -> Result<RemoteStatus, String> {
        let started = self
            .lock()
            .get(task_id)
            .copied()
            .ok_or_else(|| format!("Task {} not found", task_id))?;

        // Completed tasks stay in the registry so progress never regresses.
        if started.elapsed() >= self.processing_time {
            Ok(RemoteStatus::Completed)
        } else {
            Ok(RemoteStatus::Processing)
        }
    }

    async fn get_result(&self, task_id: &str) -> Result<PathBuf, String> {
        let algorithm_name = find_algorithm(
            task_id
                .split('_')
                .skip(2)
                .take_while(|part| part.parse::<u128>().is_err())
                .collect::<Vec<_>>()
                .join("_")
                .as_str(),
        )
        .map(|a| a.name)
        .unwrap_or("Unknown algorithm");

        let summary = format!(
            "AERIAL IMAGERY ANALYSIS RESULT\n\
             Task: {}\n\
             Algorithm: {}\n\
             Finished: {}\n\
             Pixels processed: 12,450,000\n\
             Processed area: 5000 x 2490 px\n",
            task_id,
            algorithm_name,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
        );

        tokio::fs::create_dir_all(&self.results_dir)
            .await
            .map_err(|e| format!("Failed to create results directory: {}", e))?;
        let result_path = self.results_dir.join(format!("{}_result.txt", task_id));
        tokio::fs::write(&result_path, summary)
            .await
            .map_err(|e| format!("Failed to write result artifact: {}", e))?;
        Ok(result_path)
    }

    async fn close(&self) {
        // Nothing held beyond the in-memory registry.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_to_stored_mapping_is_total() {
        assert_eq!(RemoteStatus::Queued.to_request_status(), RequestStatus::Pending);
        assert_eq!(
            RemoteStatus::Processing.to_request_status(),
            RequestStatus::Processing
        );
        assert_eq!(
            RemoteStatus::Completed.to_request_status(),
            RequestStatus::Completed
        );
        assert_eq!(RemoteStatus::Failed.to_request_status(), RequestStatus::Error);
    }

    #[test]
    fn remote_vocabulary_is_closed() {
        assert_eq!(RemoteStatus::parse("completed"), Some(RemoteStatus::Completed));
        assert_eq!(RemoteStatus::parse("COMPLETED"), None);
        assert_eq!(RemoteStatus::parse("done"), None);
    }

    #[tokio::test]
    async fn simulated_task_progresses_and_never_regresses() {
        let dir = tempfile::tempdir().unwrap();
        let slow = SimulatedClient::with_processing_time(
            dir.path().to_str().unwrap(),
            Duration::from_secs(3600),
        );
        let task = slow.start_analysis("vegetation_index", Path::new("f.tif"), 42).await.unwrap();
        assert_eq!(slow.check_status(&task).await, Ok(RemoteStatus::Processing));

        let fast = SimulatedClient::with_processing_time(
            dir.path().to_str().unwrap(),
            Duration::ZERO,
        );
        let task = fast.start_analysis("vegetation_index", Path::new("f.tif"), 42).await.unwrap();
        assert_eq!(fast.check_status(&task).await, Ok(RemoteStatus::Completed));
        // Still completed on the next poll.
        assert_eq!(fast.check_status(&task).await, Ok(RemoteStatus::Completed));
    }

    #[tokio::test]
    async fn simulated_unknown_task_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = SimulatedClient::new(dir.path().to_str().unwrap());
        assert!(client.check_status("task_1_missing_0").await.is_err());
    }

    #[tokio::test]
    async fn simulated_result_artifact_is_materialized() {
        let dir = tempfile::tempdir().unwrap();
        let client = SimulatedClient::with_processing_time(
            dir.path().to_str().unwrap(),
            Duration::ZERO,
        );
        let task = client.start_analysis("change_detection", Path::new("f.tif"), 7).await.unwrap();
        let path = client.get_result(&task).await.unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("Change detection"), "artifact body: {}", body);

        client.close().await;
        client.close().await; // close is idempotent
    }
}
