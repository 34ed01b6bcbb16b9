use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use aeroscan::services::analysis_client::{AnalysisClient, HttpAnalysisClient, RemoteStatus};

async fn start_analysis(
    State(received): State<Arc<AtomicU64>>,
    mut multipart: Multipart,
) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("file") {
            let data = field.bytes().await.unwrap();
            received.fetch_add(data.len() as u64, Ordering::SeqCst);
        } else {
            let _ = field.text().await;
        }
    }
    Json(json!({ "task_id": "task_7_vegetation_index_1" }))
}

async fn task_status() -> Json<Value> {
    Json(json!({ "status": "completed" }))
}

async fn task_result() -> Vec<u8> {
    b"ANALYSIS ARTIFACT BYTES".to_vec()
}

async fn spawn_server(received: Arc<AtomicU64>) -> String {
    let app = Router::new()
        .route("/api/start_analysis", post(start_analysis))
        .route("/api/task/{id}/status", get(task_status))
        .route("/api/task/{id}/result", get(task_result))
        .with_state(received);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn http_client_streams_the_upload_and_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("field.tif");
    let payload = vec![0xA5u8; 256 * 1024];
    std::fs::write(&upload, &payload).unwrap();

    let received = Arc::new(AtomicU64::new(0));
    let base_url = spawn_server(received.clone()).await;

    let results_dir = dir.path().join("results");
    let client = HttpAnalysisClient::new(&base_url, results_dir.to_str().unwrap());

    let task_id = client
        .start_analysis("vegetation_index", &upload, 7)
        .await
        .unwrap();
    assert_eq!(task_id, "task_7_vegetation_index_1");
    // The whole file arrived through the streamed part.
    assert_eq!(received.load(Ordering::SeqCst), payload.len() as u64);

    assert_eq!(
        client.check_status(&task_id).await,
        Ok(RemoteStatus::Completed)
    );

    let artifact = client.get_result(&task_id).await.unwrap();
    assert_eq!(artifact, results_dir.join("task_7_vegetation_index_1_result.zip"));
    let body = std::fs::read(&artifact).unwrap();
    assert_eq!(body, b"ANALYSIS ARTIFACT BYTES");

    client.close().await;
}
