use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use crate::domain::pipeline::PipelineDriver;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(driver): State<Arc<PipelineDriver>>) -> impl IntoResponse {
    let storage = output_root_writable(&driver).await;
    let ffmpeg = driver.assembler().probe().await;
    let provider = driver.provider();

    let status = if storage && ffmpeg {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ready" } else { "not_ready" },
            "storage": if storage { "writable" } else { "unavailable" },
            "ffmpeg": if ffmpeg { "available" } else { "missing" },
            "tts": provider.unwrap_or("unconfigured"),
        })),
    )
}

async fn output_root_writable(driver: &PipelineDriver) -> bool {
    let root = driver.output_root();
    if tokio::fs::create_dir_all(root).await.is_err() {
        return false;
    }
    let probe = root.join(".ready-probe");
    let writable = tokio::fs::write(&probe, b"ok").await.is_ok();
    let _ = tokio::fs::remove_file(&probe).await;
    writable
}
