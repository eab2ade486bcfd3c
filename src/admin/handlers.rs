use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::config::{DigestAlgorithm, DownloadConfig, DownloadConfigPatch};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub download: SettingsView,
}

/// Download settings without the secret.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub uri_prefix: String,
    pub root_path: String,
    pub timeout: u64,
    pub server: String,
    pub digest: DigestAlgorithm,
}

impl From<&DownloadConfig> for SettingsView {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            uri_prefix: config.uri_prefix.clone(),
            root_path: config.root_path.display().to_string(),
            timeout: config.timeout,
            server: config.server.clone(),
            digest: config.digest,
        }
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let current = state.settings.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        download: SettingsView::from(current.as_ref()),
    })
}

/// Merge a partial settings object into the live configuration.
pub async fn patch_settings(
    State(state): State<AdminState>,
    Json(patch): Json<DownloadConfigPatch>,
) -> impl IntoResponse {
    if patch.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "errors": ["empty patch"] })),
        )
            .into_response();
    }

    match state.settings.merge(&patch) {
        Ok(current) => Json(SettingsView::from(current.as_ref())).into_response(),
        Err(errors) => {
            let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
            tracing::warn!(?errors, "Rejected settings patch");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "errors": errors })),
            )
                .into_response()
        }
    }
}
