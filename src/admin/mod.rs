//! Admin API: live status and settings merge.
//!
//! Served on its own listener, behind a bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use crate::config::SettingsHandle;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub settings: SettingsHandle,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(settings: SettingsHandle, api_key: &str) -> Self {
        Self {
            settings,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/settings", patch(patch_settings))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownloadConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> (SettingsHandle, Router) {
        let settings = SettingsHandle::new(DownloadConfig {
            secret: "s3cr3t".into(),
            ..Default::default()
        });
        let router = setup_admin_router(AdminState::new(settings.clone(), "k-123"));
        (settings, router)
    }

    fn patch_request(key: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri("/admin/settings")
            .header("authorization", format!("Bearer {key}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn requires_api_key() {
        let (_, router) = router();
        let res = router
            .oneshot(Request::builder().uri("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn status_hides_secret() {
        let (_, router) = router();
        let res = router
            .oneshot(
                Request::builder()
                    .uri("/admin/status")
                    .header("authorization", "Bearer k-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("\"uri_prefix\":\"dl\""));
        assert!(!body.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn patch_merges_settings() {
        let (settings, router) = router();
        let res = router
            .oneshot(patch_request("k-123", r#"{"timeout": 90, "rootPath": "/srv/files"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let current = settings.load();
        assert_eq!(current.timeout, 90);
        assert_eq!(current.root_path, std::path::PathBuf::from("/srv/files"));
        assert_eq!(current.secret, "s3cr3t");
    }

    #[tokio::test]
    async fn invalid_patch_is_rejected() {
        let (settings, router) = router();
        let res = router
            .clone()
            .oneshot(patch_request("k-123", r#"{"timeout": 0}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(settings.load().timeout, 3600);

        let res = router.oneshot(patch_request("k-123", "{}")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
