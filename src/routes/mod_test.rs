use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use super::*;
use crate::state::test_helpers::test_app_state;

async fn get_path(uri: &str) -> (StatusCode, Option<String>, String) {
    let resp = app(test_app_state())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let location = resp
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_owned());
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, location, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn healthz_is_ok() {
    let (status, _, _) = get_path("/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn shell_config_is_served() {
    let (status, _, body) = get_path("/capacitor.config.json").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["appId"], "com.bestmealmate.app");
    assert_eq!(json["server"]["cleartext"], false);
}

#[tokio::test]
async fn loading_fragment_is_bare() {
    let (status, _, body) = get_path("/loading").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<div"));
    assert!(body.contains("animate-spin"));
}

#[tokio::test]
async fn nested_dashboard_path_is_gated() {
    let (status, location, _) = get_path("/dashboard/settings").await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/login?redirect=%2Fdashboard%2Fsettings"));
}

#[tokio::test]
async fn login_error_notice_renders() {
    let (status, _, body) = get_path("/login?error=auth_failed").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sign-in failed"));
}

#[tokio::test]
async fn unknown_path_is_404() {
    let (status, _, _) = get_path("/definitely-not-a-page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
