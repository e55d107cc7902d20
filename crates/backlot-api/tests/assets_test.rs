//! Integration tests for asset slot and generation routes.

mod common;

use axum::http::{StatusCode, header};
use backlot_core::backend::{MediaPayload, OperationHandle};
use backlot_core::error::BackendError;
use backlot_test_support::RecordingCredentialHost;

#[tokio::test]
async fn test_list_assets_returns_full_catalog() {
    let test_app = common::build_test_app();

    let (status, json) = common::get_json(test_app.app, "/api/v1/assets").await;

    assert_eq!(status, StatusCode::OK);
    let slots = json.as_array().unwrap();
    assert_eq!(slots.len(), 9);
    assert_eq!(slots[0]["id"], "opening");
    assert_eq!(slots[0]["phase"], "idle");
}

#[tokio::test]
async fn test_generate_image_stores_artifact() {
    let test_app = common::build_test_app();
    test_app
        .backend
        .script_image(Ok(MediaPayload::new(vec![137, 80, 78, 71], "image/png")));

    let (status, json) = common::post_json(test_app.app, "/api/v1/assets/ch1/generate").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["slot"]["phase"], "succeeded");
    assert_eq!(json["slot"]["artifact"]["mime_type"], "image/png");
}

#[tokio::test]
async fn test_generate_video_polls_to_completion() {
    let test_app = common::build_test_app();
    test_app
        .backend
        .script_submit(Ok(OperationHandle::pending("operations/demo")));
    test_app
        .backend
        .script_poll(Ok(OperationHandle::pending("operations/demo")));
    test_app.backend.script_poll(Ok(OperationHandle {
        name: "operations/demo".to_string(),
        done: true,
        artifact_uri: Some("https://media.example/demo.mp4".to_string()),
    }));
    test_app
        .backend
        .script_download(Ok(MediaPayload::new(b"mp4 bytes".to_vec(), "video/mp4")));

    let (status, json) =
        common::post_json(test_app.app.clone(), "/api/v1/assets/opening/generate").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["slot"]["phase"], "succeeded");
    assert_eq!(
        json["slot"]["artifact"]["source_uri"],
        "https://media.example/demo.mp4"
    );
    assert_eq!(test_app.backend.poll_count(), 2);
}

#[tokio::test]
async fn test_generate_unknown_asset_returns_404() {
    let test_app = common::build_test_app();

    let (status, json) = common::post_json(test_app.app, "/api/v1/assets/ghost/generate").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "unknown_asset");
}

#[tokio::test]
async fn test_artifact_served_with_content_type() {
    let test_app = common::build_test_app();
    test_app
        .backend
        .script_image(Ok(MediaPayload::new(vec![137, 80, 78, 71], "image/png")));
    let (status, _) =
        common::post_json(test_app.app.clone(), "/api/v1/assets/ch2/generate").await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, bytes) =
        common::get_bytes(test_app.app, "/api/v1/assets/ch2/artifact").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(bytes.as_ref(), [137, 80, 78, 71]);
}

#[tokio::test]
async fn test_artifact_missing_until_generated() {
    let test_app = common::build_test_app();

    let (status, json) = common::get_json(test_app.app, "/api/v1/assets/ch1/artifact").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "artifact_not_ready");
}

#[tokio::test]
async fn test_expired_authorization_flips_credential_and_reprompts() {
    let test_app =
        common::build_test_app_with_host(RecordingCredentialHost::selected());
    test_app.backend.script_image(Err(BackendError::api(
        "PERMISSION_DENIED: caller lacks access",
    )));

    let (status, json) = common::post_json(test_app.app, "/api/v1/assets/ch1/generate").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error_kind"], "authorization_expired");
    assert_eq!(json["slot"]["phase"], "failed");
    // The selection flow is opened once for recovery.
    assert_eq!(test_app.host.open_count(), 1);
}

#[tokio::test]
async fn test_reset_clears_failed_slot() {
    let test_app = common::build_test_app();
    test_app
        .backend
        .script_image(Err(BackendError::api_with_status("model overloaded", 500)));
    let (status, json) =
        common::post_json(test_app.app.clone(), "/api/v1/assets/ch4/generate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["slot"]["phase"], "failed");

    let (status, json) = common::post_json(test_app.app, "/api/v1/assets/ch4/reset").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "idle");
    assert!(json["error"].is_null());
    assert!(json["artifact"].is_null());
}
