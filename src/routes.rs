use crate::docs::ApiDoc;
use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower_http::cors::{Any, CorsLayer};

pub fn configure_routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(crate::modules::system::handler::health))
        .route("/stats", get(crate::modules::system::handler::stats))
        .merge(crate::modules::convert::router())
        .merge(crate::modules::jobs::router())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use crate::config::settings::AppConfig;
    use crate::infrastructure::storage::s3::StorageService;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn test_app(scratch_dir: std::path::PathBuf) -> (AppState, axum::Router) {
        let config = AppConfig {
            server_port: 0,
            scratch_dir,
            cdn_base_url: "https://cdn.example.com".to_string(),
            s3_endpoint: "http://127.0.0.1:9000".to_string(),
            s3_bucket: "reels".to_string(),
            s3_access_key: "test".to_string(),
            s3_secret_key: "test".to_string(),
        };
        let storage = StorageService::new(
            &config.s3_endpoint,
            &config.s3_bucket,
            &config.s3_access_key,
            &config.s3_secret_key,
        )
        .await;
        let state = AppState::new(config, storage);
        let app = crate::app::create_app(state.clone()).await;
        (state, app)
    }

    const BOUNDARY: &str = "reel-test-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn video_part(content_type: &str, data: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"clip.mp4\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n"
        )
    }

    fn multipart_request(parts: &[String]) -> Request<Body> {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        Request::builder()
            .method("POST")
            .uri("/convert")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_service_identity() {
        let scratch = tempfile::tempdir().unwrap();
        let (_state, app) = test_app(scratch.path().to_path_buf()).await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "reels-transcoder");
    }

    #[tokio::test]
    async fn status_lookup_for_unknown_job_is_404() {
        let scratch = tempfile::tempdir().unwrap();
        let (_state, app) = test_app(scratch.path().to_path_buf()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/job/does-not-exist/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_counts_scratch_entries() {
        let scratch = tempfile::tempdir().unwrap();
        tokio::fs::write(scratch.path().join("a_source.mp4"), b"x")
            .await
            .unwrap();
        tokio::fs::create_dir(scratch.path().join("a")).await.unwrap();
        let (_state, app) = test_app(scratch.path().to_path_buf()).await;

        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["scratchFiles"], 1);
        assert_eq!(body["scratchDirs"], 1);
        assert_eq!(body["jobsTotal"], 0);
    }

    #[tokio::test]
    async fn convert_accepts_video_and_answers_with_precomputed_urls() {
        let scratch = tempfile::tempdir().unwrap();
        let (_state, app) = test_app(scratch.path().to_path_buf()).await;

        let request = multipart_request(&[
            video_part("video/mp4", "not a real video"),
            text_part("videoId", "abc123"),
            text_part("userId", "user-1"),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["jobId"], "abc123");
        assert_eq!(
            body["hlsUrl"],
            "https://cdn.example.com/reels/hls/abc123/master.m3u8"
        );
        assert_eq!(
            body["thumbnailUrl"],
            "https://cdn.example.com/reels/hls/abc123/thumbnail.jpg"
        );
        assert_eq!(body["status"], "processing");
    }

    #[tokio::test]
    async fn convert_rejects_non_video_uploads() {
        let scratch = tempfile::tempdir().unwrap();
        let (_state, app) = test_app(scratch.path().to_path_buf()).await;

        let request = multipart_request(&[
            video_part("text/plain", "definitely not a video"),
            text_part("userId", "user-1"),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn convert_without_user_id_is_rejected_and_staging_is_reclaimed() {
        let scratch = tempfile::tempdir().unwrap();
        let (_state, app) = test_app(scratch.path().to_path_buf()).await;

        let request = multipart_request(&[video_part("video/mp4", "not a real video")]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let leftovers = std::fs::read_dir(scratch.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn convert_refuses_a_job_id_that_is_still_running() {
        let scratch = tempfile::tempdir().unwrap();
        let (state, app) = test_app(scratch.path().to_path_buf()).await;

        let running = crate::modules::jobs::model::Job::new(
            "busy1".to_string(),
            "user-1".to_string(),
            None,
            scratch.path().join("busy1_source.mp4"),
            &state.config.cdn_base_url,
        );
        state.jobs.insert(running);

        let request = multipart_request(&[
            video_part("video/mp4", "not a real video"),
            text_part("videoId", "busy1"),
            text_part("userId", "user-2"),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let leftovers = std::fs::read_dir(scratch.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
