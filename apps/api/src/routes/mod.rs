pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::analysis::handlers;
use crate::state::AppState;

/// Headroom on top of the file limit for multipart framing and the text field.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(health::liveness_handler))
        .route("/health", get(health::readiness_handler))
        .route(
            "/api/analyze",
            post(handlers::handle_analyze).layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured browser origins. A `*` entry opens the API to
/// any origin, without credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::service::AnalysisService;
    use crate::config::{test_config, Config};
    use crate::document::fixtures::pdf_with_pages;
    use crate::providers::mock::MockProvider;
    use crate::providers::{AnalysisProvider, ProviderError, RawAnalysisResult};

    const BOUNDARY: &str = "resume-analyzer-test-boundary";
    const JOB_DESCRIPTION: &str =
        "Backend engineer: Python, SQL, Docker and AWS experience required.";

    struct UnreachableVendor;

    #[async_trait]
    impl AnalysisProvider for UnreachableVendor {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn analyze(&self, _: &str, _: &str) -> Result<RawAnalysisResult, ProviderError> {
            Err(ProviderError::Api {
                provider: "unreachable",
                status: 503,
                message: "overloaded".to_string(),
            })
        }
    }

    fn app_with(config: Config, provider: Arc<dyn AnalysisProvider>) -> Router {
        build_router(AppState {
            config,
            analysis: AnalysisService::new(provider),
        })
    }

    fn app() -> Router {
        app_with(test_config(), Arc::new(MockProvider::new()))
    }

    fn analyze_request(file: Option<(&str, &[u8])>, job_description: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some((file_name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cv_file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(text) = job_description {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{text}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn resume_pdf() -> Vec<u8> {
        pdf_with_pages(&[
            "Jane Doe - Software Engineer",
            "Skills: Python, SQL, Git",
        ])
    }

    #[tokio::test]
    async fn test_liveness() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "SmartResume Analyzer");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_readiness_reports_missing_key() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["api"], "operational");
        assert_eq!(body["checks"]["ai_service"], "missing_key");
        assert_eq!(body["provider"], "mock");
    }

    #[tokio::test]
    async fn test_readiness_reports_configured_key() {
        let mut config = test_config();
        config.ai.api_key = Some("sk-test".to_string());
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (_, body) = send(app_with(config, Arc::new(MockProvider::new())), request).await;
        assert_eq!(body["checks"]["ai_service"], "configured");
    }

    #[tokio::test]
    async fn test_analyze_with_mock_provider_succeeds() {
        let pdf = resume_pdf();
        let request = analyze_request(Some(("jane_doe.pdf", pdf.as_slice())), Some(JOB_DESCRIPTION));
        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        let score = body["score"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&score));
        assert!(!body["recommendation"].as_str().unwrap().is_empty());
        let matching: Vec<&str> = body["matching_skills"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(matching.contains(&"python"));
        assert!(matching.contains(&"sql"));
    }

    #[tokio::test]
    async fn test_wrong_extension_is_rejected_regardless_of_content() {
        let pdf = resume_pdf();
        let contents: [&[u8]; 3] = [b"plain text resume".as_slice(), pdf.as_slice(), b"".as_slice()];
        for content in contents {
            let request = analyze_request(Some(("resume.txt", content)), Some(JOB_DESCRIPTION));
            let (status, body) = send(app(), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["detail"].as_str().unwrap().contains("PDF"));
        }
    }

    #[tokio::test]
    async fn test_wrong_extension_is_rejected_before_the_rest_of_the_form() {
        let request = analyze_request(Some(("resume.txt", b"plain text resume".as_slice())), None);
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Only PDF files are supported");
    }

    #[tokio::test]
    async fn test_short_job_description_is_rejected_even_with_valid_pdf() {
        let pdf = resume_pdf();
        let request = analyze_request(Some(("resume.pdf", pdf.as_slice())), Some("short"));
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "Job description must be at least 10 characters"
        );
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let pdf = resume_pdf();
        let (status, body) = send(app(), analyze_request(Some(("resume.pdf", pdf.as_slice())), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "job_description is required");

        let (status, body) = send(app(), analyze_request(None, Some(JOB_DESCRIPTION))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "cv_file is required");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_before_parsing() {
        let mut config = test_config();
        config.max_file_size_mb = 1;
        let oversized = vec![b'a'; 1024 * 1024 + 512 * 1024];
        let request = analyze_request(Some(("big.pdf", oversized.as_slice())), Some(JOB_DESCRIPTION));
        let (status, body) =
            send(app_with(config, Arc::new(MockProvider::new())), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "File size exceeds maximum limit of 1MB");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_a_client_error() {
        let request = analyze_request(
            Some(("resume.pdf", b"%PDF-1.4 fake pdf".as_slice())),
            Some(JOB_DESCRIPTION),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid document");
        assert_eq!(body["detail"], "Invalid or corrupted PDF file");
    }

    #[tokio::test]
    async fn test_textless_pdf_is_a_client_error() {
        let pdf = pdf_with_pages(&["", ""]);
        let request = analyze_request(Some(("scan.pdf", pdf.as_slice())), Some(JOB_DESCRIPTION));
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("No text could be extracted"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_a_gateway_error() {
        let pdf = resume_pdf();
        let request = analyze_request(Some(("resume.pdf", pdf.as_slice())), Some(JOB_DESCRIPTION));
        let (status, body) =
            send(app_with(test_config(), Arc::new(UnreachableVendor)), request).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "AI provider call failed");
        assert!(body["detail"].as_str().unwrap().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/analyze")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unlisted_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/analyze")
            .header(header::ORIGIN, "http://evil.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
