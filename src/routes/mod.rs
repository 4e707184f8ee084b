//! Router assembly: JSON API, static front-end, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod extract;
pub mod http;

/// Build the application router with:
/// - JSON API under `/api/...` (auth, questions, submission, results)
/// - Static front-end from `STATIC_DIR` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/health", get(http::http_health))
        // Public
        .route("/api/register", post(http::http_register))
        .route("/api/login", post(http::http_login))
        .route("/api/logout", post(http::http_logout))
        // Authenticated (CurrentUser extractor)
        .route("/api/questions", get(http::http_get_questions))
        .route("/api/submit", post(http::http_submit))
        .route("/api/results", get(http::http_get_results))
        .route("/api/results/:id", get(http::http_get_result))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;

    async fn app() -> Router {
        build_router(Arc::new(AppState::new(AppConfig::default()).await))
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "secret-pass",
                    "first_name": "Test",
                    "last_name": "User"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key(header::SET_COOKIE));
        let body = read_json(response).await;
        assert!(body["data"]["user"].get("password_hash").is_none());
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .await
            .oneshot(json_request(Method::GET, "/api/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = app().await;
        let missing = app
            .clone()
            .oneshot(json_request(Method::GET, "/api/results", None, None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(missing).await["error"], "Authorization token required");

        let bogus = app
            .oneshot(json_request(Method::GET, "/api/results", Some("nope"), None))
            .await
            .unwrap();
        assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(bogus).await["error"], "Invalid token");
    }

    #[tokio::test]
    async fn registration_rejects_bad_input_and_duplicates() {
        let app = app().await;
        let bad = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "email": "nope", "password": "123", "first_name": "A", "last_name": "B" })),
            ))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let msg = read_json(bad).await["error"].as_str().unwrap().to_string();
        assert!(msg.contains("email"), "{msg}");
        assert!(msg.contains("password"), "{msg}");

        register(&app, "dup@example.com").await;
        let again = app
            .oneshot(json_request(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "email": "DUP@example.com", "password": "secret-pass", "first_name": "A", "last_name": "B" })),
            ))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::CONFLICT);
        assert_eq!(read_json(again).await["error"], "User already exists");
    }

    #[tokio::test]
    async fn login_and_logout() {
        let app = app().await;
        register(&app, "li@example.com").await;

        let wrong = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "li@example.com", "password": "bad-pass" })),
            ))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(wrong).await["error"], "Invalid credentials");

        let good = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "li@example.com", "password": "secret-pass" })),
            ))
            .await
            .unwrap();
        assert_eq!(good.status(), StatusCode::OK);
        let token = read_json(good).await["data"]["token"].as_str().unwrap().to_string();

        let out = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/logout", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(out.status(), StatusCode::OK);

        let after = app
            .oneshot(json_request(Method::GET, "/api/results", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cookie_authenticates_too() {
        let app = app().await;
        let token = register(&app, "cookie@example.com").await;
        let request = Request::builder()
            .uri("/api/results")
            .header(header::COOKIE, format!("token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Some clients always send the header, empty when logged out of the API.
        let request = Request::builder()
            .uri("/api/results")
            .header(header::AUTHORIZATION, "")
            .header(header::COOKIE, format!("token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn questions_are_served_without_keys() {
        let app = app().await;
        let token = register(&app, "q@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(Method::GET, "/api/questions", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let questions = body["data"].as_array().unwrap();
        assert_eq!(questions.len(), 50);
        assert_eq!(questions[0]["order_index"], 1);
        assert!(questions.iter().all(|q| q.get("correct_answer").is_none()));

        let bad = app
            .oneshot(json_request(Method::GET, "/api/questions?test_id=abc", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(bad).await["error"], "Invalid test ID");
    }

    #[tokio::test]
    async fn submit_then_read_back() {
        let app = app().await;
        let token = register(&app, "sub@example.com").await;

        // Built-in battery: question 1 is keyed "c", question 19 "heavy,wooden".
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/submit",
                Some(&token),
                Some(json!({
                    "test_id": 1,
                    "time_taken": 42,
                    "answers": [
                        { "question_id": 1, "user_answer": "C", "response_time": 5000 },
                        { "question_id": 19, "user_answer": "Wooden ", "response_time": 4000 },
                        { "question_id": 424242, "user_answer": "x", "response_time": 1 }
                    ]
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let data = &body["data"];
        assert_eq!(data["score"], 2);
        assert_eq!(data["total_questions"], 2);
        assert_eq!(data["test"]["name"], "Cognitive Assessment");
        assert_eq!(data["answers"].as_array().unwrap().len(), 2);
        let id = data["id"].as_u64().unwrap();

        let list = app
            .clone()
            .oneshot(json_request(Method::GET, "/api/results", Some(&token), None))
            .await
            .unwrap();
        let list = read_json(list).await;
        assert_eq!(list["data"].as_array().unwrap().len(), 1);

        let detail = app
            .clone()
            .oneshot(json_request(Method::GET, &format!("/api/results/{id}"), Some(&token), None))
            .await
            .unwrap();
        assert_eq!(detail.status(), StatusCode::OK);
        let detail = read_json(detail).await;
        assert_eq!(detail["data"]["answers"][1]["question"]["id"], 19);
        assert_eq!(detail["data"]["categories"].as_array().unwrap().len(), 2);

        // Another user sees the same thing as for a result that does not exist.
        let other = register(&app, "other@example.com").await;
        let foreign = app
            .clone()
            .oneshot(json_request(Method::GET, &format!("/api/results/{id}"), Some(&other), None))
            .await
            .unwrap();
        let missing = app
            .oneshot(json_request(Method::GET, "/api/results/9999", Some(&other), None))
            .await
            .unwrap();
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(foreign).await, read_json(missing).await);
    }

    #[tokio::test]
    async fn malformed_submission_is_rejected_before_scoring() {
        let app = app().await;
        let token = register(&app, "bad@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/submit",
                Some(&token),
                Some(json!({ "answers": [] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(response).await["error"].as_str().unwrap().contains("test_id"));

        let list = app
            .oneshot(json_request(Method::GET, "/api/results", Some(&token), None))
            .await
            .unwrap();
        assert!(read_json(list).await["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submitting_to_an_unknown_test_is_not_found() {
        let app = app().await;
        let token = register(&app, "nf@example.com").await;
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/submit",
                Some(&token),
                Some(json!({ "test_id": 99, "answers": [{ "question_id": 1, "user_answer": "c" }] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(response).await["error"], "test not found");
    }
}
