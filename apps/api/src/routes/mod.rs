pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::query::handlers as query;
use crate::state::AppState;
use crate::utilization::handlers as utilization;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Utilization API
        .route(
            "/api/v1/utilization",
            get(utilization::handle_get_utilization),
        )
        .route(
            "/api/v1/utilization/:employee_id",
            get(utilization::handle_get_employee),
        )
        // Query API
        .route("/api/v1/query", post(query::handle_query))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm_client::tests::{RecordingTransport, OK_BODY};
    use crate::llm_client::CompletionClient;
    use crate::models::employee::{Employee, EmployeeRecord, WorkloadRecord};
    use crate::utilization::dataset::EmployeeFeed;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn record(id: &str, name: &str, allocated: f64, available: f64) -> EmployeeRecord {
        EmployeeRecord {
            employee: Employee {
                employee_id: id.to_string(),
                name: name.to_string(),
                role: "Engineer".to_string(),
            },
            workload: WorkloadRecord::new(allocated, available),
        }
    }

    fn app_with(transport: Arc<RecordingTransport>) -> Router {
        let state = AppState {
            feed: EmployeeFeed::from_records(vec![
                record("E1", "Alice", 45.0, 40.0),
                record("E2", "Bob", 32.0, 40.0),
                record("E3", "Carol", 20.0, 0.0),
            ]),
            completion: CompletionClient::new(transport, "test-model"),
            config: Config::for_tests(),
        };
        build_router(state)
    }

    fn app() -> Router {
        app_with(Arc::new(RecordingTransport::responding(200, OK_BODY)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_utilization_report_in_feed_order() {
        let (status, body) = send(app(), get("/api/v1/utilization")).await;
        assert_eq!(status, StatusCode::OK);

        let metrics = body["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0]["employee"]["Name"], "Alice");
        assert_eq!(metrics[0]["utilization_rate"], 112.5);
        assert_eq!(metrics[0]["status"], "Overutilized");
        assert_eq!(metrics[1]["status"], "Optimal");
        // zero available hours
        assert_eq!(metrics[2]["utilization_rate"], 0.0);
        assert_eq!(metrics[2]["status"], "Underutilized");

        assert_eq!(body["summary"]["overutilized"], 1);
        assert_eq!(body["thresholds"]["low"], 70.0);
        assert_eq!(body["thresholds"]["high"], 100.0);
    }

    #[tokio::test]
    async fn test_single_employee_and_not_found() {
        let (status, body) = send(app(), get("/api/v1/utilization/E2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["utilization_rate"], 80.0);

        let (status, body) = send(app(), get("/api/v1/utilization/E404")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_local_query_names_only_overutilized() {
        let (status, body) = send(
            app(),
            post_json("/api/v1/query", json!({ "question": "Who is overutilized?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let answer = body["answer"].as_str().unwrap();
        assert!(answer.contains("Alice"));
        assert!(!answer.contains("Bob"));
        assert_eq!(body["backend"], "local");
        assert_eq!(body["session"]["request"], "succeeded");
        assert_eq!(body["session"]["history"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let (status, body) = send(
            app(),
            post_json("/api/v1/query", json!({ "question": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_llm_query_without_key_fails_in_session_and_keeps_metrics() {
        let transport = Arc::new(RecordingTransport::responding(200, OK_BODY));
        let (status, body) = send(
            app_with(transport.clone()),
            post_json(
                "/api/v1/query",
                json!({ "question": "Who is busy?", "backend": "llm" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["answer"].is_null());
        assert_eq!(body["session"]["request"], "failed");
        assert!(body["session"]["last_error"]
            .as_str()
            .unwrap()
            .contains("API key"));
        assert_eq!(body["metrics"].as_array().unwrap().len(), 3);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_query_with_key_returns_answer_without_echoing_key() {
        let transport = Arc::new(RecordingTransport::responding(200, OK_BODY));
        let (status, body) = send(
            app_with(transport.clone()),
            post_json(
                "/api/v1/query",
                json!({ "question": "Who is busy?", "backend": "llm", "api_key": "sk-live" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Alice is overloaded.");
        assert_eq!(body["backend"], "llm");
        assert!(!body.to_string().contains("sk-live"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_session_is_threaded_through_requests() {
        let (_, first) = send(
            app(),
            post_json("/api/v1/query", json!({ "question": "team summary" })),
        )
        .await;

        let (_, second) = send(
            app(),
            post_json(
                "/api/v1/query",
                json!({ "question": "how is bob?", "session": first["session"] }),
            ),
        )
        .await;

        assert_eq!(second["session"]["session_id"], first["session"]["session_id"]);
        assert_eq!(second["session"]["request_seq"], 2);
        let history = second["session"]["history"].as_array().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2]["role"], "user");
        assert!(history[3]["text"].as_str().unwrap().starts_with("Bob"));
    }

    #[tokio::test]
    async fn test_exhausted_session_sequence_is_rejected() {
        let transport = Arc::new(RecordingTransport::responding(200, OK_BODY));
        let (status, body) = send(
            app_with(transport.clone()),
            post_json(
                "/api/v1/query",
                json!({
                    "question": "Who is busy?",
                    "backend": "llm",
                    "api_key": "sk-live",
                    "session": {
                        "session_id": "7f9c0e52-2b1a-4f57-9a2e-0d6a7d3c1b44",
                        "request_seq": u64::MAX
                    }
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("request sequence"));
        assert_eq!(transport.calls(), 0);
    }
}
