pub mod health;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::errors::AppError;
use crate::state::AppState;
use crate::writing::handlers;

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Plain OPTIONS requests (no CORS preflight headers) still answer 200.
async fn options_ok() -> StatusCode {
    StatusCode::OK
}

pub fn build_router(state: AppState) -> Router {
    let health = get(health::health_handler)
        .post(health::health_handler)
        .options(options_ok)
        .fallback(method_not_allowed);

    Router::new()
        .route("/health", health.clone())
        .route("/api/health", health)
        .route(
            "/api/generate",
            post(handlers::handle_generate)
                .options(options_ok)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/rewrite",
            post(handlers::handle_rewrite)
                .options(options_ok)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Any origin; the browser frontend and local development both call in.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::testing::ScriptedCompletion;
    use crate::llm_client::Role;
    use crate::writing::handlers::NO_CONTENT;
    use crate::writing::scoring::{FixedScorer, LlmRubricScorer};

    fn app_with(llm: Arc<ScriptedCompletion>, rubric_scoring: bool) -> Router {
        let scorer: Arc<dyn crate::writing::scoring::OutputScorer> = if rubric_scoring {
            Arc::new(LlmRubricScorer::new(llm.clone(), "gpt-4o-mini"))
        } else {
            Arc::new(FixedScorer)
        };
        let state = AppState {
            llm,
            scorer,
            config: Config::for_tests(),
        };
        build_router(state).layer(cors_layer())
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        read_response(app.oneshot(builder.body(body).unwrap()).await.unwrap()).await
    }

    async fn send_raw(app: Router, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        read_response(app.oneshot(request).await.unwrap()).await
    }

    async fn read_response(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_get_and_post() {
        let llm = Arc::new(ScriptedCompletion::default());
        for method in [Method::GET, Method::POST] {
            let (status, body) = send(app_with(llm.clone(), false), method, "/health", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert_eq!(body["message"], "Backend is healthy");
        }
        let (status, _) = send(app_with(llm, false), Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_json_405() {
        let llm = Arc::new(ScriptedCompletion::default());
        let (status, body) = send(app_with(llm.clone(), false), Method::DELETE, "/health", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");

        let (status, _) = send(app_with(llm, false), Method::GET, "/api/generate", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_preflight_allows_any_origin() {
        let app = app_with(Arc::new(ScriptedCompletion::default()), false);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/generate")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_generate_one_output_per_type() {
        let llm = Arc::new(ScriptedCompletion::with_replies([
            "Fund IV acquires Northwind for $120m.",
            "Proud to welcome Northwind to the portfolio.",
        ]));
        let (status, body) = send(
            app_with(llm.clone(), false),
            Method::POST,
            "/api/generate",
            Some(json!({
                "title": "Northwind acquisition",
                "text": "Fund IV signed to acquire Northwind Logistics.",
                "outputTypes": ["press", "linkedin"],
                "scenario": "new_investment"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let outputs = body["outputs"].as_array().unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0]["outputType"], "press");
        assert_eq!(outputs[0]["text"], "Fund IV acquires Northwind for USD 120m.");
        assert_eq!(outputs[0]["score"], 80.0);
        assert_eq!(outputs[0]["metrics"]["accuracy"], 0.75);
        assert_eq!(outputs[1]["outputType"], "linkedin");
        assert_eq!(body["scenario"], "new_investment");
        assert_eq!(body["workspaceMode"], "generic");
        assert!(body["output"].as_str().unwrap().starts_with("### press\n"));
        assert!(body["requestId"].is_string());

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].temperature, 0.3);
        assert_eq!(requests[0].max_tokens, 1200);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert!(requests[0].messages[1].content.contains("Write a press release"));
        assert!(requests[0].messages[1]
            .content
            .contains("Combined sources (uploads + URLs):\nFund IV signed"));
        assert!(requests[1].messages[1].content.contains("Write a LinkedIn post"));
    }

    #[tokio::test]
    async fn test_generate_without_types_builds_outline() {
        let llm = Arc::new(ScriptedCompletion::with_replies(["- Key fact one"]));
        let (status, body) = send(
            app_with(llm.clone(), false),
            Method::POST,
            "/api/generate",
            Some(json!({ "notes": "Summarise the memo", "selectedTypes": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outputs"][0]["outputType"], "outline");
        assert_eq!(body["output"], "- Key fact one");
        assert!(llm.requests()[0].messages[1]
            .content
            .contains("outline the key facts"));
    }

    #[tokio::test]
    async fn test_generate_uses_selected_types_and_model_overrides() {
        let llm = Arc::new(ScriptedCompletion::with_replies(["Investor letter."]));
        let (status, _) = send(
            app_with(llm.clone(), false),
            Method::POST,
            "/api/generate",
            Some(json!({
                "title": "Q2 letter",
                "selectedTypes": ["investor"],
                "modelId": "openai:gpt-4o",
                "temperature": 0.7,
                "maxTokens": 900
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let request = &llm.requests()[0];
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, 900);
        assert!(request.messages[1].content.contains("Audience: existing investors (LPs)."));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_request() {
        let llm = Arc::new(ScriptedCompletion::default());
        let (status, body) = send(
            app_with(llm.clone(), false),
            Method::POST,
            "/api/generate",
            Some(json!({ "title": "  ", "text": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generate_rejects_out_of_range_parameters() {
        let llm = Arc::new(ScriptedCompletion::default());
        for bad in [
            json!({ "title": "t", "temperature": 2.5 }),
            json!({ "title": "t", "maxTokens": 0 }),
            json!({ "title": "t", "wordLimit": 0 }),
            json!({ "title": "t", "wordLimit": 50, "wordLimitMode": "strict" }),
        ] {
            let (status, _) =
                send(app_with(llm.clone(), false), Method::POST, "/api/generate", Some(bad)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_bodies_use_error_envelope() {
        let llm = Arc::new(ScriptedCompletion::default());
        let cases = [
            (Some("application/json"), r#"{"title":"t","maxTokens":-1}"#),
            (Some("application/json"), r#"{"title":"t","temperature":"hot"}"#),
            (Some("application/json"), r#"{"title":"t""#),
            (None, r#"{"title":"t"}"#),
        ];
        for uri in ["/api/generate", "/api/rewrite"] {
            for (content_type, body) in cases {
                let (status, json) = send_raw(app_with(llm.clone(), false), uri, content_type, body).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
                assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
                assert!(json["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
            }
        }
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generate_accepts_largest_word_limit() {
        let llm = Arc::new(ScriptedCompletion::with_replies(["Short reply."]));
        let (status, body) = send_raw(
            app_with(llm, false),
            "/api/generate",
            Some("application/json"),
            r#"{"title":"t","outputTypes":["press"],"wordLimit":18446744073709551615}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outputs"][0]["text"], "Short reply.");
        assert_eq!(body["outputs"][0]["trimmed"], false);
    }

    #[tokio::test]
    async fn test_generate_llm_failure_is_502() {
        let llm = Arc::new(ScriptedCompletion::failing(500));
        let (status, body) = send(
            app_with(llm, false),
            Method::POST,
            "/api/generate",
            Some(json!({ "title": "t", "outputTypes": ["press"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_empty_completion_returns_placeholder_unscored() {
        let llm = Arc::new(ScriptedCompletion::with_replies([""]));
        let (status, body) = send(
            app_with(llm.clone(), true),
            Method::POST,
            "/api/generate",
            Some(json!({ "title": "t", "outputTypes": ["press"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outputs"][0]["text"], NO_CONTENT);
        assert!(body["outputs"][0]["score"].is_null());
        assert!(body["outputs"][0]["metrics"].is_null());
        // no scoring call was made
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_rewrite_validation_messages() {
        let llm = Arc::new(ScriptedCompletion::default());
        let (status, body) = send(
            app_with(llm.clone(), false),
            Method::POST,
            "/api/rewrite",
            Some(json!({ "outputType": "press_release" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Missing draft text to rewrite");

        let (status, body) = send(
            app_with(llm.clone(), false),
            Method::POST,
            "/api/rewrite",
            Some(json!({ "text": "A draft." })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Missing outputType");
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_trims_and_scores() {
        let llm = Arc::new(ScriptedCompletion::with_replies([
            "The Firm has exited Acme. The sale closes a seven year hold with strong returns.",
            r#"{"overall": 77, "clarity": 0.7, "accuracy": 0.9, "tone": 0.8, "structure": 0.6}"#,
        ]));
        let (status, body) = send(
            app_with(llm.clone(), true),
            Method::POST,
            "/api/rewrite",
            Some(json!({
                "text": "we sold acme, it went great",
                "notes": "More formal",
                "outputType": "press_release",
                "workspaceMode": "client",
                "scenario": "exit_realisation",
                "wordLimit": 5,
                "wordLimitMode": "hard"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let output = &body["outputs"][0];
        assert_eq!(output["outputType"], "press_release");
        assert_eq!(output["text"], "The Firm has exited Acme.");
        assert_eq!(output["wordCount"], 5);
        assert_eq!(output["trimmed"], true);
        assert_eq!(output["score"], 77.0);
        assert_eq!(output["metrics"]["structure"], 0.6);
        assert_eq!(body["workspaceMode"], "client");

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].max_tokens, 2048);
        assert!(requests[0].messages[0].content.contains("Client house rules"));
        assert!(requests[0].messages[1]
            .content
            .contains("existing draft of a client-branded press release"));
        assert!(requests[0].messages[1].content.contains("we sold acme, it went great"));
        // scoring sees the trimmed text
        assert!(requests[1].messages[1].content.contains("The Firm has exited Acme.\n"));
        assert_eq!(requests[1].temperature, 0.0);
    }

    #[tokio::test]
    async fn test_scoring_and_currency_can_be_disabled() {
        let llm = Arc::new(ScriptedCompletion::with_replies(["Raised $40m."]));
        let (status, body) = send(
            app_with(llm.clone(), true),
            Method::POST,
            "/api/rewrite",
            Some(json!({
                "text": "draft",
                "outputType": "linkedin_post",
                "normalizeCurrency": false,
                "score": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outputs"][0]["text"], "Raised $40m.");
        assert!(body["outputs"][0]["score"].is_null());
        assert_eq!(llm.requests().len(), 1);
    }
}
