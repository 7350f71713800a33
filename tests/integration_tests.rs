// tests/integration_tests.rs
use actix_web::{test, web, App};
use agent_eval::api::{configure_routes, AppState};
use agent_eval::config::{AppConfig, EvalSettings, GeminiConfig};
use mockito::{Matcher, Server};
use serde_json::{json, Value};

const API_KEY: &str = "test-key";

fn app_config(api_base: &str) -> AppConfig {
    AppConfig {
        gemini: GeminiConfig {
            api_base: api_base.to_string(),
            api_key: API_KEY.to_string(),
        },
        settings: EvalSettings::without_delays(),
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

fn gemini_reply(text: &str, prompt_tokens: u64, output_tokens: u64) -> String {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP",
            "safetyRatings": [
                {"category": "HARM_CATEGORY_HATE_SPEECH", "probability": "NEGLIGIBLE"},
                {"category": "HARM_CATEGORY_HARASSMENT", "probability": "LOW"}
            ]
        }],
        "usageMetadata": {
            "promptTokenCount": prompt_tokens,
            "candidatesTokenCount": output_tokens,
            "totalTokenCount": prompt_tokens + output_tokens
        }
    })
    .to_string()
}

fn generate_path(model: &str) -> String {
    format!("/v1beta/models/{}:generateContent", model)
}

macro_rules! app_for {
    ($server:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(app_config(&$server.url()))))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_root_and_health() {
    let server = Server::new_async().await;
    let app = app_for!(server);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "AI Agent Evaluation Dashboard API");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_evaluate_returns_pass_at_k() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", generate_path("gemini-1.5-flash").as_str())
        .match_header("x-goog-api-key", API_KEY)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"parts": [{"text": "Summarize the patient notes"}]}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply("Patient Diagnosis: flu", 5, 7))
        .expect(3)
        .create_async()
        .await;
    let app = app_for!(server);

    let req = test::TestRequest::post()
        .uri("/evaluate")
        .set_json(json!({"task": "Summarize the patient notes", "expected_output": "diagnosis"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total_runs"], 3);
    assert_eq!(body["pass_at_k"], 100.0);
    assert_eq!(body["success_rate"], body["pass_at_k"]);

    let runs = body["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 3);
    for (i, run) in runs.iter().enumerate() {
        assert_eq!(run["run_number"], i + 1);
        assert_eq!(run["response_text"], "Patient Diagnosis: flu");
        assert_eq!(run["token_count"], 12);
        assert_eq!(run["success"], true);
        assert_eq!(run["safety_ratings"]["HARM_CATEGORY_HARASSMENT"], "LOW");
        assert!(run["latency_ms"].as_f64().unwrap() >= 0.0);
        assert_eq!(run["timestamp"].as_str().unwrap().len(), "2024-01-01 00:00:00".len());
    }

    mock.assert_async().await;
}

#[actix_web::test]
async fn test_evaluate_reports_failed_matches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", generate_path("gemini-1.5-flash").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply("Patient summary: flu", 1, 1))
        .expect(2)
        .create_async()
        .await;
    let app = app_for!(server);

    let req = test::TestRequest::post()
        .uri("/evaluate")
        .set_json(json!({"task": "Summarize", "expected_output": "diagnosis", "k": 2}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["pass_at_k"], 0.0);
    assert!(body["runs"].as_array().unwrap().iter().all(|r| r["success"] == false));
    mock.assert_async().await;
}

#[actix_web::test]
async fn test_evaluate_rejects_invalid_input_without_calling_provider() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let app = app_for!(server);

    let cases = [
        (json!({"task": "Task", "k": 0}), "k must be between 1 and 10"),
        (json!({"task": "Task", "k": 11}), "k must be between 1 and 10"),
        (json!({"task": "   "}), "task cannot be empty"),
    ];
    for (payload, detail) in cases {
        let req = test::TestRequest::post().uri("/evaluate").set_json(payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], detail);
    }

    let req = test::TestRequest::post()
        .uri("/ab-test")
        .set_json(json!({"task": "Task", "runs_per_model": 11}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "runs_per_model must be between 1 and 10");

    let req = test::TestRequest::post()
        .uri("/evaluate")
        .set_json(json!({"k": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid request body"));

    mock.assert_async().await;
}

#[actix_web::test]
async fn test_evaluate_surfaces_provider_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", generate_path("gemini-1.5-flash").as_str())
        .with_status(429)
        .with_body("quota exceeded")
        .expect(1)
        .create_async()
        .await;
    let app = app_for!(server);

    let req = test::TestRequest::post()
        .uri("/evaluate")
        .set_json(json!({"task": "Task", "k": 5}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "Error during evaluation: API request failed with status 429: quota exceeded"
    );
    assert!(body.get("runs").is_none());
    mock.assert_async().await;
}

#[actix_web::test]
async fn test_evaluate_rejects_undecodable_reply() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", generate_path("gemini-1.5-flash").as_str())
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>maintenance</html>")
        .expect(1)
        .create_async()
        .await;
    let app = app_for!(server);

    let req = test::TestRequest::post()
        .uri("/evaluate")
        .set_json(json!({"task": "Task", "k": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(
        detail.starts_with("Error during evaluation: Could not decode Gemini response: "),
        "unexpected detail: {detail}"
    );
    assert!(body.get("runs").is_none());
    mock.assert_async().await;
}

#[actix_web::test]
async fn test_ab_test_compares_three_models_in_order() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for (model, tokens) in [
        ("gemini-1.5-flash-8b", 10),
        ("gemini-1.5-flash", 20),
        ("gemini-1.5-pro", 30),
    ] {
        let mock = server
            .mock("POST", generate_path(model).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply(model, tokens, 0))
            .expect(2)
            .create_async()
            .await;
        mocks.push(mock);
    }
    let app = app_for!(server);

    let req = test::TestRequest::post()
        .uri("/ab-test")
        .set_json(json!({"task": "Write a haiku", "runs_per_model": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let models = body["models"].as_array().unwrap();
    let names: Vec<&str> = models.iter().map(|m| m["model_name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec![
            "Gemini 1.5 Flash 8B (Fast)",
            "Gemini 1.5 Flash (Balanced)",
            "Gemini 1.5 Pro (Quality)",
        ]
    );
    for (model, expected_tokens) in models.iter().zip([10.0, 20.0, 30.0]) {
        assert_eq!(model["success_rate"], 100.0);
        assert_eq!(model["average_tokens"], expected_tokens);
        assert_eq!(model["runs"].as_array().unwrap().len(), 2);
    }

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[actix_web::test]
async fn test_ab_test_aborts_on_model_failure() {
    let mut server = Server::new_async().await;
    let fast = server
        .mock("POST", generate_path("gemini-1.5-flash-8b").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply("ok", 1, 1))
        .expect(1)
        .create_async()
        .await;
    let balanced = server
        .mock("POST", generate_path("gemini-1.5-flash").as_str())
        .with_status(500)
        .with_body("internal")
        .expect(1)
        .create_async()
        .await;
    let quality = server
        .mock("POST", generate_path("gemini-1.5-pro").as_str())
        .expect(0)
        .create_async()
        .await;
    let app = app_for!(server);

    let req = test::TestRequest::post()
        .uri("/ab-test")
        .set_json(json!({"task": "Task", "runs_per_model": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "Error testing model Gemini 1.5 Flash (Balanced): API request failed with status 500: internal"
    );
    assert!(body.get("models").is_none());

    fast.assert_async().await;
    balanced.assert_async().await;
    quality.assert_async().await;
}
