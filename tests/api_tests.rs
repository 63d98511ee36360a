mod common;

use axum::http::{Request, StatusCode};
use axum::body::Body;
use serde_json::json;
use tower::ServiceExt;

use common::{backend, backend_from, backend_with, body_json, get, post_json, MockModel, TWO_SUM};
use student_buddy::config::{RateLimitConfig, ServerConfig};
use student_buddy::error::UPSTREAM_USER_MESSAGE;
use student_buddy::routes::SECURITY_HEADERS;
use student_buddy::generator::FALLBACK_HINTS;

const ANALYZE: &str = "/api/v1/analyze-question";

fn two_sum_body() -> String {
  json!({ "questionText": TWO_SUM, "difficulty": "easy", "platform": "leetcode" }).to_string()
}

#[tokio::test]
async fn two_sum_gets_numbered_hints_and_pseudo_code() {
  let content = json!({
    "hints": [
      "Think about what you need to find for each element.",
      "A lookup structure could help you find complements quickly.",
      "Store each value with its index as you go.",
      "Check for the complement before inserting the current value."
    ],
    "pseudoCode": "seen = map\nfor i, x in nums:\n  if target - x in seen: return [seen[target - x], i]\n  seen[x] = i"
  })
  .to_string();
  let app = backend_with(MockModel::answering(content)).await;

  let res = app.oneshot(post_json(ANALYZE, &two_sum_body())).await.unwrap();
  assert_eq!(res.status(), StatusCode::OK);
  let v = body_json(res).await;

  assert_eq!(v["success"], true);
  let hints = v["data"]["hints"].as_array().unwrap();
  assert!((1..=6).contains(&hints.len()));
  for (i, h) in hints.iter().enumerate() {
    assert!(h.as_str().unwrap().starts_with(&format!("{}. ", i + 1)), "hint {} = {}", i, h);
  }
  assert!(!v["data"]["pseudoCode"].as_str().unwrap().is_empty());
  assert_eq!(v["data"]["metadata"]["hintsGenerated"], hints.len());
  assert!(v["data"]["metadata"]["analysisId"].as_str().is_some());
  assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn too_many_hints_are_capped_at_six() {
  let hints: Vec<String> = (1..=9).map(|i| format!("Step {}", i)).collect();
  let content = json!({ "hints": hints, "pseudoCode": "solve()" }).to_string();
  let app = backend_with(MockModel::answering(content)).await;

  let v = body_json(app.oneshot(post_json(ANALYZE, &two_sum_body())).await.unwrap()).await;
  assert_eq!(v["data"]["hints"].as_array().unwrap().len(), 6);
  assert_eq!(v["data"]["hints"][5], "6. Step 6");
}

#[tokio::test]
async fn short_question_is_rejected() {
  let app = backend("http://127.0.0.1:1", Some("unused"));
  let res = app.oneshot(post_json(ANALYZE, r#"{"questionText":"short"}"#)).await.unwrap();
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);

  let v = body_json(res).await;
  assert_eq!(v["success"], false);
  assert_eq!(v["error"], "Invalid input");
  assert_eq!(v["details"][0]["field"], "questionText");
  assert_eq!(v["details"][0]["message"], "Question text must be at least 10 characters long");
}

#[tokio::test]
async fn every_violation_is_reported() {
  let app = backend("http://127.0.0.1:1", Some("unused"));
  let body = json!({ "difficulty": "impossible", "platform": "myspace" }).to_string();
  let v = body_json(app.oneshot(post_json(ANALYZE, &body)).await.unwrap()).await;

  let fields: Vec<&str> = v["details"].as_array().unwrap().iter().map(|d| d["field"].as_str().unwrap()).collect();
  assert_eq!(fields, vec!["questionText", "difficulty", "platform"]);
}

#[tokio::test]
async fn malformed_json_is_a_json_400() {
  let app = backend("http://127.0.0.1:1", Some("unused"));
  let res = app.oneshot(post_json(ANALYZE, "{\"questionText\": ")).await.unwrap();
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  let v = body_json(res).await;
  assert_eq!(v["success"], false);
  assert_eq!(v["details"][0]["field"], "body");
}

#[tokio::test]
async fn markup_only_question_fails_preprocessing() {
  let app = backend("http://127.0.0.1:1", Some("unused"));
  let body = json!({ "questionText": "<div><span><b>hi</b></span></div>" }).to_string();
  let res = app.oneshot(post_json(ANALYZE, &body)).await.unwrap();
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  let v = body_json(res).await;
  assert_eq!(v["error"], "Unable to process question");
  assert_eq!(v["message"], "Question text is too short after preprocessing");
}

#[tokio::test]
async fn unparsable_model_output_falls_back() {
  let app = backend_with(MockModel::answering("Sure! Here are some hints: ...")).await;
  let res = app.oneshot(post_json(ANALYZE, &two_sum_body())).await.unwrap();
  assert_eq!(res.status(), StatusCode::OK);

  let v = body_json(res).await;
  let hints: Vec<&str> = v["data"]["hints"].as_array().unwrap().iter().map(|h| h.as_str().unwrap()).collect();
  assert_eq!(hints, FALLBACK_HINTS.to_vec());
  assert!(v["data"]["pseudoCode"].as_str().unwrap().contains("function solve"));
}

#[tokio::test]
async fn fenced_pseudo_code_is_unwrapped() {
  let content = json!({
    "hints": ["1. Sort", "2. Two pointers", "3. Move inward"],
    "pseudoCode": "```python\nsort(a)\nwhile l < r: step()\n```"
  })
  .to_string();
  let app = backend_with(MockModel::answering(content)).await;

  let v = body_json(app.oneshot(post_json(ANALYZE, &two_sum_body())).await.unwrap()).await;
  assert_eq!(v["data"]["pseudoCode"], "sort(a)\nwhile l < r: step()");
  assert_eq!(v["data"]["hints"][1], "2. Two pointers");
}

#[tokio::test]
async fn upstream_failure_is_503_without_detail() {
  let app = backend_with(MockModel::failing(StatusCode::INTERNAL_SERVER_ERROR)).await;
  let res = app.oneshot(post_json(ANALYZE, &two_sum_body())).await.unwrap();
  assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

  let v = body_json(res).await;
  assert_eq!(v["error"], "Unable to generate hints right now");
  assert_eq!(v["message"], UPSTREAM_USER_MESSAGE);
  assert!(!v.to_string().contains("mock upstream failure"));
}

#[tokio::test]
async fn missing_api_key_is_503() {
  let app = backend("http://127.0.0.1:1", None);
  let res = app.oneshot(post_json(ANALYZE, &two_sum_body())).await.unwrap();
  assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_lists_endpoints() {
  let app = backend("http://127.0.0.1:1", None);
  let res = app.oneshot(get("/api/v2/nope")).await.unwrap();
  assert_eq!(res.status(), StatusCode::NOT_FOUND);

  let v = body_json(res).await;
  assert_eq!(v["error"], "Route not found");
  assert_eq!(v["message"], "Cannot GET /api/v2/nope");
  assert!(v["availableEndpoints"].is_object());
}

#[tokio::test]
async fn docs_health_and_root_answer() {
  let app = backend("http://127.0.0.1:1", None);

  let v = body_json(app.clone().oneshot(get(ANALYZE)).await.unwrap()).await;
  assert_eq!(v["endpoint"], "POST /api/v1/analyze-question");

  let res = app.clone().oneshot(get("/health")).await.unwrap();
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(body_json(res).await["status"], "ok");

  let v = body_json(app.oneshot(get("/")).await.unwrap()).await;
  assert_eq!(v["message"], "Student Buddy Backend API");
}

#[tokio::test]
async fn model_probe_reports_status() {
  let app = backend("http://127.0.0.1:1", None);
  let v = body_json(app.oneshot(get("/health/model")).await.unwrap()).await;
  assert_eq!(v["status"], "misconfigured");

  let app = backend_with(MockModel::answering("{}")).await;
  let v = body_json(app.oneshot(get("/health/model")).await.unwrap()).await;
  assert_eq!(v["status"], "healthy");
}

#[tokio::test]
async fn cors_allows_extensions_only() {
  let app = backend("http://127.0.0.1:1", None);

  let req = Request::builder()
    .uri("/health")
    .header("origin", "chrome-extension://abcdefghijklmnop")
    .body(Body::empty())
    .unwrap();
  let res = app.clone().oneshot(req).await.unwrap();
  assert_eq!(
    res.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
    Some("chrome-extension://abcdefghijklmnop")
  );

  let req = Request::builder().uri("/health").header("origin", "https://evil.example").body(Body::empty()).unwrap();
  let res = app.oneshot(req).await.unwrap();
  assert!(res.headers().get("access-control-allow-origin").is_none());
}

fn from_ip(uri: &str, ip: &str) -> Request<Body> {
  Request::builder().uri(uri).header("x-forwarded-for", ip).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn client_over_budget_gets_429() {
  let app = backend_from(ServerConfig {
    rate_limit: RateLimitConfig { max_requests: 3, window: std::time::Duration::from_secs(900) },
    ..ServerConfig::default()
  });

  for _ in 0..3 {
    let res = app.clone().oneshot(from_ip("/health", "198.51.100.4")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }

  let res = app.clone().oneshot(from_ip("/health", "198.51.100.4")).await.unwrap();
  assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
  assert_eq!(res.headers().get("retry-after").and_then(|v| v.to_str().ok()), Some("900"));
  assert_eq!(res.headers().get("x-content-type-options").and_then(|v| v.to_str().ok()), Some("nosniff"));
  let v = body_json(res).await;
  assert_eq!(v["success"], false);
  assert_eq!(v["message"], "Too many requests, please try again later.");

  // other clients keep their own budget
  let res = app.oneshot(from_ip("/health", "198.51.100.5")).await.unwrap();
  assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn security_headers_on_every_response() {
  let app = backend("http://127.0.0.1:1", None);
  for uri in ["/health", ANALYZE, "/missing"] {
    let res = app.clone().oneshot(get(uri)).await.unwrap();
    for (name, value) in SECURITY_HEADERS {
      assert_eq!(res.headers().get(name).and_then(|v| v.to_str().ok()), Some(value), "{} on {}", name, uri);
    }
  }
}
