//! HTTP surface driven through `tower::ServiceExt::oneshot`, backed by the
//! in-memory brokerage and a scripted model.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tradekit::models::config::{ToolsConfig, TradekitConfig};
use tradekit::{build_registry, server, AppContext};
use tradekit_agents::test_support::{ScriptedModel, StaticModels};
use tradekit_broker::test_support::MockBrokerage;

struct Harness {
    app: Router,
    model: Arc<ScriptedModel>,
    models: Arc<StaticModels>,
}

fn harness_with(broker: MockBrokerage, reply: &str) -> Harness {
    let model = Arc::new(ScriptedModel::replying(reply));
    let models = Arc::new(StaticModels::new(model.clone()));
    let registry = build_registry(Arc::new(broker), &ToolsConfig::default());
    let ctx = AppContext::new(Arc::new(registry), models.clone(), TradekitConfig::default());
    Harness {
        app: server::router(Arc::new(ctx)),
        model,
        models,
    }
}

fn harness(reply: &str) -> Harness {
    harness_with(MockBrokerage::new(), reply)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).to_string())
    });
    (status, value)
}

#[tokio::test]
async fn health() {
    let h = harness("");
    let (status, body) = send(&h.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn lists_tools_and_categories() {
    let h = harness("");
    let (status, body) = send(&h.app, Method::GET, "/api/tools/", None).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body.as_array().unwrap();
    assert_eq!(tools.len(), 11);
    assert_eq!(tools[0]["name"], "get_account");
    assert!(tools[0].get("kind").is_none());

    let (_, categories) = send(&h.app, Method::GET, "/api/tools/categories", None).await;
    let trading = categories["alpaca_trading"].as_array().unwrap();
    assert_eq!(trading.len(), 4);
    assert_eq!(trading[0]["parameters"][0]["type"], "string");
}

#[tokio::test]
async fn schema_route() {
    let h = harness("");
    let (status, schema) = send(&h.app, Method::GET, "/api/tools/schema/get_orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schema["parameters"]["required"], json!([]));
    assert_eq!(schema["parameters"]["properties"]["limit"]["default"], 50);

    let (status, body) = send(&h.app, Method::GET, "/api/tools/schema/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Tool nope not found");
}

#[tokio::test]
async fn execute_success_and_validation_failures() {
    let h = harness("");
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/execute",
        Some(json!({"tool_name": "get_clock", "parameters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["is_open"], true);

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/execute",
        Some(json!({"tool_name": "get_latest_quote", "parameters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"],
        "Required parameter 'symbol' missing for tool get_latest_quote"
    );

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/tools/execute",
        Some(json!({"tool_name": "launch_rocket", "parameters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn execute_failure_is_500() {
    let h = harness_with(MockBrokerage::unconfigured(), "");
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/execute",
        Some(json!({"tool_name": "get_account", "parameters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("credentials not set"));
}

#[tokio::test]
async fn agent_lifecycle() {
    let h = harness("I think we should wait");

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/agents",
        Some(json!({
            "name": "scout",
            "description": "a momentum trader",
            "model": "claude-3-5-haiku-latest",
            "tools": ["get_account", "get_clock"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["agent"],
        json!({
            "name": "scout",
            "description": "a momentum trader",
            "model": "claude-3-5-haiku-latest",
            "tools": ["get_account", "get_clock"]
        })
    );

    let (_, listed) = send(&h.app, Method::GET, "/api/tools/agents", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/agents/scout/analyze",
        Some(json!({"market_data": {"AAPL": 190.1}, "news_summary": "quiet"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["recommendation"], "HOLD");
    assert_eq!(body["analysis"]["confidence"], "0.5");
    assert_eq!(body["analysis"]["reasoning"], "I think we should wait");
    assert_eq!(
        *h.models.requested.lock().unwrap(),
        vec!["claude-3-5-haiku-latest".to_string()]
    );
    assert!(h.model.last_user_prompt().unwrap().contains("quiet"));

    let (status, body) = send(&h.app, Method::DELETE, "/api/tools/agents/scout", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Agent scout deleted");

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/tools/agents/scout/analyze",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn agent_with_unknown_tool_is_rejected() {
    let h = harness("");
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/agents",
        Some(json!({"name": "bad", "description": "x", "tools": ["get_clock", "teleport"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Tool teleport not found");

    let (_, listed) = send(&h.app, Method::GET, "/api/tools/agents", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn deleting_unknown_agent_is_not_found() {
    let h = harness("");
    let (status, body) = send(&h.app, Method::DELETE, "/api/tools/agents/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Agent ghost not found");
}

#[tokio::test]
async fn portfolio_decisions_route() {
    let h = harness(
        r#"{"decisions": {"AAPL": {"action": "sell", "quantity": 2, "confidence": 55, "reasoning": "trim"}}}"#,
    );
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/portfolio/decisions",
        Some(json!({
            "tickers": ["AAPL", "NVDA"],
            "risk": {"AAPL": {"remaining_position_limit": 5000, "current_price": 190}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decisions"]["AAPL"]["action"], "sell");
    assert_eq!(body["decisions"]["AAPL"]["quantity"], 2);
    assert_eq!(body["decisions"]["NVDA"]["action"], "hold");
    assert_eq!(*h.models.requested.lock().unwrap(), vec!["gpt-4o".to_string()]);
}

#[tokio::test]
async fn portfolio_decisions_read_risk_from_analyst_signals() {
    let h = harness("Holding everything for now");
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/tools/portfolio/decisions",
        Some(json!({
            "tickers": ["AAPL"],
            "analyst_signals": {
                "technical_analyst": {"AAPL": {"signal": "bullish", "confidence": 80}},
                "risk_management_agent": {
                    "AAPL": {"remaining_position_limit": 1000, "current_price": 100}
                }
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decisions"]["AAPL"]["action"], "hold");
    assert_eq!(body["decisions"]["AAPL"]["reasoning"], "Holding everything for now");

    let prompt = h.model.last_user_prompt().unwrap();
    assert!(prompt.contains("\"AAPL\": 10"));
    assert!(prompt.contains("technical_analyst"));
    assert!(!prompt.contains("risk_management_agent"));
}
