//! `OpenAiChat` and `ToolAgent` against a local chat completions endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tradekit_agents::{LanguageModel, OpenAiChat, ToolAgent};
use tradekit_broker::test_support::MockBrokerage;
use tradekit_models::agent::{AgentDefinition, AnalysisState};
use tradekit_models::decision::Recommendation;
use tradekit_tools::{register_broker_tools, BrokerToolset, ToolRegistry};

async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");

    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let content = if system.contains("momentum") {
        "```json\n{\"recommendation\": \"SELL\", \"confidence\": 0.65, \"reasoning\": \"overextended\", \"suggested_allocation\": 0.1}\n```"
    } else {
        "pong"
    };

    Ok(Json(json!({
        "id": "chatcmpl-1",
        "model": body["model"],
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })))
}

async fn start_fake_openai() -> SocketAddr {
    let app = Router::new().route("/v1/chat/completions", post(completions));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn chat(addr: SocketAddr, key: &str) -> OpenAiChat {
    OpenAiChat::new(
        reqwest::Client::new(),
        &format!("http://{addr}"),
        Some(key.to_string()),
        "gpt-4o",
    )
}

#[tokio::test]
async fn completion_returns_first_choice() {
    let addr = start_fake_openai().await;
    let reply = chat(addr, "sk-test").complete("be brief", "ping").await.unwrap();
    assert_eq!(reply, "pong");
}

#[tokio::test]
async fn rejected_key_is_an_http_error() {
    let addr = start_fake_openai().await;
    let err = chat(addr, "sk-wrong").complete("be brief", "ping").await.unwrap_err();
    assert!(matches!(err, tradekit_agents::AgentError::Http(_)));
}

#[tokio::test]
async fn tool_agent_end_to_end() {
    let addr = start_fake_openai().await;
    let mut registry = ToolRegistry::new(Arc::new(BrokerToolset::new(Arc::new(MockBrokerage::new()))));
    register_broker_tools(&mut registry);

    let definition = AgentDefinition {
        name: "fader".to_string(),
        description: "a momentum fader".to_string(),
        model: "gpt-4o".to_string(),
        tools: vec!["get_account".to_string()],
        system_prompt: None,
    };
    let agent = ToolAgent::new(definition, Arc::new(registry), Arc::new(chat(addr, "sk-test")));

    let analysis = agent.analyze(&AnalysisState::default()).await;
    assert_eq!(analysis.recommendation, Recommendation::Sell);
    assert_eq!(analysis.confidence, dec!(0.65));
    assert_eq!(analysis.suggested_allocation, dec!(0.1));
    assert_eq!(analysis.tool_results["get_account"]["cash"], "100000");
}
