//! End-to-end scenario runs with a scripted model: the bundled tool sets
//! driven through the full conversation loop.

use std::sync::Arc;

use agentloop_agent::scripted::{text_response, tool_response};
use agentloop_agent::{AgentLoop, ExecutionMode, ScriptedInvoker};
use agentloop_core::message::{Conversation, Role, ToolInvocation};
use agentloop_tools::{
    EcommerceScenario, FinancialServicesScenario, HealthcareScenario, Scenario, SocScenario, SupplyChainScenario,
    WeatherScenario,
};
use serde_json::json;

fn build<S: Scenario>(invoker: Arc<ScriptedInvoker>) -> AgentLoop<S::Context> {
    let prompt: fn(&S::Context) -> String = S::system_prompt;
    AgentLoop::new(invoker, Arc::new(S::registry().unwrap()), prompt, "scripted-model")
}

fn seeded<C>(input: &agentloop_tools::ScenarioInput<C>) -> Conversation {
    let mut conv = Conversation::new();
    for m in &input.messages {
        conv.push(m.clone());
    }
    conv
}

// ── E-commerce ───────────────────────────────────────────────────────────

#[tokio::test]
async fn ecommerce_refund_then_confirmation() {
    let invoker = Arc::new(ScriptedInvoker::new(vec![
        Ok(tool_response(vec![ToolInvocation::new(
            "call_refund",
            "issue_refund",
            json!({"order_id": "A12345", "amount": 19.99}),
        )])),
        Ok(tool_response(vec![ToolInvocation::new(
            "call_msg",
            "send_customer_message",
            json!({"order_id": "A12345", "text": "Your refund of $19.99 is on its way."}),
        )])),
        Ok(text_response("Refund issued and customer notified.")),
    ]));
    let agent = build::<EcommerceScenario>(invoker.clone());
    let demo = EcommerceScenario::demo();
    let mut conv = seeded(&demo);

    let completion = agent.run(&mut conv, &demo.context).await.unwrap();

    assert_eq!(completion.rounds, 2);
    assert_eq!(completion.answer, "Refund issued and customer notified.");

    let tool_results: Vec<_> = conv
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(tool_results, ["refund_queued", "sent"]);

    // The order record reached the model through the system prompt.
    let first_request = &invoker.requests()[0];
    assert!(first_request.messages[0].content.contains("\"order_id\":\"A12345\""));
    assert_eq!(first_request.tools.len(), 4);
}

#[tokio::test]
async fn ecommerce_bad_refund_is_reported_to_the_model() {
    let invoker = Arc::new(ScriptedInvoker::new(vec![
        Ok(tool_response(vec![ToolInvocation::new(
            "call_refund",
            "issue_refund",
            json!({"order_id": "A12345", "amount": -5}),
        )])),
        Ok(text_response("I could not issue that refund.")),
    ]));
    let agent = build::<EcommerceScenario>(invoker);
    let demo = EcommerceScenario::demo();
    let mut conv = seeded(&demo);

    agent.run(&mut conv, &demo.context).await.unwrap();

    let tool_msg = conv.messages.iter().find(|m| m.role == Role::Tool).unwrap();
    assert!(tool_msg.content.starts_with("Error: refund amount must be positive"));
}

// ── SOC ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn soc_parallel_investigation() {
    let invoker = Arc::new(ScriptedInvoker::new(vec![
        Ok(tool_response(vec![
            ToolInvocation::new("t1", "lookup_threat_intel", json!({"indicator": "abc123def456", "type": "hash"})),
            ToolInvocation::new("t2", "query_logs", json!({"query": "abc123def456", "log_index": "edr"})),
        ])),
        Ok(tool_response(vec![ToolInvocation::new(
            "t3",
            "send_analyst_response",
            json!({"message": "Hash is known malware; host isolation recommended."}),
        )])),
        Ok(text_response("Analysis complete.")),
    ]));
    let agent = build::<SocScenario>(invoker).with_execution_mode(ExecutionMode::Concurrent);
    let demo = SocScenario::demo();
    let mut conv = seeded(&demo);

    let completion = agent.run(&mut conv, &demo.context).await.unwrap();

    assert_eq!(completion.rounds, 2);
    let ids: Vec<_> = conv
        .messages
        .iter()
        .filter_map(|m| m.tool_invocation_id.as_deref())
        .collect();
    assert_eq!(ids, ["t1", "t2", "t3"]);
    assert!(conv.validate().is_ok());
}

// ── Weather ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn weather_answer_uses_tool_output() {
    let invoker = Arc::new(ScriptedInvoker::from_fn(|req| {
        match req.messages.iter().rev().find(|m| m.role == Role::Tool) {
            Some(result) => Ok(text_response(&result.content)),
            None => Ok(tool_response(vec![ToolInvocation::new(
                "w1",
                "get_weather",
                json!({"city": "sydney"}),
            )])),
        }
    }));
    let agent = build::<WeatherScenario>(invoker);
    let mut conv = seeded(&WeatherScenario::demo());

    let completion = agent.run(&mut conv, &()).await.unwrap();
    assert_eq!(completion.answer, "The current weather in Sydney is 75°F and sunny.");
}

// ── Financial services, healthcare, supply chain ─────────────────────────

#[tokio::test]
async fn financial_credit_limit_then_confirmation() {
    let invoker = Arc::new(ScriptedInvoker::new(vec![
        Ok(tool_response(vec![ToolInvocation::new(
            "f1",
            "increase_credit_limit",
            json!({"account_id": "ACC123", "current_limit": "5000", "requested_limit": "8000"}),
        )])),
        Ok(tool_response(vec![ToolInvocation::new(
            "f2",
            "send_customer_response",
            json!({"customer_id": "CUST999", "message": "Your new limit is $8,000."}),
        )])),
        Ok(text_response("Credit limit raised.")),
    ]));
    let agent = build::<FinancialServicesScenario>(invoker.clone());
    let demo = FinancialServicesScenario::demo();
    let mut conv = seeded(&demo);

    let completion = agent.run(&mut conv, &demo.context).await.unwrap();

    assert_eq!(completion.rounds, 2);
    let tool_results: Vec<_> = conv
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(tool_results, ["credit_limit_updated", "message_sent"]);
    assert!(invoker.requests()[0].messages[0].content.contains("\"account_id\":\"ACC123\""));
}

#[tokio::test]
async fn healthcare_missing_required_argument_is_reported() {
    let invoker = Arc::new(ScriptedInvoker::new(vec![
        Ok(tool_response(vec![ToolInvocation::new(
            "h1",
            "schedule_appointment",
            json!({"patient_id": "P100"}),
        )])),
        Ok(text_response("Which kind of appointment do you need?")),
    ]));
    let agent = build::<HealthcareScenario>(invoker);
    let demo = HealthcareScenario::demo();
    let mut conv = seeded(&demo);

    let completion = agent.run(&mut conv, &demo.context).await.unwrap();

    assert_eq!(completion.answer, "Which kind of appointment do you need?");
    let tool_msg = conv.messages.iter().find(|m| m.role == Role::Tool).unwrap();
    assert!(tool_msg.content.starts_with("Error:"));
    assert!(tool_msg.content.contains("appointment_type"));
}

#[tokio::test]
async fn supply_chain_advertises_all_tools() {
    let invoker = Arc::new(ScriptedInvoker::new(vec![
        Ok(tool_response(vec![
            ToolInvocation::new("s1", "manage_inventory", json!({"sku": "ITEM-X"})),
            ToolInvocation::new("s2", "send_logistics_response", json!({"message": "Reorder placed."})),
        ])),
        Ok(text_response("Reorder placed for Item X.")),
    ]));
    let agent = build::<SupplyChainScenario>(invoker.clone());
    let demo = SupplyChainScenario::demo();
    let mut conv = seeded(&demo);

    agent.run(&mut conv, &demo.context).await.unwrap();

    assert_eq!(invoker.requests()[0].tools.len(), 16);
    let tool_results: Vec<_> = conv
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(tool_results, ["inventory_management_initiated", "logistics_response_sent"]);
}
