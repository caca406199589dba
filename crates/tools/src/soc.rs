//! Security operations center (SOC) triage tools.
//!
//! Threat-intel lookup, log search, triage, host isolation and the analyst
//! reply. All actions are simulated.

use agentloop_core::error::ToolError;
use agentloop_core::message::Message;
use agentloop_core::tool::{ParamType, ToolRegistry, ToolSchema};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scenario::{Scenario, ScenarioInput};

/// The incident under investigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub severity: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analyst: String,
}

#[derive(Debug, Deserialize)]
struct LookupThreatIntelArgs {
    indicator: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct QueryLogsArgs {
    query: String,
    log_index: String,
}

#[derive(Debug, Deserialize)]
struct TriageIncidentArgs {
    incident_id: String,
    decision: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct IsolateHostArgs {
    host_id: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct SendAnalystResponseArgs {
    #[serde(default)]
    incident_id: Option<String>,
    message: String,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry
        .register_fn(
            ToolSchema::new("lookup_threat_intel", "Threat Intel Lookup.")
                .required("indicator", ParamType::String, "IP, hash or URL")
                .required("type", ParamType::String, "Type of indicator"),
            |a: LookupThreatIntelArgs| async move {
                info!(indicator = %a.indicator, kind = %a.kind, "lookup_threat_intel");
                Ok("threat_intel_retrieved".to_string())
            },
        )?
        .register_fn(
            ToolSchema::new("query_logs", "Query security logs.")
                .required("query", ParamType::String, "Search query")
                .required("log_index", ParamType::String, "Index to search"),
            |a: QueryLogsArgs| async move {
                info!(query = %a.query, index = %a.log_index, "query_logs");
                Ok("log_query_executed".to_string())
            },
        )?
        .register_fn(
            ToolSchema::new("triage_incident", "Triage incident.")
                .required("incident_id", ParamType::String, "Incident ID")
                .required("decision", ParamType::String, "Decision")
                .required("reason", ParamType::String, "Reason"),
            |a: TriageIncidentArgs| async move {
                info!(incident_id = %a.incident_id, decision = %a.decision, reason = %a.reason, "triage_incident");
                Ok("incident_triaged".to_string())
            },
        )?
        .register_fn(
            ToolSchema::new("isolate_host", "Isolate compromised host.")
                .required("host_id", ParamType::String, "Host ID")
                .required("reason", ParamType::String, "Reason"),
            |a: IsolateHostArgs| async move {
                info!(host_id = %a.host_id, reason = %a.reason, "isolate_host");
                Ok("host_isolated".to_string())
            },
        )?
        .register_fn(
            ToolSchema::new("send_analyst_response", "Send analyst response.")
                .optional("incident_id", ParamType::String, "Incident ID")
                .required("message", ParamType::String, "Message content"),
            |a: SendAnalystResponseArgs| async move {
                info!(
                    incident_id = a.incident_id.as_deref().unwrap_or("-"),
                    message = %a.message,
                    "send_analyst_response"
                );
                Ok("analyst_response_sent".to_string())
            },
        )?;
    Ok(())
}

pub struct SocScenario;

impl Scenario for SocScenario {
    type Context = Incident;

    const NAME: &'static str = "soc";
    const DESCRIPTION: &'static str = "Security incident triage: threat intel, log search, isolation";

    fn registry() -> Result<ToolRegistry, ToolError> {
        let mut registry = ToolRegistry::new();
        register(&mut registry)?;
        Ok(registry)
    }

    fn system_prompt(incident: &Incident) -> String {
        let incident_json = serde_json::to_string(incident).unwrap_or_else(|_| "{}".into());
        format!(
            "You are a SOC analyst.\n\
             Roles: Threat Intel, Log Analysis, Triage, Host Isolation.\n\
             1) Use tools.\n\
             2) send_analyst_response.\n\n\
             INCIDENT: {incident_json}"
        )
    }

    fn demo() -> ScenarioInput<Incident> {
        ScenarioInput {
            context: Incident {
                incident_id: "INC-888".into(),
                severity: "high".into(),
                kind: "Malware".into(),
                ..Incident::default()
            },
            messages: vec![Message::user("Analyze this file hash: abc123def456")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incident_serializes_type_and_skips_empty_fields() {
        let json = serde_json::to_value(SocScenario::demo().context).unwrap();
        assert_eq!(
            json,
            json!({"incident_id": "INC-888", "severity": "high", "type": "Malware"})
        );
    }

    #[test]
    fn prompt_embeds_incident() {
        let prompt = SocScenario::system_prompt(&SocScenario::demo().context);
        assert!(prompt.starts_with("You are a SOC analyst."));
        assert!(prompt.contains(r#"INCIDENT: {"incident_id":"INC-888""#));
    }

    #[tokio::test]
    async fn analyst_response_incident_id_is_optional() {
        let registry = SocScenario::registry().unwrap();
        let tool = registry.resolve("send_analyst_response").unwrap();

        assert!(tool.schema.validate_arguments(&json!({"message": "Contained."})).is_ok());
        let out = tool.handler.call(json!({"message": "Contained."})).await.unwrap();
        assert_eq!(out, "analyst_response_sent");
    }

    #[tokio::test]
    async fn every_tool_returns_its_status() {
        let registry = SocScenario::registry().unwrap();
        let cases = [
            ("lookup_threat_intel", json!({"indicator": "abc123def456", "type": "hash"}), "threat_intel_retrieved"),
            ("query_logs", json!({"query": "hash:abc123def456", "log_index": "edr"}), "log_query_executed"),
            (
                "triage_incident",
                json!({"incident_id": "INC-888", "decision": "escalate", "reason": "known malware"}),
                "incident_triaged",
            ),
            ("isolate_host", json!({"host_id": "ws-042", "reason": "malware"}), "host_isolated"),
        ];
        for (name, args, expected) in cases {
            let out = registry.resolve(name).unwrap().handler.call(args).await.unwrap();
            assert_eq!(out, expected, "tool {name}");
        }
    }
}
