//! Healthcare intake and triage tools.

use agentloop_core::error::ToolError;
use agentloop_core::message::Message;
use agentloop_core::tool::{ParamType, ToolRegistry};
use serde::{Deserialize, Serialize};

use crate::scenario::{Scenario, ScenarioInput};
use crate::simulated::{Param, SimulatedTool, register_all};

/// The patient being helped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    pub patient_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub insurance: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
}

const PATIENT_ID: &str = "Patient ID";

const TOOLS: &[SimulatedTool] = &[
    SimulatedTool {
        name: "assess_symptoms",
        description: "Assess patient symptoms and determine urgency level for triage.",
        params: &[
            Param::required("patient_id", PATIENT_ID),
            Param {
                name: "symptoms",
                param_type: ParamType::Array,
                description: "List of symptoms",
                required: false,
            },
            Param::optional("urgency", "Urgency level"),
        ],
        status: "symptoms_assessed",
    },
    SimulatedTool {
        name: "register_patient",
        description: "Register a new patient in the healthcare system.",
        params: &[
            Param::required("name", "Patient name"),
            Param::optional("date_of_birth", "Date of birth"),
            Param::optional("insurance_provider", "Insurance provider"),
        ],
        status: "patient_registered",
    },
    SimulatedTool {
        name: "schedule_appointment",
        description: "Schedule appointments for patients with healthcare providers.",
        params: &[
            Param::required("patient_id", PATIENT_ID),
            Param::required("appointment_type", "Type of appointment"),
            Param::optional("provider", "Healthcare provider"),
        ],
        status: "appointment_scheduled",
    },
    SimulatedTool {
        name: "verify_insurance",
        description: "Verify patient insurance coverage and eligibility.",
        params: &[
            Param::required("patient_id", PATIENT_ID),
            Param::required("insurance_provider", "Insurance provider"),
            Param::optional("policy_number", "Policy number"),
        ],
        status: "insurance_verified",
    },
    SimulatedTool {
        name: "update_medical_history",
        description: "Update patient medical history including medications, allergies, and family history.",
        params: &[Param::required("patient_id", PATIENT_ID)],
        status: "medical_history_updated",
    },
    SimulatedTool {
        name: "refer_specialist",
        description: "Refer patient to specialist for specialized care.",
        params: &[
            Param::required("patient_id", PATIENT_ID),
            Param::required("specialty", "Specialty"),
            Param::optional("reason", "Reason for referral"),
        ],
        status: "referral_created",
    },
    SimulatedTool {
        name: "prescribe_medication",
        description: "Prescribe or refill medications for patients.",
        params: &[
            Param::required("patient_id", PATIENT_ID),
            Param::required("medication", "Medication name"),
            Param::optional("dosage", "Dosage instructions"),
        ],
        status: "prescription_sent",
    },
    SimulatedTool {
        name: "send_patient_message",
        description: "Send a message or response to the patient.",
        params: &[
            Param::required("patient_id", PATIENT_ID),
            Param::required("message", "Message content"),
        ],
        status: "message_sent",
    },
];

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    register_all(registry, TOOLS)
}

pub struct HealthcareScenario;

impl Scenario for HealthcareScenario {
    type Context = Patient;

    const NAME: &'static str = "healthcare";
    const DESCRIPTION: &'static str = "Patient intake and triage: registration, appointments, referrals";

    fn registry() -> Result<ToolRegistry, ToolError> {
        let mut registry = ToolRegistry::new();
        register(&mut registry)?;
        Ok(registry)
    }

    fn system_prompt(patient: &Patient) -> String {
        let patient_json = serde_json::to_string(patient).unwrap_or_else(|_| "{}".into());
        format!(
            "You are a professional healthcare patient intake and triage specialist.\n\
             Your role is to help patients with: Registration, Triage, Appointments, History, Referrals.\n\
             When assisting patients:\n  \
             1) Call the appropriate healthcare tool based on their needs\n  \
             2) Follow up with send_patient_message to confirm actions taken\n\
             Always prioritize patient safety and ensure urgent cases are handled immediately.\n\n\
             PATIENT: {patient_json}"
        )
    }

    fn demo() -> ScenarioInput<Patient> {
        ScenarioInput {
            context: Patient {
                patient_id: "P100".into(),
                name: "Jane Doe".into(),
                age: Some(30),
                ..Patient::default()
            },
            messages: vec![Message::user("I need to see a doctor about a headache.")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn symptoms_are_a_list_of_strings() {
        let registry = HealthcareScenario::registry().unwrap();
        let assess = registry.resolve("assess_symptoms").unwrap();

        let schema = assess.schema.to_json_schema();
        assert_eq!(schema["properties"]["symptoms"]["type"], "array");
        assert_eq!(schema["properties"]["symptoms"]["items"]["type"], "string");
        assert_eq!(schema["required"], json!(["patient_id"]));

        let bad = assess
            .schema
            .validate_arguments(&json!({"patient_id": "P100", "symptoms": "headache"}))
            .unwrap_err();
        assert!(bad.contains("'symptoms'"));

        let out = assess
            .handler
            .call(json!({"patient_id": "P100", "symptoms": ["headache", "nausea"], "urgency": "low"}))
            .await
            .unwrap();
        assert_eq!(out, "symptoms_assessed");
    }

    #[test]
    fn prompt_embeds_patient_json() {
        let demo = HealthcareScenario::demo();
        let prompt = HealthcareScenario::system_prompt(&demo.context);
        assert!(prompt.starts_with("You are a professional healthcare patient intake"));
        assert!(prompt.ends_with(r#"PATIENT: {"patient_id":"P100","name":"Jane Doe","age":30}"#));
    }
}
