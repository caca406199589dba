//! Financial services tools: fraud checks, loans, disputes, credit limits.

use agentloop_core::error::ToolError;
use agentloop_core::message::Message;
use agentloop_core::tool::ToolRegistry;
use serde::{Deserialize, Serialize};

use crate::scenario::{Scenario, ScenarioInput};
use crate::simulated::{Param, SimulatedTool, register_all};

/// The customer account a banking conversation is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub account_id: String,
    pub customer_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

const ACCOUNT_ID: &str = "Account ID";
const CUSTOMER_ID: &str = "Customer ID";

const TOOLS: &[SimulatedTool] = &[
    SimulatedTool {
        name: "investigate_transaction",
        description: "Investigate suspicious transactions, fraud alerts, or security concerns.",
        params: &[
            Param::optional("account_id", ACCOUNT_ID),
            Param::optional("customer_id", CUSTOMER_ID),
            Param::optional("alert_type", "Type of alert"),
        ],
        status: "investigation_initiated",
    },
    SimulatedTool {
        name: "freeze_account",
        description: "Freeze account to prevent unauthorized access or transactions.",
        params: &[
            Param::required("account_id", ACCOUNT_ID),
            Param::required("reason", "Reason for freeze"),
            Param::optional("freeze_type", "Type of freeze"),
        ],
        status: "account_frozen",
    },
    SimulatedTool {
        name: "process_loan_application",
        description: "Process loan applications including personal, business, mortgage, and auto loans.",
        params: &[
            Param::required("customer_id", CUSTOMER_ID),
            Param::required("loan_type", "Type of loan"),
            Param::optional("loan_amount", "Amount requested"),
        ],
        status: "application_submitted",
    },
    SimulatedTool {
        name: "resolve_dispute",
        description: "Handle disputes including unauthorized charges, fees, and credit report errors.",
        params: &[
            Param::optional("account_id", ACCOUNT_ID),
            Param::optional("customer_id", CUSTOMER_ID),
            Param::optional("dispute_type", "Type of dispute"),
        ],
        status: "dispute_filed",
    },
    SimulatedTool {
        name: "rebalance_portfolio",
        description: "Manage investment portfolios, retirement planning, and asset allocation.",
        params: &[Param::required("customer_id", CUSTOMER_ID)],
        status: "portfolio_updated",
    },
    SimulatedTool {
        name: "increase_credit_limit",
        description: "Process credit limit increase requests.",
        params: &[
            Param::required("account_id", ACCOUNT_ID),
            Param::required("current_limit", "Current limit"),
            Param::required("requested_limit", "Requested limit"),
        ],
        status: "credit_limit_updated",
    },
    SimulatedTool {
        name: "verify_documents",
        description: "Verify customer documents for various banking services.",
        params: &[Param::required("customer_id", CUSTOMER_ID)],
        status: "documents_verified",
    },
    SimulatedTool {
        name: "update_account",
        description: "Update account information, add joint holders, close accounts, etc.",
        params: &[
            Param::optional("account_id", ACCOUNT_ID),
            Param::optional("customer_id", CUSTOMER_ID),
        ],
        status: "account_updated",
    },
    SimulatedTool {
        name: "process_transaction",
        description: "Process various transactions like currency exchange, transfers, etc.",
        params: &[
            Param::required("customer_id", CUSTOMER_ID),
            Param::required("transaction_type", "Type of transaction"),
        ],
        status: "transaction_processed",
    },
    SimulatedTool {
        name: "send_customer_response",
        description: "Send a response message to the customer.",
        params: &[
            Param::required("customer_id", CUSTOMER_ID),
            Param::required("message", "Message content"),
        ],
        status: "message_sent",
    },
];

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    register_all(registry, TOOLS)
}

pub struct FinancialServicesScenario;

impl Scenario for FinancialServicesScenario {
    type Context = Account;

    const NAME: &'static str = "financial_services";
    const DESCRIPTION: &'static str = "Banking support: fraud, loans, disputes, portfolios, credit limits";

    fn registry() -> Result<ToolRegistry, ToolError> {
        let mut registry = ToolRegistry::new();
        register(&mut registry)?;
        Ok(registry)
    }

    fn system_prompt(account: &Account) -> String {
        let account_json = serde_json::to_string(account).unwrap_or_else(|_| "{}".into());
        format!(
            "You are a professional financial services agent specializing in banking, fraud prevention, loans, and investments.\n\
             When you assist customers, you should:\n  \
             1) Analyze their request and call the appropriate business tool\n  \
             2) Call send_customer_response with a helpful confirmation message\n\
             Always prioritize security and compliance with banking regulations.\n\n\
             ACCOUNT: {account_json}"
        )
    }

    fn demo() -> ScenarioInput<Account> {
        ScenarioInput {
            context: Account {
                account_id: "ACC123".into(),
                customer_id: "CUST999".into(),
                status: "Active".into(),
                balance: Some(5000.0),
            },
            messages: vec![Message::user("I want to increase my credit limit.")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ten_tools_in_declaration_order() {
        let registry = FinancialServicesScenario::registry().unwrap();
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.names()[0], "investigate_transaction");
        assert_eq!(registry.names()[9], "send_customer_response");
    }

    #[tokio::test]
    async fn credit_limit_increase_requires_both_limits() {
        let registry = FinancialServicesScenario::registry().unwrap();
        let tool = registry.resolve("increase_credit_limit").unwrap();

        let schema = tool.schema.to_json_schema();
        assert_eq!(
            schema["required"],
            json!(["account_id", "current_limit", "requested_limit"])
        );
        assert!(tool
            .schema
            .validate_arguments(&json!({"account_id": "ACC123", "requested_limit": "8000"}))
            .is_err());

        let out = tool
            .handler
            .call(json!({"account_id": "ACC123", "current_limit": "5000", "requested_limit": "8000"}))
            .await
            .unwrap();
        assert_eq!(out, "credit_limit_updated");
    }

    #[test]
    fn prompt_embeds_account_json() {
        let demo = FinancialServicesScenario::demo();
        let prompt = FinancialServicesScenario::system_prompt(&demo.context);
        assert!(prompt.contains("send_customer_response"));
        assert!(prompt.ends_with(
            r#"ACCOUNT: {"account_id":"ACC123","customer_id":"CUST999","status":"Active","balance":5000.0}"#
        ));
    }

    #[test]
    fn balance_is_omitted_when_unknown() {
        let account = Account {
            account_id: "ACC1".into(),
            ..Account::default()
        };
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("balance").is_none());
    }
}
