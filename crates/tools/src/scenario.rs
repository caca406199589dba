//! The scenario abstraction: a tool set, a context record and the system
//! prompt built from it.

use agentloop_core::error::ToolError;
use agentloop_core::message::Message;
use agentloop_core::tool::ToolRegistry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A ready-made agent setup the CLI can run.
pub trait Scenario {
    /// The record threaded alongside the message log (an order, an
    /// incident). `()` when the scenario has none.
    type Context: Serialize + DeserializeOwned + Default + Send + Sync + 'static;

    /// Name used on the command line.
    const NAME: &'static str;

    /// One-line summary for `--help` style listings.
    const DESCRIPTION: &'static str;

    /// Build the scenario's tool registry.
    fn registry() -> Result<ToolRegistry, ToolError>;

    /// Build the system prompt for a run.
    fn system_prompt(context: &Self::Context) -> String;

    /// The hardcoded payload used in demo mode.
    fn demo() -> ScenarioInput<Self::Context>;
}

/// Initial state of a scenario run, as read from stdin in eval mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput<C> {
    #[serde(
        default,
        alias = "order",
        alias = "incident",
        alias = "account",
        alias = "patient",
        alias = "operation"
    )]
    pub context: C,

    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Final state of a scenario run, written to stdout in eval mode.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutput<C> {
    pub context: C,
    pub messages: Vec<Message>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub rounds: u32,
    pub budget_exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Done,
    Failed,
}

/// Names of every bundled scenario.
pub const SCENARIOS: &[&str] = &[
    crate::math::MathScenario::NAME,
    crate::ecommerce::EcommerceScenario::NAME,
    crate::soc::SocScenario::NAME,
    crate::weather::WeatherScenario::NAME,
    crate::financial::FinancialServicesScenario::NAME,
    crate::healthcare::HealthcareScenario::NAME,
    crate::supply_chain::SupplyChainScenario::NAME,
];
