//! `agentloop tools`: Print the tool schemas a scenario advertises.

use agentloop_tools::{
    EcommerceScenario, FinancialServicesScenario, HealthcareScenario, MathScenario, Scenario, SocScenario,
    SupplyChainScenario, WeatherScenario,
};
use anyhow::Context;
use serde_json::{Value, json};

use super::ScenarioName;

pub fn run(scenario: ScenarioName) -> anyhow::Result<()> {
    let schemas = match scenario {
        ScenarioName::Math => describe::<MathScenario>()?,
        ScenarioName::Ecommerce => describe::<EcommerceScenario>()?,
        ScenarioName::Soc => describe::<SocScenario>()?,
        ScenarioName::Weather => describe::<WeatherScenario>()?,
        ScenarioName::FinancialServices => describe::<FinancialServicesScenario>()?,
        ScenarioName::Healthcare => describe::<HealthcareScenario>()?,
        ScenarioName::SupplyChain => describe::<SupplyChainScenario>()?,
    };
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}

/// The scenario's tools in registration order, as JSON Schema.
pub fn describe<S: Scenario>() -> anyhow::Result<Value> {
    let registry = S::registry().with_context(|| format!("failed to build {} tools", S::NAME))?;
    let tools: Vec<Value> = registry
        .describe_all()
        .iter()
        .map(|schema| {
            json!({
                "name": schema.name,
                "description": schema.description,
                "parameters": schema.to_json_schema(),
            })
        })
        .collect();
    Ok(json!({ "scenario": S::NAME, "tools": tools }))
}
