//! Scenario tool sets for agentloop.
//!
//! Each scenario bundles a tool registry, the context record its system
//! prompt is built from, and a demo payload:
//!
//! - `math`: arithmetic on two numbers plus an expression evaluator
//! - `ecommerce`: customer support for one order
//! - `soc`: security incident triage
//! - `weather`: current weather from a fixed table
//! - `financial_services`: banking support for one account
//! - `healthcare`: patient intake and triage
//! - `supply_chain`: logistics operations

pub mod ecommerce;
pub mod expression;
pub mod financial;
pub mod healthcare;
pub mod math;
pub mod scenario;
mod simulated;
pub mod soc;
pub mod supply_chain;
pub mod weather;

pub use ecommerce::{EcommerceScenario, Order};
pub use financial::{Account, FinancialServicesScenario};
pub use healthcare::{HealthcareScenario, Patient};
pub use math::MathScenario;
pub use scenario::{RunStatus, SCENARIOS, Scenario, ScenarioInput, ScenarioOutput};
pub use soc::{Incident, SocScenario};
pub use supply_chain::{Operation, SupplyChainScenario};
pub use weather::WeatherScenario;
