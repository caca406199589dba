pub mod config_cmd;
pub mod run;
pub mod tools;

use clap::ValueEnum;

/// The bundled scenarios, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioName {
    Math,
    Ecommerce,
    Soc,
    Weather,
    #[value(name = "financial_services", alias = "financial-services")]
    FinancialServices,
    Healthcare,
    #[value(name = "supply_chain", alias = "supply-chain")]
    SupplyChain,
}
