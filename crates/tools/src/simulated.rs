//! Table-driven registration for simulated business tools.
//!
//! Most scenario tools stand in for a backend action: they log the call and
//! answer with a fixed status string. Declaring them as data keeps the
//! larger scenarios readable.

use agentloop_core::error::ToolError;
use agentloop_core::tool::{ParamType, ParameterSpec, ToolRegistry, ToolSchema};
use serde_json::{Map, Value};
use tracing::info;

/// One declared parameter of a simulated tool.
pub(crate) struct Param {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub required: bool,
}

impl Param {
    pub(crate) const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            param_type: ParamType::String,
            description,
            required: true,
        }
    }

    pub(crate) const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            param_type: ParamType::String,
            description,
            required: false,
        }
    }

    fn parameter(&self) -> ParameterSpec {
        let parameter = if self.required {
            ParameterSpec::required(self.name, self.param_type, self.description)
        } else {
            ParameterSpec::optional(self.name, self.param_type, self.description)
        };
        match self.param_type {
            // Arrays carry lists of labels in every scenario that uses them.
            ParamType::Array => parameter.items(ParamType::String),
            _ => parameter,
        }
    }
}

/// A tool that logs its arguments and reports `status`.
pub(crate) struct SimulatedTool {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    pub status: &'static str,
}

impl SimulatedTool {
    fn schema(&self) -> ToolSchema {
        self.params
            .iter()
            .fold(ToolSchema::new(self.name, self.description), |schema, p| schema.param(p.parameter()))
    }
}

pub(crate) fn register_all(registry: &mut ToolRegistry, tools: &[SimulatedTool]) -> Result<(), ToolError> {
    for tool in tools {
        let name = tool.name;
        let status = tool.status;
        registry.register_fn(tool.schema(), move |args: Map<String, Value>| async move {
            let args = Value::Object(args);
            info!(tool = name, %args, "simulated action");
            Ok(status.to_string())
        })?;
    }
    Ok(())
}
