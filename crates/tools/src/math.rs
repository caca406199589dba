//! Arithmetic tools: `add`, `multiply`, `exponentiate` over two numbers,
//! plus `calculate` for whole expressions.

use agentloop_core::error::ToolError;
use agentloop_core::message::Message;
use agentloop_core::tool::{ParamType, ToolRegistry, ToolSchema};
use serde::Deserialize;

use crate::expression::{self, format_number};
use crate::scenario::{Scenario, ScenarioInput};

#[derive(Debug, Deserialize)]
struct MathArgs {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct CalculateArgs {
    expression: String,
}

fn binary(name: &str, description: &str) -> ToolSchema {
    ToolSchema::new(name, description)
        .required("x", ParamType::Number, "First number")
        .required("y", ParamType::Number, "Second number")
}

fn finite(value: f64) -> Result<String, ToolError> {
    if value.is_finite() {
        Ok(format_number(value))
    } else {
        Err(ToolError::failed("result is not a finite number"))
    }
}

/// Register the arithmetic tools on `registry`.
pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry
        .register_fn(binary("add", "Add x + y"), |a: MathArgs| async move {
            finite(a.x + a.y)
        })?
        .register_fn(binary("multiply", "Multiply x * y"), |a: MathArgs| async move {
            finite(a.x * a.y)
        })?
        .register_fn(binary("exponentiate", "Raise x to power y"), |a: MathArgs| async move {
            finite(a.x.powf(a.y))
        })?
        .register_fn(
            ToolSchema::new(
                "calculate",
                "Evaluate an arithmetic expression. Supports +, -, *, /, ** (power) and parentheses, \
                 e.g. '3 + 5' or '(10 - 2) * 4'",
            )
            .required("expression", ParamType::String, "The expression to evaluate, e.g. '3 + 5 * 2'"),
            |a: CalculateArgs| async move {
                expression::evaluate(&a.expression)
                    .map(format_number)
                    .map_err(|e| ToolError::failed(format!("cannot evaluate '{}': {e}", a.expression)))
            },
        )?;
    Ok(())
}

pub struct MathScenario;

impl Scenario for MathScenario {
    type Context = ();

    const NAME: &'static str = "math";
    const DESCRIPTION: &'static str = "Arithmetic with add, multiply, exponentiate and calculate";

    fn registry() -> Result<ToolRegistry, ToolError> {
        let mut registry = ToolRegistry::new();
        register(&mut registry)?;
        Ok(registry)
    }

    fn system_prompt(_context: &()) -> String {
        "You are a careful calculator. Use the arithmetic tools for every computation \
         and answer with the results."
            .into()
    }

    fn demo() -> ScenarioInput<()> {
        ScenarioInput {
            context: (),
            messages: vec![Message::user("What is 393 * 12.25? Also, what is 11 + 49?")],
        }
    }
}
