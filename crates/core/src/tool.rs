//! Tool schemas, handlers and the registry.
//!
//! A tool is a [`ToolSchema`] (what the model sees) paired with a
//! [`ToolHandler`] (what runs). The registry keeps them in registration
//! order so the advertised tool list is stable within a process.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// JSON type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Whether `value` has this JSON type. Integers count as numbers.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    /// Element type, for array parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ParamType>,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            items: None,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn items(mut self, item_type: ParamType) -> Self {
        self.items = Some(item_type);
        self
    }
}

/// Static declaration of a tool, advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// The tool name the model uses to call it
    pub name: String,

    /// Description the model uses to pick the tool
    pub description: String,

    /// Declared parameters, in declaration order
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a required parameter.
    pub fn required(mut self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.parameters.push(ParameterSpec::required(name, param_type, description));
        self
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.parameters.push(ParameterSpec::optional(name, param_type, description));
        self
    }

    /// Add a fully specified parameter.
    pub fn param(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Render the parameters as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for p in &self.parameters {
            let mut property = serde_json::json!({
                "type": p.param_type.as_str(),
                "description": p.description,
            });
            if let Some(item_type) = p.items {
                property["items"] = serde_json::json!({ "type": item_type.as_str() });
            }
            properties.insert(p.name.clone(), property);
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check a parsed argument payload against the declared parameters.
    ///
    /// Undeclared keys are tolerated; a `null` counts as absent.
    pub fn validate_arguments(&self, arguments: &Value) -> Result<(), String> {
        let Some(object) = arguments.as_object() else {
            return Err("arguments must be a JSON object".into());
        };

        for p in &self.parameters {
            match object.get(&p.name) {
                None | Some(Value::Null) if p.required => {
                    return Err(format!("missing required parameter '{}'", p.name));
                }
                None | Some(Value::Null) => {}
                Some(v) if !p.param_type.matches(v) => {
                    return Err(format!(
                        "parameter '{}' must be of type {}",
                        p.name,
                        p.param_type.as_str()
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// The executable side of a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with already-validated arguments.
    async fn call(&self, arguments: Value) -> Result<String, ToolError>;
}

/// Adapts an async closure over a typed argument struct into a handler.
///
/// The JSON arguments are deserialized into `A`; a mismatch is reported as
/// [`ToolError::InvalidArguments`] and never reaches the closure.
pub struct FnHandler<A, F> {
    tool_name: String,
    func: F,
    _args: PhantomData<fn(A)>,
}

impl<A, F, Fut> FnHandler<A, F>
where
    A: DeserializeOwned + Send + 'static,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolError>> + Send,
{
    pub fn new(tool_name: impl Into<String>, func: F) -> Self {
        Self {
            tool_name: tool_name.into(),
            func,
            _args: PhantomData,
        }
    }
}

#[async_trait]
impl<A, F, Fut> ToolHandler for FnHandler<A, F>
where
    A: DeserializeOwned + Send + 'static,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolError>> + Send,
{
    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: A = serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
            tool_name: self.tool_name.clone(),
            reason: e.to_string(),
        })?;
        (self.func)(args).await
    }
}

/// A schema and its handler, as stored in the registry.
#[derive(Clone)]
pub struct RegisteredTool {
    pub schema: ToolSchema,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// A registry of available tools for one agent.
///
/// The loop uses it to:
/// 1. Advertise tool schemas to the model
/// 2. Resolve and execute tools when the model requests them
///
/// Cloning is cheap: handlers are shared behind `Arc`.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if a tool with the same name exists.
    pub fn register(
        &mut self,
        schema: ToolSchema,
        handler: impl ToolHandler + 'static,
    ) -> Result<&mut Self, ToolError> {
        self.register_shared(schema, Arc::new(handler))
    }

    /// Register a tool whose handler is already shared.
    pub fn register_shared(
        &mut self,
        schema: ToolSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<&mut Self, ToolError> {
        if self.index.contains_key(&schema.name) {
            return Err(ToolError::Duplicate(schema.name));
        }
        self.index.insert(schema.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { schema, handler });
        Ok(self)
    }

    /// Register a typed async closure as a tool.
    pub fn register_fn<A, F, Fut>(&mut self, schema: ToolSchema, func: F) -> Result<&mut Self, ToolError>
    where
        A: DeserializeOwned + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        let handler = FnHandler::new(schema.name.clone(), func);
        self.register(schema, handler)
    }

    /// All schemas, in registration order.
    pub fn describe_all(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema.clone()).collect()
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<&RegisteredTool, ToolError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.schema.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    fn echo_schema() -> ToolSchema {
        ToolSchema::new("echo", "Echoes back the input").required("text", ParamType::String, "Text to echo")
    }

    fn registry_with_echo() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(echo_schema(), |args: EchoArgs| async move { Ok(args.text) })
            .unwrap();
        registry
    }

    #[test]
    fn register_and_resolve() {
        let registry = registry_with_echo();
        assert!(registry.resolve("echo").is_ok());
        assert_eq!(
            registry.resolve("nonexistent").unwrap_err(),
            ToolError::Unknown("nonexistent".into())
        );
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = registry_with_echo();
        let err = registry
            .register_fn(echo_schema(), |args: EchoArgs| async move { Ok(args.text) })
            .unwrap_err();
        assert_eq!(err, ToolError::Duplicate("echo".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn describe_all_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register_fn(ToolSchema::new(name, "noop"), |_: Value| async { Ok(String::new()) })
                .unwrap();
        }
        let names: Vec<String> = registry.describe_all().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert_eq!(registry.describe_all(), registry.describe_all());
    }

    #[tokio::test]
    async fn typed_handler_runs() {
        let registry = registry_with_echo();
        let tool = registry.resolve("echo").unwrap();
        let out = tool.handler.call(json!({"text": "hello world"})).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn typed_handler_rejects_bad_shape() {
        let registry = registry_with_echo();
        let tool = registry.resolve("echo").unwrap();
        let err = tool.handler.call(json!({"text": 42})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref tool_name, .. } if tool_name == "echo"));
    }

    #[test]
    fn json_schema_lists_required_params() {
        let schema = ToolSchema::new("add", "Add x + y")
            .required("x", ParamType::Number, "First number")
            .optional("y", ParamType::Number, "Second number");
        let js = schema.to_json_schema();
        assert_eq!(js["type"], "object");
        assert_eq!(js["properties"]["x"]["type"], "number");
        assert_eq!(js["required"], json!(["x"]));
    }

    #[test]
    fn array_parameters_declare_their_items() {
        let schema = ToolSchema::new("triage", "Assess symptoms")
            .param(ParameterSpec::optional("symptoms", ParamType::Array, "Symptoms").items(ParamType::String));
        let js = schema.to_json_schema();
        assert_eq!(js["properties"]["symptoms"]["items"], json!({"type": "string"}));
        assert_eq!(js["required"], json!([]));
    }

    #[test]
    fn validation_catches_missing_and_mistyped() {
        let schema = ToolSchema::new("refund", "Issue a refund")
            .required("order_id", ParamType::String, "Order")
            .required("amount", ParamType::Number, "Amount")
            .optional("note", ParamType::String, "Note");

        assert!(schema.validate_arguments(&json!({"order_id": "A1", "amount": 3})).is_ok());
        assert!(schema
            .validate_arguments(&json!({"order_id": "A1", "amount": 3, "note": null}))
            .is_ok());

        let missing = schema.validate_arguments(&json!({"order_id": "A1"})).unwrap_err();
        assert!(missing.contains("amount"));

        let wrong = schema
            .validate_arguments(&json!({"order_id": 7, "amount": 3}))
            .unwrap_err();
        assert!(wrong.contains("order_id"));

        assert!(schema.validate_arguments(&json!([1, 2])).is_err());
    }

    #[test]
    fn integer_type_rejects_fractions() {
        assert!(ParamType::Integer.matches(&json!(3)));
        assert!(!ParamType::Integer.matches(&json!(3.5)));
        assert!(ParamType::Number.matches(&json!(3)));
    }
}
