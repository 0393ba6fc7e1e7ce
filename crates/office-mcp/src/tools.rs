//! Tool registration layer.
//!
//! A [`ToolSet`] lists its tools and dispatches calls by name. [`invoke`] is the
//! single place where a call is logged and where every failure is flattened
//! into the uniform `{"error": message}` payload.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::error::{ToolError, ToolResult};
use crate::protocol::CallToolResult;

/// Tool definition for the MCP protocol
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// A family of tools served by one backend
pub trait ToolSet: Send {
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run the named tool; the `Ok` value is the tool's keyed payload
    fn call(&mut self, name: &str, arguments: Value) -> ToolResult<Value>;
}

/// Call a tool, logging it and flattening any failure
pub fn invoke(tools: &mut dyn ToolSet, name: &str, arguments: Value) -> CallToolResult {
    info!(tool = name, "tool call");
    match tools.call(name, arguments) {
        Ok(payload) => CallToolResult::success(&payload),
        Err(err) => {
            let message = err.to_string();
            warn!("Error in tool '{name}': {message}");
            CallToolResult::failure(&message)
        }
    }
}

pub fn unknown_tool(name: &str) -> ToolError {
    ToolError::not_found(format!("Unknown tool: {name}"))
}

/// Decode a tool's arguments; a missing argument object means "no arguments"
pub fn arguments<T: DeserializeOwned>(arguments: Value) -> ToolResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    Ok(serde_json::from_value(arguments)?)
}

/// Serialize a tool payload
pub fn payload<T: Serialize>(value: T) -> ToolResult<Value> {
    serde_json::to_value(value).map_err(|e| ToolError::Backend(e.to_string()))
}

/// JSON schema of a tool's argument object
#[derive(Debug, Default)]
pub struct Schema {
    properties: Map<String, Value>,
    required: Vec<&'static str>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, property: Value) -> Self {
        self.required.push(name);
        self.properties.insert(name.to_string(), property);
        self
    }

    pub fn optional(mut self, name: &'static str, property: Value) -> Self {
        self.properties.insert(name.to_string(), property);
        self
    }

    pub fn build(self) -> Value {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        })
    }
}

pub fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

pub fn integer(description: &str) -> Value {
    json!({"type": "integer", "description": description})
}

pub fn number(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

pub fn boolean(description: &str) -> Value {
    json!({"type": "boolean", "description": description})
}

pub fn object(description: &str) -> Value {
    json!({"type": "object", "description": description})
}

/// A 1-based position or a name
pub fn identifier(description: &str) -> Value {
    json!({"type": ["integer", "string"], "description": description})
}

/// Any JSON scalar
pub fn scalar(description: &str) -> Value {
    json!({"type": ["string", "number", "boolean", "null"], "description": description})
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    struct Echo;

    impl ToolSet for Echo {
        fn definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition::new("echo", "Echo", Schema::new().build())]
        }

        fn call(&mut self, name: &str, arguments: Value) -> ToolResult<Value> {
            match name {
                "echo" => Ok(json!({ "echo": arguments })),
                "fail" => Err(ToolError::invalid("bad input")),
                other => Err(unknown_tool(other)),
            }
        }
    }

    #[test]
    fn test_invoke_flattens_errors() {
        let mut tools = Echo;
        let ok = invoke(&mut tools, "echo", json!({"a": 1}));
        assert!(!ok.is_error);
        assert_eq!(ok.payload(), Some(json!({"echo": {"a": 1}})));

        let failed = invoke(&mut tools, "fail", Value::Null);
        assert!(failed.is_error);
        assert_eq!(failed.payload(), Some(json!({"error": "bad input"})));

        let unknown = invoke(&mut tools, "nope", Value::Null);
        assert_eq!(unknown.payload(), Some(json!({"error": "Unknown tool: nope"})));
    }

    #[derive(Debug, Deserialize)]
    struct Args {
        cell_address: String,
        #[serde(default)]
        save_path: Option<String>,
    }

    #[test]
    fn test_arguments() {
        let args: Args = arguments(json!({"cell_address": "B2"})).unwrap();
        assert_eq!(args.cell_address, "B2");
        assert_eq!(args.save_path, None);

        let err = arguments::<Args>(Value::Null).unwrap_err();
        assert!(err.to_string().starts_with("Invalid arguments: missing field `cell_address`"));
    }

    #[test]
    fn test_schema() {
        let schema = Schema::new()
            .required("identifier", identifier("Workbook"))
            .optional("save_path", string("Target path"))
            .build();
        assert_eq!(schema["required"], json!(["identifier"]));
        assert_eq!(schema["properties"]["save_path"]["type"], "string");
    }
}
