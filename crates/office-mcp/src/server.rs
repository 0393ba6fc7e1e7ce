//! MCP server: one JSON-RPC message per line on stdin, one response per line
//! on stdout.

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::protocol::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo,
    ToolCallParams, ToolsCapability, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::tools::{self, ToolSet};

pub struct McpServer {
    tools: Box<dyn ToolSet>,
}

impl McpServer {
    pub fn new(tools: Box<dyn ToolSet>) -> Self {
        Self { tools }
    }

    /// Serve until `input` is exhausted
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        info!("MCP server ready, listening on stdio");
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            debug!(request = %line, "received message");
            if let Some(response) = self.handle_message(&line) {
                let text = serde_json::to_string(&response)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                writeln!(output, "{text}")?;
                output.flush()?;
            }
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Response for one raw message; notifications get none
    pub fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                warn!("unparseable message: {e}");
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")));
            }
        };
        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ))
            }
        };
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }

        match request.method.as_str() {
            "initialized" | "notifications/initialized" => None,
            _ if request.is_notification() => {
                debug!(method = %request.method, "ignoring notification");
                None
            }
            "initialize" => Some(self.initialize(request.id)),
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            "tools/list" => Some(self.tools_list(request.id)),
            "tools/call" => Some(self.tools_call(request.id, request.params)),
            other => Some(JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    fn initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "office-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        match serde_json::to_value(result) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    fn tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": self.tools.definitions() }))
    }

    fn tools_call(&mut self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"))
            }
        };
        let result = tools::invoke(self.tools.as_mut(), &params.name, params.arguments);
        match serde_json::to_value(result) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ToolError, ToolResult};
    use crate::tools::{Schema, ToolDefinition};
    use pretty_assertions::assert_eq;

    struct Counter(u32);

    impl ToolSet for Counter {
        fn definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition::new("bump", "Add one", Schema::new().build())]
        }

        fn call(&mut self, name: &str, _arguments: Value) -> ToolResult<Value> {
            match name {
                "bump" => {
                    self.0 += 1;
                    Ok(json!({ "count": self.0 }))
                }
                other => Err(ToolError::not_found(format!("Unknown tool: {other}"))),
            }
        }
    }

    fn server() -> McpServer {
        McpServer::new(Box::new(Counter(0)))
    }

    fn reply(server: &mut McpServer, message: Value) -> Value {
        let response = server.handle_message(&message.to_string()).unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_initialize() {
        let mut server = server();
        let response = reply(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        );
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(response["result"]["serverInfo"]["name"], "office-mcp");
    }

    #[test]
    fn test_notifications_get_no_reply() {
        let mut server = server();
        let message = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server.handle_message(&message.to_string()).is_none());
        let message = json!({"jsonrpc": "2.0", "method": "initialized"});
        assert!(server.handle_message(&message.to_string()).is_none());
    }

    #[test]
    fn test_tools_list_and_call() {
        let mut server = server();
        let listed = reply(&mut server, json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}));
        assert_eq!(listed["result"]["tools"][0]["name"], "bump");
        assert!(listed["result"]["tools"][0]["inputSchema"].is_object());

        let called = reply(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "bump"}}),
        );
        assert_eq!(called["result"]["isError"], false);
        assert_eq!(called["result"]["content"][0]["type"], "text");
        assert_eq!(called["result"]["content"][0]["text"], r#"{"count":1}"#);

        let failed = reply(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "nope"}}),
        );
        assert_eq!(failed["result"]["isError"], true);
        assert_eq!(
            failed["result"]["content"][0]["text"],
            r#"{"error":"Unknown tool: nope"}"#
        );
    }

    #[test]
    fn test_protocol_errors() {
        let mut server = server();
        let response = server.handle_message("{not json").unwrap();
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);

        let unknown = reply(&mut server, json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"}));
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let bad_params = reply(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"arguments": {}}}),
        );
        assert_eq!(bad_params["error"]["code"], INVALID_PARAMS);

        let pong = reply(&mut server, json!({"jsonrpc": "2.0", "id": 6, "method": "ping"}));
        assert_eq!(pong["result"], json!({}));
    }

    #[test]
    fn test_run_writes_one_line_per_response() {
        let mut server = server();
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string(),
            String::new(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "bump"}})
                .to_string(),
        ]
        .join("\n");
        let mut output = Vec::new();
        server.run(input.as_bytes(), &mut output).unwrap();
        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["id"], 2);
    }
}
