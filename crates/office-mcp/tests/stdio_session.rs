//! A whole client session over the line-delimited transport.

use office_mcp::{build_tools, AppKind, McpServer, ServerConfig};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn session(app: AppKind, dir: &TempDir, messages: &[Value]) -> Vec<Value> {
    let config = ServerConfig::document(app, dir.path());
    config.prepare_workspace().unwrap();
    let mut server = McpServer::new(build_tools(&config).unwrap());
    let input: String = messages.iter().map(|m| format!("{m}\n")).collect();
    let mut output = Vec::new();
    server.run(input.as_bytes(), &mut output).unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn tool_payload(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_excel_session() {
    let dir = TempDir::new().unwrap();
    let responses = session(
        AppKind::Excel,
        &dir,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
                "name": "open_workbook", "arguments": {"path": "Book.xlsx"}}}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
                "name": "set_cell_value",
                "arguments": {"identifier": 1, "sheet_identifier": 1, "cell_address": "A1", "value": 7}}}),
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {
                "name": "get_cell_value",
                "arguments": {"identifier": 1, "sheet_identifier": 1, "cell_address": "A1"}}}),
        ],
    );
    assert_eq!(responses.len(), 5);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "office-mcp");
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 13);
    assert_eq!(responses[2]["result"]["isError"], false);
    assert_eq!(tool_payload(&responses[4]), json!({"value": 7}));
    assert!(dir.path().join("templates").is_dir());
}

#[test]
fn test_powerpoint_session_reports_tool_errors_in_band() {
    let dir = TempDir::new().unwrap();
    let responses = session(
        AppKind::Powerpoint,
        &dir,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
                "name": "get_slide_count", "arguments": {"identifier": "absent.pptx"}}}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "shutdown"}),
        ],
    );
    assert_eq!(responses[0]["result"]["tools"].as_array().unwrap().len(), 27);
    assert_eq!(responses[1]["result"]["isError"], true);
    assert_eq!(
        tool_payload(&responses[1]),
        json!({"error": "Presentation 'absent.pptx' not found."})
    );
    assert_eq!(responses[2]["error"]["code"], -32601);
}
