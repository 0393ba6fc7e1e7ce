//! Excel tools over `.xlsx` files in a temporary workspace.

use office_mcp::excel::{DocumentExcel, ExcelTools};
use office_mcp::protocol::ToolContent;
use office_mcp::tools::{self, ToolSet};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn call(tools: &mut dyn ToolSet, name: &str, arguments: Value) -> (Value, bool) {
    let result = tools::invoke(tools, name, arguments);
    let ToolContent::Text { text } = &result.content[0];
    (serde_json::from_str(text).unwrap(), result.is_error)
}

fn ok(tools: &mut dyn ToolSet, name: &str, arguments: Value) -> Value {
    let (payload, is_error) = call(tools, name, arguments);
    assert!(!is_error, "{name} failed: {payload}");
    payload
}

fn workspace() -> (TempDir, ExcelTools<DocumentExcel>) {
    let dir = TempDir::new().unwrap();
    let tools = ExcelTools::new(DocumentExcel::new(dir.path()));
    (dir, tools)
}

#[test]
fn test_open_creates_and_lists_workbook() {
    let (dir, mut tools) = workspace();
    let opened = ok(&mut tools, "open_workbook", json!({"path": "Sales.xlsx"}));
    assert_eq!(opened["message"], "Workbook 'Sales.xlsx' opened successfully.");
    assert!(dir.path().join("Sales.xlsx").is_file());

    let listed = ok(&mut tools, "list_open_workbooks", json!({}));
    let books = listed["workbooks"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["name"], "Sales.xlsx");
    assert_eq!(books[0]["index"], 1);

    let sheets = ok(&mut tools, "list_worksheets", json!({"identifier": 1}));
    assert_eq!(sheets["worksheets"][0]["name"], "Sheet1");
}

#[test]
fn test_cells_and_ranges_survive_save_and_reopen() {
    let (dir, mut tools) = workspace();
    ok(&mut tools, "open_workbook", json!({"path": "Budget.xlsx"}));
    ok(
        &mut tools,
        "set_range_values",
        json!({
            "identifier": "Budget.xlsx",
            "sheet_identifier": "Sheet1",
            "start_cell": "A1",
            "values": [["Revenue", 100], ["Cost", 60]],
        }),
    );
    let set = ok(
        &mut tools,
        "set_cell_value",
        json!({
            "identifier": 1,
            "sheet_identifier": 1,
            "cell_address": "C1",
            "value": "=B1*2",
        }),
    );
    assert_eq!(set["message"], "Successfully set cell 'C1' to \"=B1*2\".");
    ok(&mut tools, "save_workbook", json!({"identifier": 1}));

    let mut reopened = ExcelTools::new(DocumentExcel::new(dir.path()));
    let values = ok(
        &mut reopened,
        "get_range_values",
        json!({
            "identifier": "Budget.xlsx",
            "sheet_identifier": "sheet1",
            "range_address": "A1:B2",
        }),
    );
    assert_eq!(values["values"], json!([["Revenue", 100], ["Cost", 60]]));

    let kinds = ok(
        &mut reopened,
        "get_cell_types_in_range",
        json!({
            "identifier": "Budget.xlsx",
            "sheet_identifier": "Sheet1",
            "range_address": "A1:C1",
        }),
    );
    assert_eq!(kinds["cell_types"], json!([["text", "number", "formula"]]));
}

#[test]
fn test_analysis_tools_read_used_range() {
    let (_dir, mut tools) = workspace();
    ok(&mut tools, "open_workbook", json!({"path": "Report.xlsx"}));
    ok(
        &mut tools,
        "set_range_values",
        json!({
            "identifier": 1,
            "sheet_identifier": 1,
            "start_cell": "B2",
            "values": [
                ["Total", 250, null, "Region"],
                [null, null, null, 10],
                [null, null, null, 20],
            ],
        }),
    );

    let strings = ok(
        &mut tools,
        "extract_string_cells",
        json!({"identifier": 1, "sheet_identifier": 1}),
    );
    let values: Vec<&str> = strings["string_cells"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["Total", "Region"]);
    assert_eq!(strings["string_cells"][0]["sheet"], "Sheet1");

    let patterns = ok(
        &mut tools,
        "analyze_label_value_patterns",
        json!({"identifier": 1, "sheet_identifier": "Sheet1"}),
    );
    let patterns = &patterns["patterns"];
    assert_eq!(patterns["horizontal_pairs"][0]["label"], "Total");
    assert_eq!(patterns["horizontal_pairs"][0]["value"], 250);
    assert_eq!(patterns["table_headers"][0]["header"], "Region");
    assert_eq!(patterns["table_headers"][0]["data_count"], 2);
    assert_eq!(patterns["summary"]["total_string_cells"], 2);

    let used = ok(
        &mut tools,
        "find_used_ranges",
        json!({"identifier": 1, "sheet_identifier": 1}),
    );
    assert_eq!(used["used_ranges"].as_array().unwrap().len(), 2);
}

#[test]
fn test_failures_come_back_as_error_payloads() {
    let (_dir, mut tools) = workspace();
    let (payload, is_error) = call(
        &mut tools,
        "get_cell_value",
        json!({"identifier": "Missing.xlsx", "sheet_identifier": 1, "cell_address": "A1"}),
    );
    assert!(is_error);
    assert_eq!(payload, json!({"error": "Workbook 'Missing.xlsx' not found."}));

    ok(&mut tools, "open_workbook", json!({"path": "Book.xlsx"}));
    let (payload, is_error) = call(
        &mut tools,
        "set_range_values",
        json!({"identifier": 1, "sheet_identifier": 1, "start_cell": "A1", "values": []}),
    );
    assert!(is_error);
    assert_eq!(
        payload["error"],
        "Input 'values' must be a non-empty list of lists."
    );

    let (payload, is_error) = call(&mut tools, "no_such_tool", json!({}));
    assert!(is_error);
    assert_eq!(payload["error"], "Unknown tool: no_such_tool");
}

#[test]
fn test_add_worksheet_with_name() {
    let (_dir, mut tools) = workspace();
    ok(&mut tools, "open_workbook", json!({"path": "Book.xlsx"}));
    let added = ok(
        &mut tools,
        "add_worksheet",
        json!({"identifier": 1, "sheet_name": "Summary"}),
    );
    assert_eq!(added["message"], "Worksheet added successfully.");
    let sheets = ok(&mut tools, "list_worksheets", json!({"identifier": 1}));
    let names: Vec<&str> = sheets["worksheets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sheet1", "Summary"]);
}

#[test]
fn test_formulas_read_back_computed_values() {
    let (dir, mut tools) = workspace();
    ok(&mut tools, "open_workbook", json!({"path": "Calc.xlsx"}));
    let cell = |address: &str| json!({"identifier": 1, "sheet_identifier": 1, "cell_address": address});
    let set = |address: &str, value: Value| {
        json!({"identifier": 1, "sheet_identifier": 1, "cell_address": address, "value": value})
    };

    ok(&mut tools, "set_cell_value", set("A1", json!(5)));
    ok(&mut tools, "set_cell_value", set("A2", json!("=A1*2")));
    assert_eq!(ok(&mut tools, "get_cell_value", cell("A2")), json!({"value": 10}));
    let values = ok(
        &mut tools,
        "get_range_values",
        json!({"identifier": 1, "sheet_identifier": 1, "range_address": "A1:A2"}),
    );
    assert_eq!(values["values"], json!([[5], [10]]));

    // dependents follow later edits
    ok(&mut tools, "set_cell_value", set("A1", json!(7)));
    assert_eq!(ok(&mut tools, "get_cell_value", cell("A2")), json!({"value": 14}));

    // a function the workbook cannot compute reports its formula text
    ok(&mut tools, "set_cell_value", set("B1", json!("=XLOOKUP(1,C1:C2,D1:D2)")));
    assert_eq!(
        ok(&mut tools, "get_cell_value", cell("B1")),
        json!({"value": "=XLOOKUP(1,C1:C2,D1:D2)"})
    );
    ok(&mut tools, "save_workbook", json!({"identifier": 1}));

    let mut reopened = ExcelTools::new(DocumentExcel::new(dir.path()));
    let reread = ok(
        &mut reopened,
        "get_cell_value",
        json!({"identifier": "Calc.xlsx", "sheet_identifier": 1, "cell_address": "A2"}),
    );
    assert_eq!(reread, json!({"value": 14}));
}

#[test]
fn test_whole_sheet_reads_are_refused_but_sparse_sheets_analyze() {
    let (_dir, mut tools) = workspace();
    ok(&mut tools, "open_workbook", json!({"path": "Wide.xlsx"}));

    for tool in ["get_range_values", "get_cell_types_in_range"] {
        let (payload, is_error) = call(
            &mut tools,
            tool,
            json!({"identifier": 1, "sheet_identifier": 1, "range_address": "A1:XFD1048576"}),
        );
        assert!(is_error, "{tool} accepted a whole-sheet range");
        let message = payload["error"].as_str().unwrap();
        assert!(message.contains("bulk reads are limited"), "{message}");
    }

    ok(
        &mut tools,
        "set_range_values",
        json!({"identifier": 1, "sheet_identifier": 1, "start_cell": "A1", "values": [["Total", 3]]}),
    );
    ok(
        &mut tools,
        "set_cell_value",
        json!({"identifier": 1, "sheet_identifier": 1, "cell_address": "XFD1048576", "value": "stray"}),
    );
    let sheet = json!({"identifier": 1, "sheet_identifier": 1});
    let used = ok(&mut tools, "find_used_ranges", sheet.clone());
    assert_eq!(used["used_ranges"].as_array().unwrap().len(), 2);
    let strings = ok(&mut tools, "extract_string_cells", sheet.clone());
    assert_eq!(strings["string_cells"].as_array().unwrap().len(), 2);
    let patterns = ok(&mut tools, "analyze_label_value_patterns", sheet);
    assert_eq!(patterns["horizontal_pairs"][0]["label"], "Total");
}
