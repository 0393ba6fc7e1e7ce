//! Live backends against a scripted bridge channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use office_com::{App, BridgeError, BridgeResult, Channel, ChannelFactory, ComBridge, SheetRef};
use office_com_protocol::{
    Command, Request, Response, ResponseData, ResponseResult, WireLayout, WirePresentation,
    WireShape, WireSheet, WireUsedRange, WireValue, WireWorkbook,
};
use office_mcp::excel::{ExcelTools, LiveExcel};
use office_mcp::live::LiveSession;
use office_mcp::powerpoint::{LivePowerPoint, PowerPointTools};
use office_mcp::protocol::ToolContent;
use office_mcp::tools::{self, ToolSet};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

type Handler = Arc<dyn Fn(&Command) -> ResponseResult + Send + Sync>;

struct Scripted {
    handler: Handler,
    log: Arc<Mutex<Vec<Command>>>,
    pending: Option<String>,
}

impl Channel for Scripted {
    fn send_line(&mut self, line: &str) -> BridgeResult<()> {
        let request: Request = serde_json::from_str(line)?;
        self.log.lock().unwrap().push(request.command.clone());
        let response = Response {
            id: request.id,
            result: (self.handler)(&request.command),
        };
        self.pending = Some(serde_json::to_string(&response).unwrap());
        Ok(())
    }

    fn receive_line(&mut self, _timeout: Duration) -> BridgeResult<String> {
        self.pending
            .take()
            .ok_or_else(|| BridgeError::ReadFailed("pipe closed".into()))
    }
}

/// Commands the application was sent, minus the liveness traffic
#[derive(Clone)]
struct Log(Arc<Mutex<Vec<Command>>>);

impl Log {
    fn commands(&self) -> Vec<Command> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !matches!(c, Command::Init { .. } | Command::Ping))
            .cloned()
            .collect()
    }

    fn last(&self) -> Command {
        self.commands().pop().unwrap()
    }
}

fn session(app: App, handler: Handler) -> (LiveSession, Log) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let factory: ChannelFactory = {
        let log = log.clone();
        Box::new(move || {
            let channel: Box<dyn Channel> = Box::new(Scripted {
                handler: handler.clone(),
                log: log.clone(),
                pending: None,
            });
            Ok(channel)
        })
    };
    let bridge = ComBridge::with_channel(app, Duration::from_secs(1), factory).unwrap();
    (LiveSession::new(bridge, None), Log(log))
}

fn version() -> ResponseResult {
    ResponseResult::ok(ResponseData::Version {
        version: "16.0".into(),
    })
}

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

fn error(tools: &mut dyn ToolSet, name: &str, arguments: Value) -> String {
    let (payload, is_error) = call(tools, name, arguments);
    assert!(is_error, "{name} unexpectedly succeeded: {payload}");
    payload["error"].as_str().unwrap().to_string()
}

fn workbook(index: u32, name: &str, path: &str, read_only: bool) -> WireWorkbook {
    WireWorkbook {
        index,
        name: name.into(),
        full_name: if path.is_empty() {
            name.into()
        } else {
            format!(r"{path}\{name}")
        },
        path: path.into(),
        sheets_count: 2,
        saved: !path.is_empty(),
        read_only,
    }
}

fn excel() -> (ExcelTools<LiveExcel>, Log) {
    let handler: Handler = Arc::new(|cmd| match cmd {
        Command::Init { .. } | Command::Ping => version(),
        Command::ListWorkbooks => ResponseResult::ok(ResponseData::Workbooks {
            workbooks: vec![
                workbook(1, "Book1.xlsx", r"C:\data", true),
                workbook(2, "Book2", "", false),
            ],
        }),
        Command::OpenWorkbook { .. } => ResponseResult::ok(ResponseData::Workbook {
            workbook: workbook(3, "Sales.xlsx", r"C:\data", false),
        }),
        Command::ListWorksheets { .. } => ResponseResult::ok(ResponseData::Worksheets {
            worksheets: vec![
                WireSheet {
                    index: 1,
                    name: "Sheet1".into(),
                    visible: true,
                },
                WireSheet {
                    index: 2,
                    name: "Data".into(),
                    visible: true,
                },
            ],
        }),
        Command::GetCellValue { .. } => ResponseResult::ok(ResponseData::Value {
            value: WireValue::Number(42.0),
        }),
        Command::GetUsedRange { .. } => ResponseResult::ok(ResponseData::UsedRange {
            used_range: WireUsedRange {
                address: "$A$1:$B$2".into(),
                values: vec![
                    vec![WireValue::from("Revenue"), WireValue::from(100.0)],
                    vec![WireValue::from("Cost"), WireValue::from(60.0)],
                ],
            },
        }),
        _ => ResponseResult::done(),
    });
    let (session, log) = session(App::Excel, handler);
    (ExcelTools::new(LiveExcel::new(session)), log)
}

#[test]
fn test_live_excel_lists_and_resolves_workbooks() {
    let (mut tools, log) = excel();
    let listed = ok(&mut tools, "list_open_workbooks", json!({}));
    assert_eq!(listed["workbooks"][0]["path"], r"C:\data\Book1.xlsx (ReadOnly)");
    assert_eq!(listed["workbooks"][1]["path"], "Book2");

    let value = ok(
        &mut tools,
        "get_cell_value",
        json!({"identifier": "book1.xlsx", "sheet_identifier": "data", "cell_address": "B2"}),
    );
    assert_eq!(value["value"], 42);
    match log.last() {
        Command::GetCellValue {
            workbook, sheet, ..
        } => {
            assert_eq!(workbook, 1);
            assert_eq!(sheet, SheetRef::Index(2));
        }
        other => panic!("unexpected command {other:?}"),
    }

    assert_eq!(
        error(
            &mut tools,
            "list_worksheets",
            json!({"identifier": "Book9.xlsx"})
        ),
        "Workbook 'Book9.xlsx' not found."
    );
}

#[test]
fn test_live_excel_open_passes_windows_paths_through() {
    let (mut tools, log) = excel();
    let opened = ok(
        &mut tools,
        "open_workbook",
        json!({"path": r"C:\data\Sales.xlsx"}),
    );
    assert_eq!(opened["message"], "Workbook 'Sales.xlsx' opened successfully.");
    assert!(matches!(
        log.last(),
        Command::OpenWorkbook { path } if path == r"C:\data\Sales.xlsx"
    ));
}

#[test]
fn test_live_excel_unsaved_workbook_needs_save_path() {
    let (mut tools, log) = excel();
    assert_eq!(
        error(&mut tools, "save_workbook", json!({"identifier": 2})),
        "save_path is required for a new workbook that hasn't been saved before."
    );
    assert!(!log
        .commands()
        .iter()
        .any(|c| matches!(c, Command::SaveWorkbook { .. })));

    ok(
        &mut tools,
        "save_workbook",
        json!({"identifier": "Book2", "save_path": r"C:\out\Book2.xlsx"}),
    );
    assert!(matches!(
        log.last(),
        Command::SaveWorkbook { workbook: 2, path: Some(path) } if path == r"C:\out\Book2.xlsx"
    ));
}

#[test]
fn test_live_excel_analysis_uses_used_range() {
    let (mut tools, _log) = excel();
    let patterns = ok(
        &mut tools,
        "analyze_label_value_patterns",
        json!({"identifier": 1, "sheet_identifier": 1}),
    );
    let pairs = patterns["patterns"]["horizontal_pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0]["label"], "Revenue");
    assert_eq!(pairs[0]["value_address"], "$B$1");
    assert_eq!(pairs[1]["value"], 60);

    let strings = ok(
        &mut tools,
        "extract_string_cells",
        json!({"identifier": 1, "sheet_identifier": 1}),
    );
    assert_eq!(strings["string_cells"][1]["address"], "$A$2");
}

fn presentation(index: u32, name: &str, path: &str, slides: u32) -> WirePresentation {
    WirePresentation {
        index,
        name: name.into(),
        full_name: if path.is_empty() {
            name.into()
        } else {
            format!(r"{path}\{name}")
        },
        path: path.into(),
        slides,
        saved: true,
        read_only: false,
    }
}

fn shape(id: u32, name: &str) -> WireShape {
    WireShape {
        id,
        name: name.into(),
        type_id: 1,
        left: 72.0,
        top: 150.0,
        width: 144.0,
        height: 72.0,
        rotation: 0.0,
        text: None,
        placeholder_type: None,
        auto_shape_type: Some(1),
    }
}

fn title() -> WireShape {
    WireShape {
        type_id: 14,
        text: Some("Agenda".into()),
        placeholder_type: Some(1),
        auto_shape_type: None,
        ..shape(2, "Title 1")
    }
}

fn powerpoint() -> (PowerPointTools<LivePowerPoint>, Log) {
    let handler: Handler = Arc::new(|cmd| match cmd {
        Command::Init { .. } | Command::Ping => version(),
        Command::ListPresentations => ResponseResult::ok(ResponseData::Presentations {
            presentations: vec![
                presentation(1, "Deck.pptx", r"C:\decks", 2),
                presentation(2, "Presentation2", "", 1),
            ],
        }),
        Command::ListLayouts { .. } => ResponseResult::ok(ResponseData::Layouts {
            layouts: vec![
                WireLayout {
                    index: 1,
                    name: "Title Slide".into(),
                },
                WireLayout {
                    index: 2,
                    name: "Title and Content".into(),
                },
            ],
        }),
        Command::AddSlide { .. } => ResponseResult::ok(ResponseData::Slide { slide_index: 3 }),
        Command::ListShapes { .. } => ResponseResult::ok(ResponseData::Shapes {
            shapes: vec![title(), shape(5, "Box")],
            layout: Some("Title Only".into()),
        }),
        Command::EditShape { shape: id, .. } => ResponseResult::ok(ResponseData::Shape {
            shape: WireShape {
                text: Some("Moved".into()),
                ..shape(*id, "Box")
            },
        }),
        Command::AddConnector { .. } => ResponseResult::ok(ResponseData::Shape {
            shape: WireShape {
                auto_shape_type: None,
                ..shape(9, "Connector 9")
            },
        }),
        _ => ResponseResult::done(),
    });
    let (session, log) = session(App::PowerPoint, handler);
    (PowerPointTools::new(LivePowerPoint::new(session), "."), log)
}

#[test]
fn test_live_powerpoint_add_slide_uses_default_layout() {
    let (mut tools, log) = powerpoint();
    let added = ok(&mut tools, "add_slide", json!({"identifier": "Deck.pptx"}));
    assert_eq!(added["slide_index"], 3);
    assert!(matches!(
        log.last(),
        Command::AddSlide {
            presentation: 1,
            layout: 2,
        }
    ));
}

#[test]
fn test_live_powerpoint_shapes_by_element_id() {
    let (mut tools, log) = powerpoint();
    let listed = ok(&mut tools, "list_shapes", json!({"identifier": 1, "slide_index": 1}));
    let shapes = listed["shapes"].as_array().unwrap();
    assert_eq!(shapes[0]["placeholder_type_name"], "title");
    let box_element = shapes[1]["element_id"].as_str().unwrap().to_string();

    let edited = ok(
        &mut tools,
        "edit_element",
        json!({
            "identifier": 1,
            "slide_index": 1,
            "shape_identifier": box_element,
            "properties": {"left": 300},
        }),
    );
    assert_eq!(edited["properties"]["element_id"], box_element.as_str());
    assert_eq!(edited["properties"]["text"], "Moved");
    match log.last() {
        Command::EditShape {
            presentation,
            slide,
            shape,
            edit,
        } => {
            assert_eq!((presentation, slide, shape), (1, 1, 5));
            assert_eq!(edit.left, Some(300.0));
        }
        other => panic!("unexpected command {other:?}"),
    }

    let connected = ok(
        &mut tools,
        "connect_shapes",
        json!({"identifier": 1, "slide_index": 1, "from_shape": "Title 1", "to_shape": 5}),
    );
    assert_eq!(connected["message"], "Connector added between 'Title 1' and 'Box'.");
    assert_eq!(connected["connector_id"], 9);
    assert!(matches!(
        log.last(),
        Command::AddConnector {
            from_shape: 2,
            to_shape: 5,
            ..
        }
    ));

    let placeholder = ok(
        &mut tools,
        "get_placeholder_shape",
        json!({"identifier": 1, "slide_index": 1, "placeholder_name": "title"}),
    );
    assert_eq!(placeholder["shape_info"]["text"], "Agenda");
}

#[test]
fn test_live_powerpoint_slide_range_is_checked_before_bridge_calls() {
    let (mut tools, log) = powerpoint();
    assert_eq!(
        error(
            &mut tools,
            "list_shapes",
            json!({"identifier": "Deck.pptx", "slide_index": 3})
        ),
        "Slide 3 out of range. Presentation has 2 slides."
    );
    assert!(!log
        .commands()
        .iter()
        .any(|c| matches!(c, Command::ListShapes { .. })));
}

#[test]
fn test_live_powerpoint_save() {
    let (mut tools, log) = powerpoint();
    assert_eq!(
        error(&mut tools, "save_presentation", json!({"identifier": 2})),
        "save_path is required for a new presentation that hasn't been saved before."
    );

    let saved = ok(&mut tools, "save_presentation", json!({}));
    assert_eq!(saved["message"], "Save command issued for presentation 'Deck.pptx'.");
    assert!(matches!(
        log.last(),
        Command::SavePresentation {
            presentation: 1,
            path: None,
        }
    ));
}

#[test]
fn test_live_powerpoint_has_no_templates() {
    let (mut tools, _log) = powerpoint();
    let names: Vec<String> = tools.definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(names.len(), 23);
    assert!(!names.iter().any(|n| n.contains("template")));
    assert_eq!(
        error(&mut tools, "list_templates", json!({})),
        "Templates are only available with the document strategy."
    );
}
