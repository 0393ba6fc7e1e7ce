//! Shared protocol types for communication between the office-mcp server and
//! the Windows COM bridge process.
//!
//! The protocol is JSON-over-stdio: one JSON object per line in each direction.
//! Documents, worksheets and slides are addressed by their 1-based position in
//! the application's own collections; resolving a caller's name or path to a
//! position happens on the client side.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The Office application a bridge process automates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum App {
    Excel,
    PowerPoint,
}

impl App {
    /// COM ProgID of the application object
    pub fn prog_id(&self) -> &'static str {
        match self {
            App::Excel => "Excel.Application",
            App::PowerPoint => "PowerPoint.Application",
        }
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            App::Excel => "Excel",
            App::PowerPoint => "PowerPoint",
        })
    }
}

/// A command sent from the client to the bridge process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Monotonically increasing request ID for correlating responses.
    pub id: u64,
    /// The command to execute.
    #[serde(flatten)]
    pub command: Command,
}

/// Commands the client can send to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum Command {
    /// Initialize COM and attach to the running application, launching a
    /// visible instance when none is running.
    Init { app: App },

    /// Check the application still answers; the bridge re-attaches once when it
    /// does not. Returns the application version.
    Ping,

    // -- Excel --
    ListWorkbooks,

    /// Open a workbook from a file path (Windows path).
    OpenWorkbook { path: String },

    /// Save in place, or `SaveAs` with the format taken from the extension.
    SaveWorkbook { workbook: u32, path: Option<String> },

    ListWorksheets { workbook: u32 },

    /// Add a worksheet after the last one, renaming it when `name` is given.
    AddWorksheet { workbook: u32, name: Option<String> },

    GetCellValue {
        workbook: u32,
        sheet: SheetRef,
        cell: String,
    },

    SetCellValue {
        workbook: u32,
        sheet: SheetRef,
        cell: String,
        value: WireValue,
    },

    GetRangeValues {
        workbook: u32,
        sheet: SheetRef,
        range: String,
    },

    /// Formula text of every cell in a range (constants come back as their text).
    GetRangeFormulas {
        workbook: u32,
        sheet: SheetRef,
        range: String,
    },

    /// Write a block whose top-left corner is `start_cell`.
    SetRangeValues {
        workbook: u32,
        sheet: SheetRef,
        start_cell: String,
        values: Vec<Vec<WireValue>>,
    },

    /// Address and values of the sheet's `UsedRange`.
    GetUsedRange { workbook: u32, sheet: SheetRef },

    // -- PowerPoint --
    ListPresentations,

    OpenPresentation { path: String },

    SavePresentation {
        presentation: u32,
        path: Option<String>,
    },

    ListLayouts { presentation: u32 },

    /// Append a slide using a 1-based custom layout of the first master.
    AddSlide { presentation: u32, layout: u32 },

    DeleteSlide { presentation: u32, slide: u32 },

    /// Shapes of a slide and the name of its layout.
    ListShapes { presentation: u32, slide: u32 },

    AddTextBox {
        presentation: u32,
        slide: u32,
        frame: WireFrame,
        text: String,
        font_size: Option<f64>,
    },

    /// `auto_shape` is an `MsoAutoShapeType` value.
    AddShape {
        presentation: u32,
        slide: u32,
        auto_shape: i32,
        frame: WireFrame,
    },

    /// Connector between two shapes' centres; `connector` is an
    /// `MsoConnectorType` value.
    AddConnector {
        presentation: u32,
        slide: u32,
        connector: i32,
        from_shape: u32,
        to_shape: u32,
    },

    EditShape {
        presentation: u32,
        slide: u32,
        shape: u32,
        edit: WireEdit,
    },

    StyleShape {
        presentation: u32,
        slide: u32,
        shape: u32,
        style: WireStyle,
    },

    /// `color` is an OLE colour (`0x00BBGGRR`).
    SetBackground {
        presentation: u32,
        slide: u32,
        color: i32,
    },

    /// Release COM and exit. The user's application keeps running.
    Shutdown,
}

/// Reference to a worksheet by 1-based index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(u32),
    Name(String),
}

/// A cell value as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(WireDate),
    Error(WireError),
}

/// A date cell, as an ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDate {
    pub date: String,
}

/// Excel error values such as `#DIV/0!`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub code: String,
}

/// Position and size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Properties to change on a shape; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

/// Font, fill and line settings with colours already in OLE form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<WireFont>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<WireFill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<WireLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub color: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireFill {
    Solid {
        color: i32,
        /// 0.0 (opaque) to 1.0
        transparency: Option<f64>,
    },
    Gradient {
        start_color: i32,
        end_color: i32,
    },
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireLine {
    pub color: Option<i32>,
    pub weight: Option<f64>,
    /// `MsoLineDashStyle` value
    pub dash_style: Option<i32>,
    /// Hide the line entirely
    #[serde(default)]
    pub hidden: bool,
}

/// A response sent from the bridge back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The request ID this response corresponds to.
    pub id: u64,
    /// The result of the command.
    #[serde(flatten)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ResponseResult {
    #[serde(rename = "ok")]
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ResponseResult {
    pub fn ok(data: ResponseData) -> Self {
        ResponseResult::Ok { data: Some(data) }
    }

    pub fn done() -> Self {
        ResponseResult::Ok { data: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ResponseResult::Error {
            message: message.into(),
        }
    }
}

/// Data returned in successful responses.
///
/// Variants are told apart by their field names, so no two share one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Version { version: String },
    Workbooks { workbooks: Vec<WireWorkbook> },
    Workbook { workbook: WireWorkbook },
    Worksheets { worksheets: Vec<WireSheet> },
    Worksheet { worksheet: WireSheet },
    Value { value: WireValue },
    Values { values: Vec<Vec<WireValue>> },
    Formulas { formulas: Vec<Vec<String>> },
    UsedRange { used_range: WireUsedRange },
    Presentations { presentations: Vec<WirePresentation> },
    Presentation { presentation: WirePresentation },
    Layouts { layouts: Vec<WireLayout> },
    Slide { slide_index: u32 },
    Shapes {
        shapes: Vec<WireShape>,
        layout: Option<String>,
    },
    Shape { shape: WireShape },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireWorkbook {
    /// 1-based position in `Workbooks`
    pub index: u32,
    pub name: String,
    /// `FullName`; just the name for a workbook never saved
    pub full_name: String,
    /// Folder (`Path`); empty for a workbook never saved
    pub path: String,
    pub sheets_count: u32,
    pub saved: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSheet {
    pub index: u32,
    pub name: String,
    pub visible: bool,
}

/// A sheet's `UsedRange`: absolute address (`$A$1:$C$5`) and its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireUsedRange {
    pub address: String,
    pub values: Vec<Vec<WireValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePresentation {
    pub index: u32,
    pub name: String,
    pub full_name: String,
    pub path: String,
    pub slides: u32,
    pub saved: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLayout {
    pub index: u32,
    pub name: String,
}

/// A shape as the application reports it; geometry in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireShape {
    pub id: u32,
    pub name: String,
    /// `MsoShapeType`
    pub type_id: i32,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub text: Option<String>,
    /// `PpPlaceholderType` when the shape is a placeholder
    pub placeholder_type: Option<i32>,
    /// `MsoAutoShapeType` for auto shapes
    pub auto_shape_type: Option<i32>,
}

impl WireValue {
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        WireValue::String(s.to_string())
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        WireValue::String(s)
    }
}

impl From<f64> for WireValue {
    fn from(n: f64) -> Self {
        WireValue::Number(n)
    }
}

impl From<bool> for WireValue {
    fn from(b: bool) -> Self {
        WireValue::Bool(b)
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Null => write!(f, "<empty>"),
            WireValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            WireValue::Number(n) => write!(f, "{n}"),
            WireValue::String(s) => write!(f, "{s}"),
            WireValue::Date(d) => write!(f, "{}", d.date),
            WireValue::Error(e) => write!(f, "{}", e.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = Request {
            id: 7,
            command: Command::SetCellValue {
                workbook: 1,
                sheet: SheetRef::Name("Data".into()),
                cell: "B2".into(),
                value: 42.0.into(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "id": 7,
                "cmd": "SetCellValue",
                "params": {"workbook": 1, "sheet": "Data", "cell": "B2", "value": 42.0}
            })
        );
        let init = serde_json::to_value(Request {
            id: 1,
            command: Command::Init { app: App::PowerPoint },
        })
        .unwrap();
        assert_eq!(init, json!({"id": 1, "cmd": "Init", "params": {"app": "powerpoint"}}));
        let ping: Request = serde_json::from_str(r#"{"id": 2, "cmd": "Ping"}"#).unwrap();
        assert!(matches!(ping.command, Command::Ping));
    }

    #[test]
    fn test_wire_values() {
        let values: Vec<WireValue> = serde_json::from_value(json!([
            null, true, 1.5, "text", {"date": "2024-01-31T00:00:00"}, {"code": "#N/A"}
        ]))
        .unwrap();
        assert_eq!(
            values,
            vec![
                WireValue::Null,
                WireValue::Bool(true),
                WireValue::Number(1.5),
                WireValue::String("text".into()),
                WireValue::Date(WireDate {
                    date: "2024-01-31T00:00:00".into()
                }),
                WireValue::Error(WireError { code: "#N/A".into() }),
            ]
        );
        assert_eq!(values[5].to_string(), "#N/A");
    }

    #[test]
    fn test_response_data_variants() {
        let ok: Response = serde_json::from_value(json!({
            "id": 3, "status": "ok", "data": {"slide_index": 4}
        }))
        .unwrap();
        assert!(matches!(
            ok.result,
            ResponseResult::Ok {
                data: Some(ResponseData::Slide { slide_index: 4 })
            }
        ));

        let shapes = ResponseData::Shapes {
            shapes: vec![],
            layout: Some("Blank".into()),
        };
        let back: ResponseData =
            serde_json::from_str(&serde_json::to_string(&shapes).unwrap()).unwrap();
        assert_eq!(back, shapes);

        let err: Response =
            serde_json::from_str(r#"{"id": 9, "status": "error", "message": "boom"}"#).unwrap();
        assert!(matches!(err.result, ResponseResult::Error { message } if message == "boom"));

        let done = serde_json::to_value(Response {
            id: 1,
            result: ResponseResult::done(),
        })
        .unwrap();
        assert_eq!(done, json!({"id": 1, "status": "ok"}));
    }

    #[test]
    fn test_style_serialization() {
        let style = WireStyle {
            fill: Some(WireFill::Solid {
                color: 0x0000FF,
                transparency: Some(0.25),
            }),
            line: Some(WireLine {
                hidden: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fill"], json!({"type": "solid", "color": 255, "transparency": 0.25}));
        assert_eq!(serde_json::from_value::<WireStyle>(json).unwrap(), style);
    }
}
