//! Conversions between the wire types and the shared office-core model

use chrono::NaiveDateTime;
use office_com_protocol::{
    WireDate, WireEdit, WireError, WireFill, WireFont, WireFrame, WireLine, WireShape, WireStyle,
    WireValue,
};
use office_core::shape::catalog::auto_shape_by_mso;
use office_core::shape::{FillStyle, Frame, LineDash, ShapeEdit, StyleProperties};
use office_core::{CellValue, ShapeInfo};

const DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub fn cell_value(wire: &WireValue) -> CellValue {
    match wire {
        WireValue::Null => CellValue::Empty,
        WireValue::Bool(b) => CellValue::Boolean(*b),
        WireValue::Number(n) => CellValue::Number(*n),
        WireValue::String(s) if s.is_empty() => CellValue::Empty,
        WireValue::String(s) => CellValue::Text(s.clone()),
        WireValue::Date(WireDate { date }) => DATE_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(date, f).ok())
            .map_or_else(|| CellValue::Text(date.clone()), CellValue::DateTime),
        WireValue::Error(WireError { code }) => CellValue::Error(code.clone()),
    }
}

/// Value to write; a formula goes over as its text so the application parses it
pub fn wire_value(value: &CellValue) -> WireValue {
    match value {
        CellValue::Empty => WireValue::Null,
        CellValue::Boolean(b) => WireValue::Bool(*b),
        CellValue::Number(n) => WireValue::Number(*n),
        CellValue::Text(s) => WireValue::String(s.clone()),
        CellValue::DateTime(dt) => WireValue::Date(WireDate {
            date: dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }),
        CellValue::Error(code) => WireValue::Error(WireError { code: code.clone() }),
        CellValue::Formula { text, .. } => WireValue::String(text.clone()),
    }
}

pub fn cell_rows(values: &[Vec<WireValue>]) -> Vec<Vec<CellValue>> {
    values
        .iter()
        .map(|row| row.iter().map(cell_value).collect())
        .collect()
}

/// Formula texts as a grid of text cells, for [`office_core::Grid::with_formulas`]
pub fn formula_rows(formulas: &[Vec<String>]) -> Vec<Vec<CellValue>> {
    formulas
        .iter()
        .map(|row| row.iter().map(|f| CellValue::Text(f.clone())).collect())
        .collect()
}

pub fn shape_info(wire: &WireShape) -> ShapeInfo {
    let mut info = ShapeInfo::new(wire.id, wire.name.as_str(), wire.type_id)
        .with_geometry(wire.left, wire.top, wire.width, wire.height);
    info.rotation = wire.rotation;
    if let Some(text) = &wire.text {
        info = info.with_text(text.as_str());
    }
    if let Some(ph) = wire.placeholder_type {
        info = info.with_placeholder(ph);
    }
    if let Some(mso) = wire.auto_shape_type {
        if let Some(kind) = auto_shape_by_mso(mso) {
            info = info.with_auto_shape(kind.name);
        }
    }
    info
}

pub fn wire_frame(frame: Frame) -> WireFrame {
    WireFrame {
        left: frame.left,
        top: frame.top,
        width: frame.width,
        height: frame.height,
    }
}

pub fn wire_edit(edit: &ShapeEdit) -> WireEdit {
    WireEdit {
        text: edit.text.clone(),
        left: edit.left,
        top: edit.top,
        width: edit.width,
        height: edit.height,
        name: edit.name.clone(),
        rotation: edit.rotation.map(|r| r.rem_euclid(360.0)),
    }
}

pub fn wire_style(style: &StyleProperties) -> WireStyle {
    WireStyle {
        font: style.font.as_ref().map(|font| WireFont {
            name: font.family.clone(),
            size: font.size,
            bold: font.bold,
            italic: font.italic,
            underline: font.underline,
            color: font.color.map(|c| c.to_ole()),
        }),
        fill: style.fill.as_ref().map(|fill| match fill {
            FillStyle::Solid {
                color,
                transparency,
            } => WireFill::Solid {
                color: color.to_ole(),
                transparency: transparency.map(|t| t / 100.0),
            },
            FillStyle::Gradient { gradient } => WireFill::Gradient {
                start_color: gradient.start_color.to_ole(),
                end_color: gradient.end_color.to_ole(),
            },
            FillStyle::None => WireFill::None,
        }),
        line: style.line.as_ref().map(|line| WireLine {
            color: line.color.map(|c| c.to_ole()),
            weight: line.width,
            dash_style: line.style.and_then(LineDash::mso_id),
            hidden: line.style == Some(LineDash::None),
        }),
    }
}
