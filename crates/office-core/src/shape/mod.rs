//! Slide shape model shared by both PowerPoint backends.
//!
//! Backends report every shape as a [`ShapeInfo`] with geometry in points; the
//! searches and analyzers in [`search`] work on those snapshots only.

pub mod catalog;
pub mod search;
pub mod style;

use serde::{Deserialize, Serialize};

use catalog::{
    placeholder_name, shape_type_name, MSO_AUTO_SHAPE, MSO_CHART, MSO_LINKED_PICTURE,
    MSO_PICTURE, MSO_PLACEHOLDER, MSO_TABLE,
};

pub use search::{
    analyze_slide, find_by_text, find_by_type, find_elements, find_placeholder, ElementMatch,
    ElementQuery, ElementSummary, ElementType, PositionQuery, ShapeTextMatch, SlideContent,
};
pub use style::{FillStyle, FontStyle, GradientFill, LineDash, LineStyle, StyleProperties};

/// Points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// A position on a slide in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A size in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// A shape's bounding box in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Snapshot of one shape on a slide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeInfo {
    pub id: u32,
    pub name: String,
    pub type_id: i32,
    pub type_name: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub has_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub is_placeholder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_type_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_type_name: Option<String>,
    /// Catalogue name (or raw preset) for auto-shapes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_shape: Option<String>,
    /// Server-issued element id, filled in when the shape is reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl ShapeInfo {
    /// A shape with the given id, name and `MsoShapeType`; everything else defaulted
    pub fn new(id: u32, name: impl Into<String>, type_id: i32) -> Self {
        Self {
            id,
            name: name.into(),
            type_id,
            type_name: shape_type_name(type_id),
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            has_text: false,
            text: None,
            is_placeholder: type_id == MSO_PLACEHOLDER,
            placeholder_type_id: None,
            placeholder_type_name: None,
            auto_shape: None,
            element_id: None,
        }
    }

    pub fn with_geometry(mut self, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.left = left;
        self.top = top;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_frame(self, frame: Frame) -> Self {
        self.with_geometry(frame.left, frame.top, frame.width, frame.height)
    }

    pub fn frame(&self) -> Frame {
        Frame::new(self.left, self.top, self.width, self.height)
    }

    /// Attach text; `has_text` follows whether it is non-empty
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.has_text = !text.is_empty();
        self.text = Some(text);
        self
    }

    pub fn with_placeholder(mut self, placeholder_type: i32) -> Self {
        self.is_placeholder = true;
        self.type_id = MSO_PLACEHOLDER;
        self.type_name = shape_type_name(MSO_PLACEHOLDER);
        self.placeholder_type_id = Some(placeholder_type);
        self.placeholder_type_name = placeholder_name(placeholder_type).map(str::to_string);
        self
    }

    pub fn with_auto_shape(mut self, auto_shape: impl Into<String>) -> Self {
        self.auto_shape = Some(auto_shape.into());
        self
    }

    pub fn position(&self) -> Point {
        Point {
            x: self.left,
            y: self.top,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }

    /// Trimmed text, if the shape has any that is not blank
    pub fn visible_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Category used by element searches and slide analysis
    pub fn category(&self) -> ElementType {
        match self.type_id {
            MSO_PICTURE | MSO_LINKED_PICTURE => ElementType::Image,
            MSO_CHART => ElementType::Chart,
            MSO_TABLE => ElementType::Table,
            _ if self.visible_text().is_some() => ElementType::Text,
            _ => ElementType::Shape,
        }
    }

    /// Short lowercase kind for element listings (`image`, `oval`, `textbox`, ...)
    pub fn kind_label(&self) -> String {
        match self.category() {
            ElementType::Image => "image".into(),
            ElementType::Chart => "chart".into(),
            ElementType::Table => "table".into(),
            _ if self.type_id == MSO_AUTO_SHAPE => self
                .auto_shape
                .clone()
                .unwrap_or_else(|| "auto_shape".into()),
            _ => self.type_name.to_lowercase(),
        }
    }
}

/// Property changes accepted by `edit_element`; geometry in points, rotation in degrees
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShapeEdit {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

impl ShapeEdit {
    pub fn has_geometry(&self) -> bool {
        self.left.is_some() || self.top.is_some() || self.width.is_some() || self.height.is_some()
    }

    /// Apply the geometry fields over a shape's current frame
    pub fn frame_over(&self, shape: &ShapeInfo) -> Frame {
        Frame::new(
            self.left.unwrap_or(shape.left),
            self.top.unwrap_or(shape.top),
            self.width.unwrap_or(shape.width),
            self.height.unwrap_or(shape.height),
        )
    }
}

/// End points of a connector drawn between two shapes' centres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPath {
    pub begin: Point,
    pub end: Point,
}

impl ConnectorPath {
    pub fn between(from: &ShapeInfo, to: &ShapeInfo) -> Self {
        Self {
            begin: from.center(),
            end: to.center(),
        }
    }

    /// Bounding box plus whether the line runs right-to-left / bottom-to-top
    pub fn bounds(&self) -> (Frame, bool, bool) {
        let frame = Frame::new(
            self.begin.x.min(self.end.x),
            self.begin.y.min(self.end.y),
            (self.end.x - self.begin.x).abs(),
            (self.end.y - self.begin.y).abs(),
        );
        let flip_h = self.end.x < self.begin.x;
        let flip_v = self.end.y < self.begin.y;
        (frame, flip_h, flip_v)
    }
}
