//! Name tables for shape types, placeholders, auto-shapes and connectors.
//!
//! Numbers are the Office automation enums (`MsoShapeType`, `PpPlaceholderType`,
//! `MsoAutoShapeType`, `MsoConnectorType`); preset names are DrawingML `prst`
//! values used in package files.

use crate::error::{Error, Result};

/// `MsoShapeType` values 1..=31
const SHAPE_TYPE_NAMES: [&str; 31] = [
    "AutoShape",
    "Callout",
    "Chart",
    "Comment",
    "Freeform",
    "Group",
    "EmbeddedOLEObject",
    "FormControl",
    "Line",
    "LinkedOLEObject",
    "LinkedPicture",
    "OLEControlObject",
    "Picture",
    "Placeholder",
    "TextEffect",
    "Media",
    "TextBox",
    "ScriptAnchor",
    "Table",
    "Canvas",
    "Diagram",
    "Ink",
    "InkComment",
    "SmartArt",
    "Slicer",
    "WebVideo",
    "ContentApp",
    "Graphic",
    "LinkedGraphic",
    "3DModel",
    "Linked3DModel",
];

pub const MSO_AUTO_SHAPE: i32 = 1;
pub const MSO_CHART: i32 = 3;
pub const MSO_FREEFORM: i32 = 5;
pub const MSO_GROUP: i32 = 6;
pub const MSO_LINE: i32 = 9;
pub const MSO_LINKED_PICTURE: i32 = 11;
pub const MSO_PICTURE: i32 = 13;
pub const MSO_PLACEHOLDER: i32 = 14;
pub const MSO_MEDIA: i32 = 16;
pub const MSO_TEXT_BOX: i32 = 17;
pub const MSO_TABLE: i32 = 19;
pub const MSO_SMART_ART: i32 = 24;
pub const MSO_GRAPHIC: i32 = 28;

/// Readable name for an `MsoShapeType`
pub fn shape_type_name(type_id: i32) -> String {
    usize::try_from(type_id)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| SHAPE_TYPE_NAMES.get(i))
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Unknown ({type_id})"))
}

/// Which shapes a friendly type name selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    /// Any shape of this `MsoShapeType`
    Type(i32),
    /// Auto-shapes with this catalogue name
    AutoShape(&'static str),
    /// Text boxes, plus auto-shapes that carry text
    TextBox,
}

/// Friendly names accepted by type searches
pub const TYPE_FILTERS: &[(&str, TypeFilter)] = &[
    ("rectangle", TypeFilter::AutoShape("rectangle")),
    ("autoshape", TypeFilter::Type(MSO_AUTO_SHAPE)),
    ("textbox", TypeFilter::TextBox),
    ("oval", TypeFilter::AutoShape("oval")),
    ("table", TypeFilter::Type(MSO_TABLE)),
    ("chart", TypeFilter::Type(MSO_CHART)),
    ("picture", TypeFilter::Type(MSO_PICTURE)),
    ("line", TypeFilter::Type(MSO_LINE)),
    ("connector", TypeFilter::Type(MSO_LINE)),
    ("placeholder", TypeFilter::Type(MSO_PLACEHOLDER)),
    ("group", TypeFilter::Type(MSO_GROUP)),
    ("freeform", TypeFilter::Type(MSO_FREEFORM)),
    ("media", TypeFilter::Type(MSO_MEDIA)),
    ("smartart", TypeFilter::Type(MSO_SMART_ART)),
];

pub fn type_filter(name: &str) -> Result<TypeFilter> {
    let wanted = name.trim().to_lowercase();
    TYPE_FILTERS
        .iter()
        .find(|(n, _)| *n == wanted)
        .map(|(_, f)| *f)
        .ok_or_else(|| {
            Error::UnknownName(format!(
                "Unknown shape type name '{name}'. Supported types: {}",
                join_names(TYPE_FILTERS.iter().map(|(n, _)| *n))
            ))
        })
}

/// Friendly placeholder names with their `PpPlaceholderType`
pub const PLACEHOLDERS: &[(&str, i32)] = &[
    ("title", 1),
    ("body", 2),
    ("centertitle", 3),
    ("subtitle", 4),
    ("verticaltitle", 5),
    ("verticalbody", 6),
    ("object", 7),
    ("content", 7),
    ("chart", 8),
    ("bitmap", 9),
    ("media", 10),
    ("orgchart", 11),
    ("table", 12),
    ("slidenumber", 13),
    ("header", 14),
    ("footer", 15),
    ("date", 16),
    ("verticalobject", 17),
    ("picture", 18),
];

pub fn placeholder_type(name: &str) -> Result<i32> {
    let wanted = name.trim().to_lowercase();
    PLACEHOLDERS
        .iter()
        .find(|(n, _)| *n == wanted)
        .map(|(_, id)| *id)
        .ok_or_else(|| {
            Error::UnknownName(format!(
                "Unknown placeholder name '{name}'. Supported names: {}",
                join_names(PLACEHOLDERS.iter().map(|(n, _)| *n))
            ))
        })
}

pub fn placeholder_name(type_id: i32) -> Option<&'static str> {
    PLACEHOLDERS
        .iter()
        .find(|(_, id)| *id == type_id)
        .map(|(n, _)| *n)
}

/// `<p:ph type="...">` values and their `PpPlaceholderType`
const OOXML_PLACEHOLDERS: &[(&str, i32)] = &[
    ("title", 1),
    ("body", 2),
    ("ctrTitle", 3),
    ("subTitle", 4),
    ("obj", 7),
    ("chart", 8),
    ("clipArt", 9),
    ("media", 10),
    ("dgm", 11),
    ("tbl", 12),
    ("sldNum", 13),
    ("hdr", 14),
    ("ftr", 15),
    ("dt", 16),
    ("pic", 18),
];

/// Placeholder type of a `<p:ph>`; a missing `type` attribute means `obj`
pub fn placeholder_from_ooxml(ph_type: Option<&str>) -> i32 {
    let ph_type = ph_type.unwrap_or("obj");
    OOXML_PLACEHOLDERS
        .iter()
        .find(|(n, _)| *n == ph_type)
        .map_or(7, |(_, id)| *id)
}

/// An auto-shape the tools can create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoShapeKind {
    pub name: &'static str,
    /// DrawingML preset geometry
    pub preset: &'static str,
    /// `MsoAutoShapeType`
    pub mso_id: i32,
}

const fn kind(name: &'static str, preset: &'static str, mso_id: i32) -> AutoShapeKind {
    AutoShapeKind {
        name,
        preset,
        mso_id,
    }
}

pub const AUTO_SHAPES: &[AutoShapeKind] = &[
    kind("rectangle", "rect", 1),
    kind("rounded_rectangle", "roundRect", 5),
    kind("oval", "ellipse", 9),
    kind("triangle", "triangle", 7),
    kind("right_triangle", "rtTriangle", 8),
    kind("diamond", "diamond", 4),
    kind("pentagon", "pentagon", 12),
    kind("hexagon", "hexagon", 10),
    kind("heptagon", "heptagon", 145),
    kind("octagon", "octagon", 6),
    kind("decagon", "decagon", 144),
    kind("dodecagon", "dodecagon", 146),
    kind("star4", "star4", 91),
    kind("star5", "star5", 92),
    kind("star6", "star6", 147),
    kind("star7", "star7", 148),
    kind("star8", "star8", 93),
    kind("star10", "star10", 149),
    kind("star12", "star12", 150),
    kind("star16", "star16", 94),
    kind("star24", "star24", 95),
    kind("star32", "star32", 96),
    kind("right_arrow", "rightArrow", 33),
    kind("left_arrow", "leftArrow", 34),
    kind("up_arrow", "upArrow", 35),
    kind("down_arrow", "downArrow", 36),
    kind("left_right_arrow", "leftRightArrow", 37),
    kind("up_down_arrow", "upDownArrow", 38),
    kind("arrow", "rightArrow", 33),
    kind("heart", "heart", 21),
    kind("lightning_bolt", "lightningBolt", 22),
    kind("sun", "sun", 23),
    kind("moon", "moon", 24),
    kind("smiley_face", "smileyFace", 17),
    kind("cloud", "cloud", 179),
    kind("flow_chart_process", "flowChartProcess", 61),
    kind("flow_chart_decision", "flowChartDecision", 63),
    kind("flow_chart_connector", "flowChartConnector", 73),
];

/// Look up an auto-shape by its friendly name (case-insensitive)
pub fn auto_shape(name: &str) -> Result<&'static AutoShapeKind> {
    let wanted = name.trim().to_lowercase();
    AUTO_SHAPES.iter().find(|k| k.name == wanted).ok_or_else(|| {
        Error::UnknownName(format!(
            "Unsupported shape type: {name}. Supported types: {}",
            join_names(AUTO_SHAPES.iter().map(|k| k.name))
        ))
    })
}

pub fn auto_shape_by_preset(preset: &str) -> Option<&'static AutoShapeKind> {
    AUTO_SHAPES.iter().find(|k| k.preset == preset)
}

pub fn auto_shape_by_mso(mso_id: i32) -> Option<&'static AutoShapeKind> {
    AUTO_SHAPES.iter().find(|k| k.mso_id == mso_id)
}

/// A connector line style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorKind {
    pub name: &'static str,
    pub preset: &'static str,
    /// `MsoConnectorType`
    pub mso_id: i32,
}

pub const CONNECTORS: &[ConnectorKind] = &[
    ConnectorKind {
        name: "straight",
        preset: "straightConnector1",
        mso_id: 1,
    },
    ConnectorKind {
        name: "elbow",
        preset: "bentConnector3",
        mso_id: 2,
    },
    ConnectorKind {
        name: "curved",
        preset: "curvedConnector3",
        mso_id: 3,
    },
];

pub fn connector(name: &str) -> Result<&'static ConnectorKind> {
    let wanted = name.trim().to_lowercase();
    CONNECTORS.iter().find(|k| k.name == wanted).ok_or_else(|| {
        Error::UnknownName(format!(
            "Unsupported connector type: {name}. Supported types: {}",
            join_names(CONNECTORS.iter().map(|k| k.name))
        ))
    })
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_type_names() {
        assert_eq!(shape_type_name(1), "AutoShape");
        assert_eq!(shape_type_name(17), "TextBox");
        assert_eq!(shape_type_name(31), "Linked3DModel");
        assert_eq!(shape_type_name(0), "Unknown (0)");
        assert_eq!(shape_type_name(-2), "Unknown (-2)");
        assert_eq!(shape_type_name(99), "Unknown (99)");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholder_type("Title").unwrap(), 1);
        assert_eq!(placeholder_type("content").unwrap(), 7);
        assert_eq!(placeholder_name(7), Some("object"));
        assert_eq!(placeholder_from_ooxml(None), 7);
        assert_eq!(placeholder_from_ooxml(Some("ctrTitle")), 3);
        let err = placeholder_type("banner").unwrap_err().to_string();
        assert!(err.contains("Supported names: title, body"));
    }

    #[test]
    fn test_auto_shapes() {
        let oval = auto_shape("OVAL").unwrap();
        assert_eq!((oval.preset, oval.mso_id), ("ellipse", 9));
        assert_eq!(auto_shape("arrow").unwrap().preset, "rightArrow");
        assert_eq!(auto_shape_by_preset("rightArrow").unwrap().name, "right_arrow");
        assert_eq!(auto_shape_by_mso(179).unwrap().name, "cloud");
        assert!(auto_shape("blob").unwrap_err().to_string().contains("Supported types"));
    }

    #[test]
    fn test_connectors_and_filters() {
        assert_eq!(connector("Elbow").unwrap().preset, "bentConnector3");
        assert!(connector("zigzag").is_err());
        assert_eq!(type_filter("TextBox").unwrap(), TypeFilter::TextBox);
        assert!(type_filter("hologram").is_err());
    }
}
