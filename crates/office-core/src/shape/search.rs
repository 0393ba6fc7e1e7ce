//! Shape searches and slide analysis

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::catalog::{self, TypeFilter, MSO_AUTO_SHAPE, MSO_TEXT_BOX};
use super::{Point, ShapeInfo, Size};
use crate::error::{Error, Result};

/// Characters of text kept in search previews
const PREVIEW_CHARS: usize = 100;

/// Default search radius around a position, in points (one inch)
pub const DEFAULT_PROXIMITY: f64 = 72.0;

/// A text-search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeTextMatch {
    #[serde(flatten)]
    pub shape: ShapeInfo,
    pub text_preview: String,
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Shapes whose text contains (or, with `partial == false`, equals) `search`,
/// ignoring case.
pub fn find_by_text(shapes: &[ShapeInfo], search: &str, partial: bool) -> Vec<ShapeTextMatch> {
    let needle = search.to_lowercase();
    shapes
        .iter()
        .filter(|s| s.has_text)
        .filter_map(|s| {
            let text = s.text.as_deref()?;
            let hay = text.to_lowercase();
            let found = if partial {
                hay.contains(&needle)
            } else {
                hay == needle
            };
            found.then(|| ShapeTextMatch {
                shape: s.clone(),
                text_preview: preview(text),
            })
        })
        .collect()
}

/// Shapes matching a friendly type name such as `textbox` or `picture`
pub fn find_by_type<'a>(shapes: &'a [ShapeInfo], type_name: &str) -> Result<Vec<&'a ShapeInfo>> {
    let filter = catalog::type_filter(type_name)?;
    Ok(shapes
        .iter()
        .filter(|s| match filter {
            TypeFilter::Type(id) => s.type_id == id,
            TypeFilter::AutoShape(name) => {
                s.type_id == MSO_AUTO_SHAPE && s.auto_shape.as_deref() == Some(name)
            }
            TypeFilter::TextBox => {
                s.type_id == MSO_TEXT_BOX || (s.type_id == MSO_AUTO_SHAPE && s.has_text)
            }
        })
        .collect())
}

/// First placeholder of the named kind (`title`, `body`, `footer`, ...)
pub fn find_placeholder<'a>(shapes: &'a [ShapeInfo], name: &str) -> Result<Option<&'a ShapeInfo>> {
    let wanted = catalog::placeholder_type(name)?;
    Ok(shapes
        .iter()
        .find(|s| s.is_placeholder && s.placeholder_type_id == Some(wanted)))
}

/// Element category for searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    #[default]
    Any,
    Text,
    Image,
    Chart,
    Table,
    Shape,
}

impl ElementType {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "any" => Ok(ElementType::Any),
            "text" => Ok(ElementType::Text),
            "image" => Ok(ElementType::Image),
            "chart" => Ok(ElementType::Chart),
            "table" => Ok(ElementType::Table),
            "shape" => Ok(ElementType::Shape),
            _ => Err(Error::UnknownName(format!(
                "Unknown element type '{name}'. Supported types: any, text, image, chart, table, shape"
            ))),
        }
    }
}

/// Target position for element searches
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PositionQuery {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_proximity")]
    pub proximity: f64,
}

fn default_proximity() -> f64 {
    DEFAULT_PROXIMITY
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementQuery {
    pub element_type: ElementType,
    pub search_text: Option<String>,
    pub position: Option<PositionQuery>,
}

/// A shape as element listings report it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSummary {
    /// Element id when one has been issued
    pub id: Option<String>,
    pub shape_id: u32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub position: Point,
    pub size: Size,
}

impl ElementSummary {
    pub fn of(shape: &ShapeInfo) -> Self {
        Self {
            id: shape.element_id.clone(),
            shape_id: shape.id,
            kind: shape.kind_label(),
            text: shape.visible_text().map(str::to_string),
            position: shape.position(),
            size: shape.size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementMatch {
    #[serde(flatten)]
    pub element: ElementSummary,
    pub confidence: f64,
}

fn type_matches(shape: &ShapeInfo, wanted: ElementType) -> bool {
    wanted == ElementType::Any || shape.category() == wanted
}

fn text_confidence(shape: &ShapeInfo, search: &str) -> Option<f64> {
    let text = shape.text.as_deref()?.trim().to_lowercase();
    let needle = search.trim().to_lowercase();
    if text == needle {
        Some(1.0)
    } else if !needle.is_empty() && text.contains(&needle) {
        Some(needle.chars().count() as f64 / text.chars().count() as f64)
    } else {
        None
    }
}

/// Score shapes against a query, best match first.
///
/// Text matches score 1.0 when exact and `len(search) / len(text)` for a
/// substring; a position narrows to shapes within `proximity` of the target and
/// scales the score by closeness.
pub fn find_elements(shapes: &[ShapeInfo], query: &ElementQuery) -> Vec<ElementMatch> {
    let mut results: Vec<ElementMatch> = shapes
        .iter()
        .filter(|s| type_matches(s, query.element_type))
        .filter_map(|s| {
            // blank search text filters nothing
            let mut confidence = match query.search_text.as_deref().map(str::trim) {
                Some(search) if !search.is_empty() => text_confidence(s, search)?,
                _ => 1.0,
            };
            if let Some(pos) = &query.position {
                let distance = ((s.left - pos.x).powi(2) + (s.top - pos.y).powi(2)).sqrt();
                if distance > pos.proximity {
                    return None;
                }
                if pos.proximity > 0.0 {
                    confidence *= 1.0 - distance / pos.proximity;
                }
            }
            Some(ElementMatch {
                element: ElementSummary::of(s),
                confidence,
            })
        })
        .collect();
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    results
}

/// Shapes on a slide grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlideContent {
    pub text_boxes: Vec<ElementSummary>,
    pub images: Vec<ElementSummary>,
    pub shapes: Vec<ElementSummary>,
    pub charts: Vec<ElementSummary>,
    pub tables: Vec<ElementSummary>,
    pub layout: Option<String>,
}

pub fn analyze_slide(layout: Option<String>, shapes: &[ShapeInfo]) -> SlideContent {
    let mut content = SlideContent {
        layout,
        ..SlideContent::default()
    };
    for shape in shapes {
        let summary = ElementSummary::of(shape);
        match shape.category() {
            ElementType::Image => content.images.push(summary),
            ElementType::Chart => content.charts.push(summary),
            ElementType::Table => content.tables.push(summary),
            ElementType::Text => content.text_boxes.push(summary),
            ElementType::Shape | ElementType::Any => content.shapes.push(summary),
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::catalog::{MSO_CHART, MSO_PICTURE};

    fn slide() -> Vec<ShapeInfo> {
        vec![
            ShapeInfo::new(2, "Title 1", MSO_AUTO_SHAPE)
                .with_placeholder(1)
                .with_text("Quarterly Results")
                .with_geometry(36.0, 20.0, 600.0, 60.0),
            ShapeInfo::new(3, "TextBox 2", MSO_TEXT_BOX)
                .with_text("results")
                .with_geometry(72.0, 72.0, 200.0, 40.0),
            ShapeInfo::new(4, "Rect", MSO_AUTO_SHAPE)
                .with_auto_shape("rectangle")
                .with_text("Note")
                .with_geometry(300.0, 300.0, 100.0, 50.0),
            ShapeInfo::new(5, "Picture 4", MSO_PICTURE).with_geometry(0.0, 0.0, 50.0, 50.0),
            ShapeInfo::new(6, "Chart 5", MSO_CHART).with_geometry(400.0, 0.0, 50.0, 50.0),
            ShapeInfo::new(7, "Oval", MSO_AUTO_SHAPE)
                .with_auto_shape("oval")
                .with_geometry(500.0, 500.0, 10.0, 10.0),
        ]
    }

    #[test]
    fn test_find_by_text() {
        let shapes = slide();
        let hits = find_by_text(&shapes, "RESULTS", true);
        assert_eq!(hits.iter().map(|h| h.shape.id).collect::<Vec<_>>(), vec![2, 3]);
        let exact = find_by_text(&shapes, "Results", false);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].shape.id, 3);
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(150);
        let shapes = vec![ShapeInfo::new(1, "t", MSO_TEXT_BOX).with_text(long)];
        let hit = &find_by_text(&shapes, "x", true)[0];
        assert_eq!(hit.text_preview.len(), 103);
        assert!(hit.text_preview.ends_with("..."));
    }

    #[test]
    fn test_find_by_type() {
        let shapes = slide();
        let boxes = find_by_type(&shapes, "textbox").unwrap();
        assert_eq!(boxes.iter().map(|s| s.id).collect::<Vec<_>>(), vec![3, 4]);
        let ovals = find_by_type(&shapes, "Oval").unwrap();
        assert_eq!(ovals.len(), 1);
        assert!(find_by_type(&shapes, "sparkle").is_err());
    }

    #[test]
    fn test_find_placeholder() {
        let shapes = slide();
        assert_eq!(find_placeholder(&shapes, "title").unwrap().unwrap().id, 2);
        assert!(find_placeholder(&shapes, "footer").unwrap().is_none());
        assert!(find_placeholder(&shapes, "nope").is_err());
    }

    #[test]
    fn test_find_elements_confidence_order() {
        let shapes = slide();
        let query = ElementQuery {
            search_text: Some("results".into()),
            ..ElementQuery::default()
        };
        let found = find_elements(&shapes, &query);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].element.shape_id, 3);
        assert_eq!(found[0].confidence, 1.0);
        assert!((found[1].confidence - 7.0 / 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_elements_blank_search_matches_all() {
        let shapes = slide();
        let everything = find_elements(&shapes, &ElementQuery::default());
        for blank in ["", "   "] {
            let query = ElementQuery {
                search_text: Some(blank.into()),
                ..ElementQuery::default()
            };
            let found = find_elements(&shapes, &query);
            assert_eq!(found, everything);
            assert!(found.iter().all(|m| m.confidence == 1.0));
        }
        assert_eq!(everything.len(), shapes.len());
    }

    #[test]
    fn test_find_elements_by_type_and_position() {
        let shapes = slide();
        let images = find_elements(
            &shapes,
            &ElementQuery {
                element_type: ElementType::Image,
                ..ElementQuery::default()
            },
        );
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].element.kind, "image");

        let near = find_elements(
            &shapes,
            &ElementQuery {
                position: Some(PositionQuery {
                    x: 72.0,
                    y: 72.0,
                    proximity: DEFAULT_PROXIMITY,
                }),
                ..ElementQuery::default()
            },
        );
        assert_eq!(near[0].element.shape_id, 3);
        assert_eq!(near[0].confidence, 1.0);
        assert!(near.iter().all(|m| m.element.shape_id != 7));
    }

    #[test]
    fn test_analyze_slide() {
        let content = analyze_slide(Some("Title Only".into()), &slide());
        assert_eq!(content.text_boxes.len(), 3);
        assert_eq!(content.images.len(), 1);
        assert_eq!(content.charts.len(), 1);
        assert_eq!(content.shapes.len(), 1);
        assert!(content.tables.is_empty());
        assert_eq!(content.layout.as_deref(), Some("Title Only"));
    }
}
