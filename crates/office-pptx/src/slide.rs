//! Slides, layouts and masters as parsed parts

use office_core::{Rgb, ShapeInfo};

use crate::error::{PptxError, PptxResult};
use crate::rels::Relationships;
use crate::shape::{self, Placeholder, ShapeKind, Transform};
use crate::xml::XmlElement;

const C_SLD_ORDER: &[&str] = &["bg", "spTree", "custDataLst", "controls", "extLst"];

/// Any part with a `p:cSld/p:spTree`: slides, layouts and masters
#[derive(Debug, Clone)]
pub struct SlidePart {
    pub(crate) part: String,
    pub(crate) root: XmlElement,
    pub(crate) rels: Relationships,
}

impl SlidePart {
    pub(crate) fn new(part: String, root: XmlElement, rels: Relationships) -> Self {
        Self { part, root, rels }
    }

    pub fn part_name(&self) -> &str {
        &self.part
    }

    /// `p:cSld/@name`
    pub fn name(&self) -> Option<&str> {
        self.root.child("cSld").and_then(|c| c.attr("name"))
    }

    pub(crate) fn sp_tree_mut(&mut self) -> PptxResult<&mut XmlElement> {
        let part = self.part.clone();
        self.root
            .find_mut(&["cSld", "spTree"])
            .ok_or_else(|| PptxError::InvalidFormat(format!("{part} has no shape tree")))
    }

    /// Top-level shape elements in z-order
    pub(crate) fn shape_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.root
            .find(&["cSld", "spTree"])
            .into_iter()
            .flat_map(|tree| tree.elements())
            .filter(|e| ShapeKind::of(e).is_some())
    }

    pub(crate) fn shape(&self, id: u32) -> PptxResult<&XmlElement> {
        self.shape_elements()
            .find(|e| shape::shape_id(e) == Some(id))
            .ok_or(PptxError::ShapeNotFound(id))
    }

    pub(crate) fn shape_mut(&mut self, id: u32) -> PptxResult<&mut XmlElement> {
        self.sp_tree_mut()?
            .elements_mut()
            .find(|e| ShapeKind::of(e).is_some() && shape::shape_id(e) == Some(id))
            .ok_or(PptxError::ShapeNotFound(id))
    }

    /// One more than the largest `cNvPr` id anywhere in the part
    pub(crate) fn next_shape_id(&self) -> u32 {
        let mut max = 1;
        self.root.walk(&mut |e| {
            if e.is("cNvPr") {
                if let Some(id) = e.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                    max = max.max(id);
                }
            }
        });
        max + 1
    }

    /// Placeholders of this part with their own transforms
    pub(crate) fn placeholder_transforms(&self) -> Vec<(Placeholder, Transform)> {
        self.shape_elements()
            .filter_map(|e| Some((shape::placeholder(e)?, shape::transform(e)?)))
            .collect()
    }
}

/// Find the transform a placeholder inherits: same `idx` first, then same type
pub(crate) fn inherited_transform(
    wanted: &Placeholder,
    candidates: &[(Placeholder, Transform)],
) -> Option<Transform> {
    if let Some(idx) = wanted.idx.filter(|i| *i > 0) {
        if let Some((_, t)) = candidates.iter().find(|(ph, _)| ph.idx == Some(idx)) {
            return Some(*t);
        }
    }
    let wanted_type = wanted.effective_type();
    candidates
        .iter()
        .find(|(ph, _)| ph.effective_type() == wanted_type)
        .map(|(_, t)| *t)
}

/// Master placeholders only come in title/body flavours plus the furniture
pub(crate) fn master_placeholder_for(wanted: &Placeholder) -> Placeholder {
    let ph_type = match wanted.effective_type() {
        "ctrTitle" | "title" => "title",
        "dt" => "dt",
        "ftr" => "ftr",
        "sldNum" => "sldNum",
        _ => "body",
    };
    Placeholder {
        ph_type: Some(ph_type.to_string()),
        idx: None,
    }
}

/// A slide in presentation order
#[derive(Debug, Clone)]
pub struct Slide {
    pub(crate) content: SlidePart,
    pub(crate) layout_part: Option<String>,
    /// `p:sldId/@id` in the presentation's slide list
    pub(crate) slide_id: u32,
    pub(crate) rel_id: String,
    pub(crate) dirty: bool,
}

impl Slide {
    pub fn part_name(&self) -> &str {
        &self.content.part
    }

    pub(crate) fn shape_mut(&mut self, id: u32) -> PptxResult<&mut XmlElement> {
        self.dirty = true;
        self.content.shape_mut(id)
    }

    pub(crate) fn push_shape(&mut self, element: XmlElement) -> PptxResult<()> {
        self.dirty = true;
        let tree = self.content.sp_tree_mut()?;
        tree.children.push(crate::xml::XmlNode::Element(element));
        Ok(())
    }

    /// Replace the background with a solid colour
    pub(crate) fn set_background(&mut self, color: Rgb) -> PptxResult<()> {
        let part = self.content.part.clone();
        let c_sld = self
            .content
            .root
            .child_mut("cSld")
            .ok_or_else(|| PptxError::InvalidFormat(format!("{part} has no cSld")))?;
        let bg = XmlElement::new("p:bg").with_child(
            XmlElement::new("p:bgPr")
                .with_child(
                    XmlElement::new("a:solidFill").with_child(
                        XmlElement::new("a:srgbClr").with_attr("val", color.to_hex()),
                    ),
                )
                .with_child(XmlElement::new("a:effectLst")),
        );
        c_sld.replace_or_insert(bg, C_SLD_ORDER);
        self.dirty = true;
        Ok(())
    }
}

/// A slide layout and the master it belongs to
#[derive(Debug, Clone)]
pub struct Layout {
    pub(crate) content: SlidePart,
    pub(crate) master_index: usize,
}

impl Layout {
    pub fn name(&self) -> &str {
        self.content.name().unwrap_or_default()
    }

    /// Layout placeholders a new slide receives
    pub(crate) fn slide_placeholders(&self) -> Vec<&XmlElement> {
        self.content
            .shape_elements()
            .filter(|e| ShapeKind::of(e) == Some(ShapeKind::Shape))
            .filter(|e| shape::placeholder(e).is_some_and(|ph| !ph.is_furniture()))
            .collect()
    }
}

/// Placeholder geometry a slide can inherit from, layout first
pub(crate) struct Inheritance {
    pub(crate) layout: Vec<(Placeholder, Transform)>,
    pub(crate) master: Vec<(Placeholder, Transform)>,
}

impl Inheritance {
    pub(crate) fn resolve(&self, element: &XmlElement) -> Option<Transform> {
        let ph = shape::placeholder(element)?;
        inherited_transform(&ph, &self.layout)
            .or_else(|| inherited_transform(&master_placeholder_for(&ph), &self.master))
    }

    pub(crate) fn describe(&self, element: &XmlElement) -> Option<ShapeInfo> {
        shape::describe(element, self.resolve(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use office_core::shape::Frame;

    fn ph(ph_type: Option<&str>, idx: Option<u32>) -> Placeholder {
        Placeholder {
            ph_type: ph_type.map(str::to_string),
            idx,
        }
    }

    fn t(left: f64) -> Transform {
        Transform::from_frame(Frame::new(left, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_inherited_transform_prefers_idx() {
        let layout = vec![
            (ph(Some("title"), None), t(1.0)),
            (ph(None, Some(1)), t(2.0)),
            (ph(Some("body"), Some(2)), t(3.0)),
        ];
        assert_eq!(inherited_transform(&ph(Some("body"), Some(2)), &layout), Some(t(3.0)));
        assert_eq!(inherited_transform(&ph(None, Some(1)), &layout), Some(t(2.0)));
        assert_eq!(inherited_transform(&ph(Some("title"), None), &layout), Some(t(1.0)));
        assert_eq!(inherited_transform(&ph(Some("pic"), Some(9)), &layout), None);
    }

    #[test]
    fn test_master_mapping() {
        assert_eq!(master_placeholder_for(&ph(Some("ctrTitle"), None)).effective_type(), "title");
        assert_eq!(master_placeholder_for(&ph(Some("subTitle"), Some(1))).effective_type(), "body");
        assert_eq!(master_placeholder_for(&ph(None, Some(1))).effective_type(), "body");
    }

    #[test]
    fn test_next_shape_id_and_background() {
        let root = crate::xml::parse(
            br#"<p:sld><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr><p:sp><p:nvSpPr><p:cNvPr id="7" name="A"/></p:nvSpPr></p:sp></p:spTree></p:cSld></p:sld>"#,
        )
        .unwrap();
        let content = SlidePart::new("ppt/slides/slide1.xml".into(), root, Relationships::new());
        assert_eq!(content.next_shape_id(), 8);
        assert!(content.shape(7).is_ok());
        assert!(matches!(content.shape(2), Err(PptxError::ShapeNotFound(2))));

        let mut slide = Slide {
            content,
            layout_part: None,
            slide_id: 256,
            rel_id: "rId2".into(),
            dirty: false,
        };
        slide.set_background(Rgb::new(1, 2, 3)).unwrap();
        slide.set_background(Rgb::new(4, 5, 6)).unwrap();
        let c_sld = slide.content.root.child("cSld").unwrap();
        let names: Vec<&str> = c_sld.elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["bg", "spTree"]);
        let clr = c_sld.find(&["bg", "bgPr", "solidFill", "srgbClr"]).unwrap();
        assert_eq!(clr.attr("val"), Some("040506"));
        assert!(slide.dirty);
    }
}
