//! [`Presentation`]: an opened package with its slide list, layouts and masters
//! parsed, and every other part carried as bytes.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use log::{debug, warn};
use office_core::shape::catalog::{AutoShapeKind, ConnectorKind};
use office_core::shape::{
    ConnectorPath, FillStyle, FontStyle, Frame, LineStyle, ShapeEdit, StyleProperties,
};
use office_core::{Rgb, ShapeInfo};

use crate::content_types::{ContentTypes, CT_SLIDE};
use crate::error::{PptxError, PptxResult};
use crate::package::{
    rels_part_for, relative_target, resolve_target, Package, CONTENT_TYPES_PART, ROOT_RELS_PART,
};
use crate::rels::{
    Relationships, REL_NOTES_SLIDE, REL_OFFICE_DOCUMENT, REL_SLIDE, REL_SLIDE_LAYOUT, REL_THEME,
};
use crate::shape::{self, ShapeKind, Transform};
use crate::slide::{Inheritance, Layout, Slide, SlidePart};
use crate::template;
use crate::xml::{self, XmlElement, XmlNode};

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

const PRESENTATION_ORDER: &[&str] = &[
    "sldMasterIdLst",
    "notesMasterIdLst",
    "handoutMasterIdLst",
    "sldIdLst",
    "sldSz",
    "notesSz",
    "smartTags",
    "embeddedFontLst",
    "custShowLst",
    "photoAlbum",
    "custDataLst",
    "kinsoku",
    "defaultTextStyle",
    "modifyVerifier",
    "extLst",
];

/// Slide ids below this are reserved
const MIN_SLIDE_ID: u32 = 256;

/// A layout as listed to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    /// 0-based position across all masters
    pub index: usize,
    pub name: String,
}

/// `r:id` of a list entry, whatever the relationships prefix is called
fn rel_id(element: &XmlElement) -> Option<&str> {
    element
        .attrs
        .iter()
        .find(|(k, _)| k.ends_with(":id"))
        .map(|(_, v)| v.as_str())
}

fn read_rels(package: &Package, part: &str) -> PptxResult<Relationships> {
    match package.part(&rels_part_for(part)) {
        Some(bytes) => Relationships::parse(bytes),
        None => Ok(Relationships::new()),
    }
}

fn read_slide_part(package: &Package, part: String) -> PptxResult<SlidePart> {
    let root = xml::parse(package.require(&part)?)?;
    let rels = read_rels(package, &part)?;
    Ok(SlidePart::new(part, root, rels))
}

/// An editable presentation
#[derive(Debug, Clone)]
pub struct Presentation {
    package: Package,
    content_types: ContentTypes,
    main_part: String,
    main: XmlElement,
    main_rels: Relationships,
    masters: Vec<SlidePart>,
    layouts: Vec<Layout>,
    slides: Vec<Slide>,
    /// Slide list, its relationships or the content types changed
    structure_dirty: bool,
}

impl Presentation {
    /// The built-in blank presentation with no slides
    pub fn new() -> PptxResult<Self> {
        Self::from_package(template::blank_package())
    }

    pub fn open<P: AsRef<Path>>(path: P) -> PptxResult<Self> {
        let file = File::open(path)?;
        Self::read(file)
    }

    pub fn read<R: Read + Seek>(reader: R) -> PptxResult<Self> {
        Self::from_package(Package::read(reader)?)
    }

    fn from_package(package: Package) -> PptxResult<Self> {
        let content_types = ContentTypes::parse(package.require(CONTENT_TYPES_PART)?)?;
        let root_rels = Relationships::parse(package.require(ROOT_RELS_PART)?)?;
        let main_rel = root_rels
            .first_of_type(REL_OFFICE_DOCUMENT)
            .ok_or_else(|| PptxError::MissingPart("officeDocument relationship".into()))?;
        let main_part = resolve_target("", &main_rel.target);
        match content_types.content_type_of(&main_part) {
            Some(ct) if ct.contains("presentationml") => {}
            _ => {
                return Err(PptxError::InvalidFormat(format!(
                    "{main_part} is not a presentation"
                )))
            }
        }

        let main = xml::parse(package.require(&main_part)?)?;
        let main_rels = read_rels(&package, &main_part)?;

        let mut masters = Vec::new();
        let mut layouts = Vec::new();
        let master_ids = main
            .child("sldMasterIdLst")
            .into_iter()
            .flat_map(|list| list.children_named("sldMasterId"));
        for entry in master_ids {
            let Some(rel) = rel_id(entry).and_then(|id| main_rels.get(id)) else {
                warn!("slide master entry without a relationship, skipping");
                continue;
            };
            let master = read_slide_part(&package, resolve_target(&main_part, &rel.target))?;
            let layout_ids = master
                .root
                .child("sldLayoutIdLst")
                .into_iter()
                .flat_map(|list| list.children_named("sldLayoutId"));
            for layout_entry in layout_ids {
                let Some(layout_rel) = rel_id(layout_entry).and_then(|id| master.rels.get(id))
                else {
                    warn!("layout entry of {} has no relationship, skipping", master.part);
                    continue;
                };
                let part = resolve_target(&master.part, &layout_rel.target);
                layouts.push(Layout {
                    content: read_slide_part(&package, part)?,
                    master_index: masters.len(),
                });
            }
            masters.push(master);
        }

        let mut slides = Vec::new();
        let slide_ids = main
            .child("sldIdLst")
            .into_iter()
            .flat_map(|list| list.children_named("sldId"));
        for entry in slide_ids {
            let Some(rel) = rel_id(entry).and_then(|id| main_rels.get(id)) else {
                warn!("slide list entry without a relationship, skipping");
                continue;
            };
            let part = resolve_target(&main_part, &rel.target);
            let content = read_slide_part(&package, part)?;
            let layout_part = content
                .rels
                .first_of_type(REL_SLIDE_LAYOUT)
                .map(|r| resolve_target(&content.part, &r.target));
            slides.push(Slide {
                content,
                layout_part,
                slide_id: entry
                    .attr("id")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(MIN_SLIDE_ID),
                rel_id: rel.id.clone(),
                dirty: false,
            });
        }

        debug!(
            "read presentation with {} slide(s), {} layout(s), {} master(s)",
            slides.len(),
            layouts.len(),
            masters.len()
        );
        Ok(Self {
            package,
            content_types,
            main_part,
            main,
            main_rels,
            masters,
            layouts,
            slides,
            structure_dirty: false,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PptxResult<()> {
        let file = File::create(path)?;
        self.write(file)
    }

    pub fn write<W: Write + Seek>(&self, writer: W) -> PptxResult<()> {
        self.to_package().write(writer)
    }

    /// The package with every edited part re-serialized
    fn to_package(&self) -> Package {
        let mut package = self.package.clone();
        if self.structure_dirty {
            package.set_part(CONTENT_TYPES_PART, self.content_types.to_xml());
            package.set_part(self.main_part.as_str(), xml::to_part(&self.main));
            package.set_part(rels_part_for(&self.main_part), self.main_rels.to_xml());
        }
        for slide in self.slides.iter().filter(|s| s.dirty) {
            let content = &slide.content;
            package.set_part(content.part.as_str(), xml::to_part(&content.root));
            package.set_part(rels_part_for(&content.part), content.rels.to_xml());
        }
        package
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide width and height in points
    pub fn slide_size(&self) -> Option<(f64, f64)> {
        let size = self.main.child("sldSz")?;
        let cx: i64 = size.attr("cx")?.parse().ok()?;
        let cy: i64 = size.attr("cy")?.parse().ok()?;
        Some((shape::emu_to_points(cx), shape::emu_to_points(cy)))
    }

    pub fn slide(&self, index: usize) -> PptxResult<&Slide> {
        self.slides.get(index).ok_or(PptxError::SlideOutOfRange {
            number: index + 1,
            count: self.slides.len(),
        })
    }

    fn slide_mut(&mut self, index: usize) -> PptxResult<&mut Slide> {
        let count = self.slides.len();
        self.slides.get_mut(index).ok_or(PptxError::SlideOutOfRange {
            number: index + 1,
            count,
        })
    }

    pub fn layouts(&self) -> Vec<LayoutInfo> {
        self.layouts
            .iter()
            .enumerate()
            .map(|(index, layout)| LayoutInfo {
                index,
                name: layout.name().to_string(),
            })
            .collect()
    }

    /// Position of the layout with this name, ignoring case
    pub fn layout_index(&self, name: &str) -> Option<usize> {
        self.layouts
            .iter()
            .position(|l| l.name().eq_ignore_ascii_case(name.trim()))
    }

    fn layout_of(&self, slide: &Slide) -> Option<&Layout> {
        let part = slide.layout_part.as_deref()?;
        self.layouts.iter().find(|l| l.content.part == part)
    }

    pub fn layout_name(&self, index: usize) -> PptxResult<Option<String>> {
        let slide = self.slide(index)?;
        Ok(self.layout_of(slide).map(|l| l.name().to_string()))
    }

    fn inheritance(&self, slide: &Slide) -> Inheritance {
        let layout = self.layout_of(slide);
        let master = layout.and_then(|l| self.masters.get(l.master_index));
        Inheritance {
            layout: layout
                .map(|l| l.content.placeholder_transforms())
                .unwrap_or_default(),
            master: master
                .map(SlidePart::placeholder_transforms)
                .unwrap_or_default(),
        }
    }

    /// Every top-level shape of a slide, geometry in points
    pub fn shapes(&self, index: usize) -> PptxResult<Vec<ShapeInfo>> {
        let slide = self.slide(index)?;
        let inheritance = self.inheritance(slide);
        Ok(slide
            .content
            .shape_elements()
            .filter_map(|e| inheritance.describe(e))
            .collect())
    }

    pub fn shape(&self, index: usize, id: u32) -> PptxResult<ShapeInfo> {
        let slide = self.slide(index)?;
        let element = slide.content.shape(id)?;
        self.inheritance(slide)
            .describe(element)
            .ok_or(PptxError::ShapeNotFound(id))
    }

    pub fn shape_kind(&self, index: usize, id: u32) -> PptxResult<ShapeKind> {
        let element = self.slide(index)?.content.shape(id)?;
        ShapeKind::of(element).ok_or(PptxError::ShapeNotFound(id))
    }

    /// The shape's own transform, or the one its placeholder inherits
    fn current_transform(&self, index: usize, id: u32) -> PptxResult<Option<Transform>> {
        let slide = self.slide(index)?;
        let element = slide.content.shape(id)?;
        Ok(shape::transform(element).or_else(|| self.inheritance(slide).resolve(element)))
    }

    fn next_slide_part(&self) -> String {
        (1..)
            .map(|n| format!("ppt/slides/slide{n}.xml"))
            .find(|name| {
                !self.package.contains(name) && self.slides.iter().all(|s| s.part_name() != name)
            })
            .unwrap_or_else(|| "ppt/slides/slide.xml".to_string())
    }

    /// Append a slide using the layout at `layout` (0-based); returns the new
    /// slide's 0-based index
    pub fn add_slide(&mut self, layout: usize) -> PptxResult<usize> {
        let layout = self
            .layouts
            .get(layout)
            .ok_or_else(|| PptxError::LayoutNotFound(format!("#{}", layout + 1)))?;
        let part = self.next_slide_part();

        let group_props = XmlElement::new("p:nvGrpSpPr")
            .with_child(
                XmlElement::new("p:cNvPr")
                    .with_attr("id", "1")
                    .with_attr("name", ""),
            )
            .with_child(XmlElement::new("p:cNvGrpSpPr"))
            .with_child(XmlElement::new("p:nvPr"));
        let mut tree = XmlElement::new("p:spTree")
            .with_child(group_props)
            .with_child(XmlElement::new("p:grpSpPr"));
        for (offset, layout_shape) in layout.slide_placeholders().into_iter().enumerate() {
            if let Some(sp) = shape::new_placeholder(offset as u32 + 2, layout_shape) {
                tree = tree.with_child(sp);
            }
        }
        let root = XmlElement::new("p:sld")
            .with_attr("xmlns:a", NS_A)
            .with_attr("xmlns:r", NS_R)
            .with_attr("xmlns:p", NS_P)
            .with_child(XmlElement::new("p:cSld").with_child(tree))
            .with_child(
                XmlElement::new("p:clrMapOvr").with_child(XmlElement::new("a:masterClrMapping")),
            );

        let mut rels = Relationships::new();
        rels.add(REL_SLIDE_LAYOUT, relative_target(&part, &layout.content.part));
        let layout_part = layout.content.part.clone();

        let rel_id = self
            .main_rels
            .add(REL_SLIDE, relative_target(&self.main_part, &part));
        self.content_types.set_override(&part, CT_SLIDE);
        let slide_id = self
            .slides
            .iter()
            .map(|s| s.slide_id + 1)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID);
        let p = self.main.namespace_prefix(NS_P).unwrap_or("p").to_string();
        let r = match self.main.namespace_prefix(NS_R) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => {
                self.main.set_attr("xmlns:r", NS_R);
                "r".to_string()
            }
        };
        let list = self
            .main
            .ensure_child(&xml::qualified(&p, "sldIdLst"), PRESENTATION_ORDER);
        list.children.push(XmlNode::Element(
            XmlElement::new(xml::qualified(&p, "sldId"))
                .with_attr("id", slide_id.to_string())
                .with_attr(xml::qualified(&r, "id"), rel_id.as_str()),
        ));

        debug!("added {part} on layout {layout_part}");
        self.slides.push(Slide {
            content: SlidePart::new(part, root, rels),
            layout_part: Some(layout_part),
            slide_id,
            rel_id,
            dirty: true,
        });
        self.structure_dirty = true;
        Ok(self.slides.len() - 1)
    }

    /// Remove a slide from the slide list and drop its part, relationships and
    /// notes
    pub fn delete_slide(&mut self, index: usize) -> PptxResult<()> {
        self.slide(index)?;
        let slide = self.slides.remove(index);

        if let Some(list) = self.main.child_mut("sldIdLst") {
            list.remove_children(|e| rel_id(e) == Some(slide.rel_id.as_str()));
        }
        self.main_rels.remove(&slide.rel_id);

        let part = &slide.content.part;
        let notes: Vec<String> = slide
            .content
            .rels
            .of_type(REL_NOTES_SLIDE)
            .map(|r| resolve_target(part, &r.target))
            .collect();
        for removed in std::iter::once(part.clone()).chain(notes) {
            self.content_types.remove_override(&removed);
            self.package.remove_part(&rels_part_for(&removed));
            self.package.remove_part(&removed);
        }
        debug!("deleted {part}");
        self.structure_dirty = true;
        Ok(())
    }

    /// A copy holding only the slide at `index`, for saving as a template
    pub fn copy_keeping_slide(&self, index: usize) -> PptxResult<Presentation> {
        self.slide(index)?;
        let mut copy = self.clone();
        for i in (0..copy.slide_count()).rev() {
            if i != index {
                copy.delete_slide(i)?;
            }
        }
        Ok(copy)
    }

    pub fn set_background(&mut self, index: usize, color: Rgb) -> PptxResult<()> {
        self.slide_mut(index)?.set_background(color)
    }

    /// Add a text box; returns its shape id
    pub fn add_text_box(&mut self, index: usize, frame: Frame, text: &str) -> PptxResult<u32> {
        let slide = self.slide_mut(index)?;
        let id = slide.content.next_shape_id();
        let mut element =
            shape::new_text_box(id, &format!("TextBox {}", id - 1), &Transform::from_frame(frame));
        shape::set_text(&mut element, text)?;
        slide.push_shape(element)?;
        Ok(id)
    }

    pub fn add_auto_shape(
        &mut self,
        index: usize,
        kind: &AutoShapeKind,
        frame: Frame,
    ) -> PptxResult<u32> {
        let slide = self.slide_mut(index)?;
        let id = slide.content.next_shape_id();
        let element = shape::new_auto_shape(
            id,
            &format!("Shape {}", id - 1),
            &Transform::from_frame(frame),
            kind.preset,
        );
        slide.push_shape(element)?;
        Ok(id)
    }

    pub fn add_connector(
        &mut self,
        index: usize,
        kind: &ConnectorKind,
        path: &ConnectorPath,
    ) -> PptxResult<u32> {
        let (frame, flip_h, flip_v) = path.bounds();
        let transform = Transform {
            flip_h,
            flip_v,
            ..Transform::from_frame(frame)
        };
        let slide = self.slide_mut(index)?;
        let id = slide.content.next_shape_id();
        let element =
            shape::new_connector(id, &format!("Connector {}", id - 1), &transform, kind.preset);
        slide.push_shape(element)?;
        Ok(id)
    }

    pub fn set_text(&mut self, index: usize, id: u32, text: &str) -> PptxResult<()> {
        shape::set_text(self.slide_mut(index)?.shape_mut(id)?, text)
    }

    /// Move and resize, keeping rotation and flips
    pub fn set_geometry(&mut self, index: usize, id: u32, frame: Frame) -> PptxResult<()> {
        let current = self.current_transform(index, id)?.unwrap_or_default();
        let transform = Transform {
            rot: current.rot,
            flip_h: current.flip_h,
            flip_v: current.flip_v,
            ..Transform::from_frame(frame)
        };
        shape::set_transform(self.slide_mut(index)?.shape_mut(id)?, &transform)
    }

    /// Rotation in degrees clockwise
    pub fn set_rotation(&mut self, index: usize, id: u32, degrees: f64) -> PptxResult<()> {
        let current = self.current_transform(index, id)?.ok_or_else(|| {
            PptxError::Unsupported(format!("Shape with ID {id} has no geometry to rotate"))
        })?;
        let transform = Transform {
            rot: (degrees.rem_euclid(360.0) * 60_000.0).round() as i64,
            ..current
        };
        shape::set_transform(self.slide_mut(index)?.shape_mut(id)?, &transform)
    }

    pub fn set_name(&mut self, index: usize, id: u32, name: &str) -> PptxResult<()> {
        shape::set_name(self.slide_mut(index)?.shape_mut(id)?, name)
    }

    pub fn apply_font(&mut self, index: usize, id: u32, font: &FontStyle) -> PptxResult<()> {
        shape::apply_font(self.slide_mut(index)?.shape_mut(id)?, font)
    }

    pub fn apply_fill(&mut self, index: usize, id: u32, fill: &FillStyle) -> PptxResult<()> {
        shape::apply_fill(self.slide_mut(index)?.shape_mut(id)?, fill)
    }

    pub fn apply_line(&mut self, index: usize, id: u32, line: &LineStyle) -> PptxResult<()> {
        shape::apply_line(self.slide_mut(index)?.shape_mut(id)?, line)
    }

    /// Font, fill and line together; the font is skipped for shapes without text
    pub fn apply_style(
        &mut self,
        index: usize,
        id: u32,
        style: &StyleProperties,
    ) -> PptxResult<()> {
        style.validate()?;
        if let Some(font) = &style.font {
            if self.shape(index, id)?.text.is_some() {
                self.apply_font(index, id, font)?;
            }
        }
        if let Some(fill) = &style.fill {
            self.apply_fill(index, id, fill)?;
        }
        if let Some(line) = &style.line {
            self.apply_line(index, id, line)?;
        }
        Ok(())
    }

    /// Apply an `edit_element` change set and return the updated snapshot.
    /// Text is ignored for shapes that cannot hold it.
    pub fn edit_shape(&mut self, index: usize, id: u32, edit: &ShapeEdit) -> PptxResult<ShapeInfo> {
        let before = self.shape(index, id)?;
        if let Some(text) = &edit.text {
            if self.shape_kind(index, id)?.supports_text() {
                self.set_text(index, id, text)?;
            }
        }
        if edit.has_geometry() {
            self.set_geometry(index, id, edit.frame_over(&before))?;
        }
        if let Some(name) = &edit.name {
            self.set_name(index, id, name)?;
        }
        if let Some(rotation) = edit.rotation {
            self.set_rotation(index, id, rotation)?;
        }
        self.shape(index, id)
    }

    fn theme_part(&self) -> Option<String> {
        let master = self.masters.first()?;
        let rel = master.rels.first_of_type(REL_THEME)?;
        Some(resolve_target(&master.part, &rel.target))
    }

    /// Theme of the first slide master
    pub fn theme(&self) -> Option<&[u8]> {
        self.package.part(&self.theme_part()?)
    }

    /// Replace the first master's theme (colours, fonts, effects)
    pub fn set_theme(&mut self, theme: Vec<u8>) -> PptxResult<()> {
        let root = xml::parse(&theme)?;
        if !root.is("theme") {
            return Err(PptxError::InvalidFormat(format!(
                "expected a theme part, found <{}>",
                root.name
            )));
        }
        let part = self
            .theme_part()
            .ok_or_else(|| PptxError::MissingPart("theme".into()))?;
        self.package.set_part(part, theme);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use office_core::shape::catalog::{auto_shape, connector, MSO_LINE, MSO_PLACEHOLDER};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn roundtrip(pres: &Presentation) -> Presentation {
        let mut buf = Vec::new();
        pres.write(Cursor::new(&mut buf)).unwrap();
        Presentation::read(Cursor::new(&buf)).unwrap()
    }

    #[test]
    fn test_blank_presentation() {
        let pres = Presentation::new().unwrap();
        assert_eq!(pres.slide_count(), 0);
        assert_eq!(pres.slide_size(), Some((960.0, 540.0)));
        let names: Vec<String> = pres.layouts().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Title Slide", "Title and Content", "Title Only", "Blank"]);
        assert_eq!(pres.layout_index("title and content"), Some(1));
        assert!(pres.theme().is_some());
    }

    #[test]
    fn test_add_slide_clones_placeholders() {
        let mut pres = Presentation::new().unwrap();
        let index = pres.add_slide(1).unwrap();
        assert_eq!(index, 0);
        let shapes = pres.shapes(0).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().all(|s| s.type_id == MSO_PLACEHOLDER));
        assert_eq!(shapes[0].placeholder_type_name.as_deref(), Some("title"));
        // geometry comes from the master through the layout
        assert_eq!(shapes[0].left, 66.0);
        assert_eq!(pres.layout_name(0).unwrap().as_deref(), Some("Title and Content"));

        let back = roundtrip(&pres);
        assert_eq!(back.slide_count(), 1);
        assert_eq!(back.shapes(0).unwrap(), shapes);
        assert!(matches!(pres.add_slide(9), Err(PptxError::LayoutNotFound(_))));
    }

    #[test]
    fn test_shapes_and_edits() {
        let mut pres = Presentation::new().unwrap();
        pres.add_slide(3).unwrap();
        let text_id = pres
            .add_text_box(0, Frame::new(72.0, 72.0, 288.0, 72.0), "Hello")
            .unwrap();
        let oval = auto_shape("oval").unwrap();
        let shape_id = pres
            .add_auto_shape(0, oval, Frame::new(300.0, 200.0, 100.0, 50.0))
            .unwrap();
        assert_eq!((text_id, shape_id), (2, 3));

        let from = pres.shape(0, text_id).unwrap();
        let to = pres.shape(0, shape_id).unwrap();
        let line = pres
            .add_connector(0, connector("elbow").unwrap(), &ConnectorPath::between(&from, &to))
            .unwrap();
        let line = pres.shape(0, line).unwrap();
        assert_eq!(line.type_id, MSO_LINE);
        assert_eq!(line.frame(), Frame::new(216.0, 108.0, 134.0, 117.0));

        let edit = ShapeEdit {
            text: Some("Updated".into()),
            left: Some(10.0),
            name: Some("Greeting".into()),
            rotation: Some(-90.0),
            ..Default::default()
        };
        let updated = pres.edit_shape(0, text_id, &edit).unwrap();
        assert_eq!(updated.text.as_deref(), Some("Updated"));
        assert_eq!(updated.name, "Greeting");
        assert_eq!((updated.left, updated.top), (10.0, 72.0));
        assert_eq!(updated.rotation, 270.0);

        let back = roundtrip(&pres);
        let shapes = back.shapes(0).unwrap();
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[1].auto_shape.as_deref(), Some("oval"));
        assert_eq!(shapes[0], updated);
    }

    #[test]
    fn test_delete_slide_and_ids() {
        let mut pres = Presentation::new().unwrap();
        for _ in 0..3 {
            pres.add_slide(0).unwrap();
        }
        pres.set_text(1, 2, "second").unwrap();
        pres.delete_slide(0).unwrap();
        assert_eq!(pres.slide_count(), 2);
        assert!(matches!(
            pres.delete_slide(5),
            Err(PptxError::SlideOutOfRange { number: 6, count: 2 })
        ));

        let back = roundtrip(&pres);
        assert_eq!(back.slide_count(), 2);
        assert_eq!(back.shapes(0).unwrap()[0].text.as_deref(), Some("second"));
        // the freed part name is reused and the new id keeps counting up
        let mut back = back;
        back.add_slide(3).unwrap();
        assert_eq!(back.slides[2].part_name(), "ppt/slides/slide1.xml");
        assert_eq!(back.slides[2].slide_id, 259);
    }

    #[test]
    fn test_copy_keeping_slide() {
        let mut pres = Presentation::new().unwrap();
        pres.add_slide(0).unwrap();
        pres.add_slide(2).unwrap();
        pres.set_text(1, 2, "keep me").unwrap();
        let copy = pres.copy_keeping_slide(1).unwrap();
        assert_eq!(pres.slide_count(), 2);
        assert_eq!(copy.slide_count(), 1);
        let back = roundtrip(&copy);
        assert_eq!(back.shapes(0).unwrap()[0].text.as_deref(), Some("keep me"));
        assert_eq!(back.layout_name(0).unwrap().as_deref(), Some("Title Only"));
    }

    #[test]
    fn test_apply_style_skips_font_without_text() {
        let mut pres = Presentation::new().unwrap();
        pres.add_slide(3).unwrap();
        let from = ShapeInfo::new(0, "a", 1).with_geometry(0.0, 0.0, 10.0, 10.0);
        let to = ShapeInfo::new(0, "b", 1).with_geometry(100.0, 100.0, 10.0, 10.0);
        let id = pres
            .add_connector(0, connector("straight").unwrap(), &ConnectorPath::between(&from, &to))
            .unwrap();
        let style = bold_with_thick_line();
        pres.apply_style(0, id, &style).unwrap();
        assert!(matches!(
            pres.apply_font(0, id, style.font.as_ref().unwrap()),
            Err(PptxError::Unsupported(_))
        ));
    }

    fn bold_with_thick_line() -> StyleProperties {
        StyleProperties {
            font: Some(FontStyle {
                bold: Some(true),
                ..Default::default()
            }),
            line: Some(LineStyle {
                width: Some(3.0),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_unmodified_parts_are_written_back_unchanged() {
        let mut pres = Presentation::new().unwrap();
        pres.add_slide(0).unwrap();
        pres.add_slide(0).unwrap();
        let saved = roundtrip(&pres);
        let original = saved.package.part("ppt/slides/slide1.xml").unwrap().to_vec();

        let mut edited = saved.clone();
        edited.set_background(1, Rgb::new(0, 0, 0)).unwrap();
        let back = roundtrip(&edited);
        assert_eq!(back.package.part("ppt/slides/slide1.xml").unwrap(), original.as_slice());
        assert_ne!(
            back.package.part("ppt/slides/slide2.xml"),
            saved.package.part("ppt/slides/slide2.xml")
        );
    }

    #[test]
    fn test_set_theme() {
        let mut pres = Presentation::new().unwrap();
        let theme = br#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Other"/>"#;
        pres.set_theme(theme.to_vec()).unwrap();
        assert_eq!(pres.theme(), Some(&theme[..]));
        assert!(pres.set_theme(b"<p:sld/>".to_vec()).is_err());
    }
}
