//! Shape elements of a slide's `p:spTree`: reading them into [`ShapeInfo`]
//! snapshots, building new ones, and applying edits in place.

use office_core::shape::catalog::{
    auto_shape_by_preset, placeholder_from_ooxml, MSO_AUTO_SHAPE, MSO_CHART, MSO_FREEFORM,
    MSO_GRAPHIC, MSO_GROUP, MSO_LINE, MSO_MEDIA, MSO_PICTURE, MSO_SMART_ART, MSO_TABLE,
    MSO_TEXT_BOX,
};
use office_core::shape::{FillStyle, FontStyle, Frame, LineDash, LineStyle};
use office_core::{Rgb, ShapeInfo};

use crate::error::{PptxError, PptxResult};
use crate::xml::XmlElement;

pub const EMU_PER_POINT: f64 = 12_700.0;

/// Rotation units per degree
const ROT_PER_DEGREE: f64 = 60_000.0;

/// Embedded OLE object (`msoEmbeddedOLEObject`)
const MSO_EMBEDDED_OLE: i32 = 7;

const SP_ORDER: &[&str] = &["nvSpPr", "spPr", "style", "txBody", "extLst"];
const TX_BODY_ORDER: &[&str] = &["bodyPr", "lstStyle", "p"];
const SP_PR_ORDER: &[&str] = &[
    "xfrm", "custGeom", "prstGeom", "noFill", "solidFill", "gradFill", "blipFill", "pattFill",
    "grpFill", "ln", "effectLst", "effectDag", "scene3d", "sp3d", "extLst",
];
const XFRM_ORDER: &[&str] = &["off", "ext", "chOff", "chExt"];
const GRAPHIC_FRAME_ORDER: &[&str] = &["nvGraphicFramePr", "xfrm", "graphic", "extLst"];
const LN_ORDER: &[&str] = &[
    "noFill", "solidFill", "gradFill", "pattFill", "prstDash", "custDash", "round", "bevel",
    "miter", "headEnd", "tailEnd", "extLst",
];
const RPR_ORDER: &[&str] = &[
    "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill", "effectLst",
    "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs", "sym",
    "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];
const FILLS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

pub fn emu_to_points(emu: i64) -> f64 {
    emu as f64 / EMU_PER_POINT
}

pub fn points_to_emu(points: f64) -> i64 {
    (points * EMU_PER_POINT).round() as i64
}

/// The element kinds that can sit in a shape tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Shape,
    Picture,
    GraphicFrame,
    Connector,
    Group,
}

impl ShapeKind {
    pub fn of(element: &XmlElement) -> Option<Self> {
        match element.local_name() {
            "sp" => Some(ShapeKind::Shape),
            "pic" => Some(ShapeKind::Picture),
            "graphicFrame" => Some(ShapeKind::GraphicFrame),
            "cxnSp" => Some(ShapeKind::Connector),
            "grpSp" => Some(ShapeKind::Group),
            _ => None,
        }
    }

    fn non_visual(self) -> &'static str {
        match self {
            ShapeKind::Shape => "nvSpPr",
            ShapeKind::Picture => "nvPicPr",
            ShapeKind::GraphicFrame => "nvGraphicFramePr",
            ShapeKind::Connector => "nvCxnSpPr",
            ShapeKind::Group => "nvGrpSpPr",
        }
    }

    /// Property element holding the fill, line and (for most kinds) the transform
    fn properties(self) -> Option<&'static str> {
        match self {
            ShapeKind::Group => Some("grpSpPr"),
            ShapeKind::GraphicFrame => None,
            _ => Some("spPr"),
        }
    }

    pub fn supports_text(self) -> bool {
        self == ShapeKind::Shape
    }
}

/// Offset, extent, rotation and flips in EMU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transform {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// 60000ths of a degree
    pub rot: i64,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Transform {
    pub fn from_frame(frame: Frame) -> Self {
        Self {
            x: points_to_emu(frame.left),
            y: points_to_emu(frame.top),
            cx: points_to_emu(frame.width),
            cy: points_to_emu(frame.height),
            ..Default::default()
        }
    }

    pub fn frame(&self) -> Frame {
        Frame::new(
            emu_to_points(self.x),
            emu_to_points(self.y),
            emu_to_points(self.cx),
            emu_to_points(self.cy),
        )
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rot as f64 / ROT_PER_DEGREE
    }

    fn read(xfrm: &XmlElement) -> Option<Self> {
        let off = xfrm.child("off")?;
        let ext = xfrm.child("ext")?;
        let int = |e: &XmlElement, key: &str| e.attr(key).and_then(|v| v.parse::<i64>().ok());
        Some(Self {
            x: int(off, "x")?,
            y: int(off, "y")?,
            cx: int(ext, "cx")?,
            cy: int(ext, "cy")?,
            rot: int(xfrm, "rot").unwrap_or(0),
            flip_h: is_true(xfrm.attr("flipH")),
            flip_v: is_true(xfrm.attr("flipV")),
        })
    }

    /// Write into an existing `xfrm`, leaving group child extents alone
    fn write(&self, xfrm: &mut XmlElement) {
        set_or_clear(xfrm, "rot", (self.rot != 0).then(|| self.rot.to_string()));
        set_or_clear(xfrm, "flipH", self.flip_h.then(|| "1".to_string()));
        set_or_clear(xfrm, "flipV", self.flip_v.then(|| "1".to_string()));
        let off = xfrm.ensure_child("a:off", XFRM_ORDER);
        off.set_attr("x", self.x.to_string());
        off.set_attr("y", self.y.to_string());
        let ext = xfrm.ensure_child("a:ext", XFRM_ORDER);
        ext.set_attr("cx", self.cx.to_string());
        ext.set_attr("cy", self.cy.to_string());
    }
}

fn is_true(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

fn set_or_clear(element: &mut XmlElement, key: &str, value: Option<String>) {
    match value {
        Some(v) => element.set_attr(key, v),
        None => element.remove_attr(key),
    }
}

/// `<p:ph>` of a placeholder shape
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Placeholder {
    pub ph_type: Option<String>,
    pub idx: Option<u32>,
}

impl Placeholder {
    /// `PpPlaceholderType` of this placeholder
    pub fn type_id(&self) -> i32 {
        placeholder_from_ooxml(self.ph_type.as_deref())
    }

    /// Type with the implicit `obj` spelled out
    pub fn effective_type(&self) -> &str {
        self.ph_type.as_deref().unwrap_or("obj")
    }

    /// Date, footer and slide number placeholders are not copied onto new slides
    pub fn is_furniture(&self) -> bool {
        matches!(self.effective_type(), "dt" | "ftr" | "sldNum")
    }
}

pub fn shape_id(element: &XmlElement) -> Option<u32> {
    c_nv_pr(element)?.attr("id")?.parse().ok()
}

pub fn shape_name(element: &XmlElement) -> Option<&str> {
    c_nv_pr(element)?.attr("name")
}

fn c_nv_pr(element: &XmlElement) -> Option<&XmlElement> {
    let kind = ShapeKind::of(element)?;
    element.find(&[kind.non_visual(), "cNvPr"])
}

pub fn placeholder(element: &XmlElement) -> Option<Placeholder> {
    let kind = ShapeKind::of(element)?;
    let ph = element.find(&[kind.non_visual(), "nvPr", "ph"])?;
    Some(Placeholder {
        ph_type: ph.attr("type").map(str::to_string),
        idx: ph.attr("idx").and_then(|v| v.parse().ok()),
    })
}

fn xfrm(element: &XmlElement) -> Option<&XmlElement> {
    let kind = ShapeKind::of(element)?;
    match kind.properties() {
        Some(props) => element.find(&[props, "xfrm"]),
        None => element.child("xfrm"),
    }
}

/// The shape's own transform; placeholders often have none and inherit
pub fn transform(element: &XmlElement) -> Option<Transform> {
    xfrm(element).and_then(Transform::read)
}

/// Text of the shape's text body, paragraphs joined by newlines
pub fn text(element: &XmlElement) -> Option<String> {
    let body = element.child("txBody")?;
    let paragraphs: Vec<String> = body
        .children_named("p")
        .map(|p| {
            let mut line = String::new();
            for part in p.elements() {
                match part.local_name() {
                    "r" | "fld" => {
                        if let Some(t) = part.child("t") {
                            line.push_str(&t.text());
                        }
                    }
                    "br" => line.push('\n'),
                    _ => {}
                }
            }
            line
        })
        .collect();
    Some(paragraphs.join("\n"))
}

/// `MsoShapeType` for a graphic frame from its `graphicData` uri
fn graphic_frame_type(element: &XmlElement) -> i32 {
    let uri = element
        .find(&["graphic", "graphicData"])
        .and_then(|d| d.attr("uri"))
        .unwrap_or_default();
    if uri.ends_with("/table") {
        MSO_TABLE
    } else if uri.ends_with("/chart") {
        MSO_CHART
    } else if uri.ends_with("/diagram") {
        MSO_SMART_ART
    } else if uri.ends_with("/ole") {
        MSO_EMBEDDED_OLE
    } else {
        MSO_GRAPHIC
    }
}

/// Snapshot a shape element; `inherited` supplies the transform of a
/// placeholder that has none of its own
pub fn describe(element: &XmlElement, inherited: Option<Transform>) -> Option<ShapeInfo> {
    let kind = ShapeKind::of(element)?;
    let id = shape_id(element)?;
    let name = shape_name(element).unwrap_or_default();
    let non_visual = element.child(kind.non_visual());

    let type_id = match kind {
        ShapeKind::Shape => {
            let text_box = non_visual
                .and_then(|nv| nv.child("cNvSpPr"))
                .is_some_and(|c| is_true(c.attr("txBox")));
            let sp_pr = element.child("spPr");
            if text_box {
                MSO_TEXT_BOX
            } else if sp_pr.and_then(|p| p.child("custGeom")).is_some() {
                MSO_FREEFORM
            } else {
                MSO_AUTO_SHAPE
            }
        }
        ShapeKind::Picture => {
            let media = non_visual
                .and_then(|nv| nv.child("nvPr"))
                .is_some_and(|p| p.child("videoFile").is_some() || p.child("audioFile").is_some());
            if media {
                MSO_MEDIA
            } else {
                MSO_PICTURE
            }
        }
        ShapeKind::GraphicFrame => graphic_frame_type(element),
        ShapeKind::Connector => MSO_LINE,
        ShapeKind::Group => MSO_GROUP,
    };

    let mut info = ShapeInfo::new(id, name, type_id);
    let ph = placeholder(element);
    if let Some(ph) = &ph {
        info = info.with_placeholder(ph.type_id());
    }
    if let Some(preset) = element
        .find(&["spPr", "prstGeom"])
        .and_then(|g| g.attr("prst"))
    {
        if type_id == MSO_AUTO_SHAPE {
            let friendly = auto_shape_by_preset(preset).map_or(preset, |k| k.name);
            info = info.with_auto_shape(friendly);
        }
    }
    if let Some(t) = transform(element).or(if ph.is_some() { inherited } else { None }) {
        info = info.with_frame(t.frame());
        info.rotation = t.rotation_degrees();
    }
    if kind.supports_text() {
        if let Some(body_text) = text(element) {
            info = info.with_text(body_text);
        }
    }
    Some(info)
}

pub fn set_name(element: &mut XmlElement, name: &str) -> PptxResult<()> {
    let kind = kind_of(element)?;
    let c_nv_pr = element
        .find_mut(&[kind.non_visual(), "cNvPr"])
        .ok_or_else(|| PptxError::InvalidFormat("shape without cNvPr".into()))?;
    c_nv_pr.set_attr("name", name);
    Ok(())
}

fn kind_of(element: &XmlElement) -> PptxResult<ShapeKind> {
    ShapeKind::of(element)
        .ok_or_else(|| PptxError::InvalidFormat(format!("'{}' is not a shape", element.name)))
}

/// Replace the shape's transform, creating the `xfrm` when the shape inherited it
pub fn set_transform(element: &mut XmlElement, t: &Transform) -> PptxResult<()> {
    let kind = kind_of(element)?;
    let xfrm = match kind.properties() {
        Some(props) => element
            .ensure_child(&format!("p:{props}"), SP_ORDER)
            .ensure_child("a:xfrm", SP_PR_ORDER),
        None => element.ensure_child("p:xfrm", GRAPHIC_FRAME_ORDER),
    };
    t.write(xfrm);
    Ok(())
}

/// Replace all text, one paragraph per line. The first paragraph's properties
/// and the first run's properties are carried over to every new paragraph.
pub fn set_text(element: &mut XmlElement, new_text: &str) -> PptxResult<()> {
    let kind = kind_of(element)?;
    if !kind.supports_text() {
        return Err(PptxError::Unsupported(format!(
            "Shape '{}' cannot hold text",
            shape_name(element).unwrap_or_default()
        )));
    }
    let body = element.ensure_child("p:txBody", SP_ORDER);
    if body.child("bodyPr").is_none() {
        body.insert_ordered(XmlElement::new("a:bodyPr"), TX_BODY_ORDER);
    }
    if body.child("lstStyle").is_none() {
        body.insert_ordered(XmlElement::new("a:lstStyle"), TX_BODY_ORDER);
    }

    let first_p = body.child("p");
    let p_pr = first_p.and_then(|p| p.child("pPr")).cloned();
    let mut r_pr = body
        .children_named("p")
        .find_map(|p| {
            p.children_named("r")
                .find_map(|r| r.child("rPr"))
                .or_else(|| p.child("endParaRPr"))
        })
        .cloned()
        .unwrap_or_else(|| XmlElement::new("a:rPr").with_attr("lang", "en-US"));
    r_pr.name = "a:rPr".into();
    r_pr.remove_attr("dirty");
    let mut end_para = r_pr.clone();
    end_para.name = "a:endParaRPr".into();

    body.remove_children(|e| e.is("p"));
    for line in new_text.split('\n') {
        let mut p = XmlElement::new("a:p");
        if let Some(p_pr) = &p_pr {
            p = p.with_child(p_pr.clone());
        }
        if line.is_empty() {
            p = p.with_child(end_para.clone());
        } else {
            let t = XmlElement::new("a:t").with_text(line);
            p = p.with_child(XmlElement::new("a:r").with_child(r_pr.clone()).with_child(t));
        }
        body.insert_ordered(p, TX_BODY_ORDER);
    }
    Ok(())
}

fn srgb(color: Rgb) -> XmlElement {
    XmlElement::new("a:srgbClr").with_attr("val", color.to_hex())
}

fn solid_fill(color: Rgb) -> XmlElement {
    XmlElement::new("a:solidFill").with_child(srgb(color))
}

fn replace_fill(parent: &mut XmlElement, fill: XmlElement, order: &[&str]) {
    parent.remove_children(|e| FILLS.contains(&e.local_name()));
    parent.insert_ordered(fill, order);
}

/// Run properties for every run (and paragraph end) of the shape's text
pub fn apply_font(element: &mut XmlElement, font: &FontStyle) -> PptxResult<()> {
    let kind = kind_of(element)?;
    let unsupported = || {
        PptxError::Unsupported(format!(
            "Shape '{}' has no text to style",
            shape_name(element).unwrap_or_default()
        ))
    };
    if !kind.supports_text() || element.child("txBody").is_none() {
        return Err(unsupported());
    }
    let Some(body) = element.child_mut("txBody") else {
        return Ok(());
    };
    for p in body.elements_mut().filter(|e| e.is("p")) {
        for part in p.elements_mut() {
            match part.local_name() {
                "r" | "fld" => {
                    let r_pr = part.ensure_child("a:rPr", &["rPr", "pPr", "t"]);
                    apply_run_properties(r_pr, font);
                }
                "endParaRPr" => apply_run_properties(part, font),
                _ => {}
            }
        }
    }
    Ok(())
}

fn apply_run_properties(r_pr: &mut XmlElement, font: &FontStyle) {
    let flag = |on: bool| if on { "1" } else { "0" };
    if let Some(size) = font.size {
        r_pr.set_attr("sz", ((size * 100.0).round() as i64).to_string());
    }
    if let Some(bold) = font.bold {
        r_pr.set_attr("b", flag(bold));
    }
    if let Some(italic) = font.italic {
        r_pr.set_attr("i", flag(italic));
    }
    if let Some(underline) = font.underline {
        r_pr.set_attr("u", if underline { "sng" } else { "none" });
    }
    if let Some(color) = font.color {
        replace_fill(r_pr, solid_fill(color), RPR_ORDER);
    }
    if let Some(family) = &font.family {
        r_pr.replace_or_insert(
            XmlElement::new("a:latin").with_attr("typeface", family.as_str()),
            RPR_ORDER,
        );
    }
}

fn shape_properties(element: &mut XmlElement) -> PptxResult<&mut XmlElement> {
    let kind = kind_of(element)?;
    match kind.properties() {
        Some(props) => Ok(element.ensure_child(&format!("p:{props}"), SP_ORDER)),
        None => Err(PptxError::Unsupported(format!(
            "Shape '{}' does not support fill or line styling",
            shape_name(element).unwrap_or_default()
        ))),
    }
}

pub fn apply_fill(element: &mut XmlElement, fill: &FillStyle) -> PptxResult<()> {
    let fill_element = match fill {
        FillStyle::Solid {
            color,
            transparency,
        } => {
            let mut clr = srgb(*color);
            if let Some(t) = transparency.filter(|t| *t > 0.0) {
                let alpha = ((100.0 - t) * 1000.0).round() as i64;
                clr = clr.with_child(XmlElement::new("a:alpha").with_attr("val", alpha.to_string()));
            }
            XmlElement::new("a:solidFill").with_child(clr)
        }
        FillStyle::Gradient { gradient } => {
            let stop = |pos: &str, color: Rgb| {
                XmlElement::new("a:gs")
                    .with_attr("pos", pos)
                    .with_child(srgb(color))
            };
            let angle = (gradient.angle.unwrap_or(0.0).rem_euclid(360.0) * ROT_PER_DEGREE)
                .round() as i64;
            XmlElement::new("a:gradFill")
                .with_attr("rotWithShape", "1")
                .with_child(
                    XmlElement::new("a:gsLst")
                        .with_child(stop("0", gradient.start_color))
                        .with_child(stop("100000", gradient.end_color)),
                )
                .with_child(
                    XmlElement::new("a:lin")
                        .with_attr("ang", angle.to_string())
                        .with_attr("scaled", "0"),
                )
        }
        FillStyle::None => XmlElement::new("a:noFill"),
    };
    let props = shape_properties(element)?;
    replace_fill(props, fill_element, SP_PR_ORDER);
    Ok(())
}

pub fn apply_line(element: &mut XmlElement, line: &LineStyle) -> PptxResult<()> {
    let props = shape_properties(element)?;
    let ln = props.ensure_child("a:ln", SP_PR_ORDER);
    if let Some(width) = line.width {
        ln.set_attr("w", points_to_emu(width).to_string());
    }
    match line.style {
        Some(LineDash::None) => {
            replace_fill(ln, XmlElement::new("a:noFill"), LN_ORDER);
            ln.remove_children(|e| e.is("prstDash"));
            return Ok(());
        }
        Some(dash) => {
            ln.remove_children(|e| e.is("noFill") || e.is("custDash"));
            if let Some(preset) = dash.preset() {
                ln.replace_or_insert(
                    XmlElement::new("a:prstDash").with_attr("val", preset),
                    LN_ORDER,
                );
            }
        }
        None => {}
    }
    if let Some(color) = line.color {
        replace_fill(ln, solid_fill(color), LN_ORDER);
    }
    Ok(())
}

fn non_visual_props(id: u32, name: &str) -> XmlElement {
    XmlElement::new("p:cNvPr")
        .with_attr("id", id.to_string())
        .with_attr("name", name)
}

fn xfrm_element(t: &Transform) -> XmlElement {
    let mut xfrm = XmlElement::new("a:xfrm");
    t.write(&mut xfrm);
    xfrm
}

fn preset_geometry(preset: &str) -> XmlElement {
    XmlElement::new("a:prstGeom")
        .with_attr("prst", preset)
        .with_child(XmlElement::new("a:avLst"))
}

fn style_ref(name: &str, idx: &str, scheme: &str) -> XmlElement {
    XmlElement::new(name)
        .with_attr("idx", idx)
        .with_child(XmlElement::new("a:schemeClr").with_attr("val", scheme))
}

/// A text box with no fill; text goes in through [`set_text`]
pub fn new_text_box(id: u32, name: &str, t: &Transform) -> XmlElement {
    XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(non_visual_props(id, name))
                .with_child(XmlElement::new("p:cNvSpPr").with_attr("txBox", "1"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:spPr")
                .with_child(xfrm_element(t))
                .with_child(preset_geometry("rect"))
                .with_child(XmlElement::new("a:noFill")),
        )
        .with_child(
            XmlElement::new("p:txBody")
                .with_child(
                    XmlElement::new("a:bodyPr")
                        .with_attr("wrap", "square")
                        .with_attr("rtlCol", "0")
                        .with_child(XmlElement::new("a:spAutoFit")),
                )
                .with_child(XmlElement::new("a:lstStyle"))
                .with_child(
                    XmlElement::new("a:p").with_child(
                        XmlElement::new("a:endParaRPr").with_attr("lang", "en-US"),
                    ),
                ),
        )
}

/// An auto-shape drawn with the theme's accent colour and centred text
pub fn new_auto_shape(id: u32, name: &str, t: &Transform, preset: &str) -> XmlElement {
    XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(non_visual_props(id, name))
                .with_child(XmlElement::new("p:cNvSpPr"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:spPr")
                .with_child(xfrm_element(t))
                .with_child(preset_geometry(preset)),
        )
        .with_child(
            XmlElement::new("p:style")
                .with_child(style_ref("a:lnRef", "1", "accent1"))
                .with_child(style_ref("a:fillRef", "3", "accent1"))
                .with_child(style_ref("a:effectRef", "2", "accent1"))
                .with_child(style_ref("a:fontRef", "minor", "lt1")),
        )
        .with_child(
            XmlElement::new("p:txBody")
                .with_child(
                    XmlElement::new("a:bodyPr")
                        .with_attr("rtlCol", "0")
                        .with_attr("anchor", "ctr"),
                )
                .with_child(XmlElement::new("a:lstStyle"))
                .with_child(
                    XmlElement::new("a:p")
                        .with_child(XmlElement::new("a:pPr").with_attr("algn", "ctr"))
                        .with_child(XmlElement::new("a:endParaRPr").with_attr("lang", "en-US")),
                ),
        )
}

pub fn new_connector(id: u32, name: &str, t: &Transform, preset: &str) -> XmlElement {
    XmlElement::new("p:cxnSp")
        .with_child(
            XmlElement::new("p:nvCxnSpPr")
                .with_child(non_visual_props(id, name))
                .with_child(XmlElement::new("p:cNvCxnSpPr"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:spPr")
                .with_child(xfrm_element(t))
                .with_child(preset_geometry(preset)),
        )
        .with_child(
            XmlElement::new("p:style")
                .with_child(style_ref("a:lnRef", "2", "accent1"))
                .with_child(style_ref("a:fillRef", "0", "accent1"))
                .with_child(style_ref("a:effectRef", "1", "accent1"))
                .with_child(style_ref("a:fontRef", "minor", "tx1")),
        )
}

/// An empty slide placeholder standing in for a layout placeholder
pub fn new_placeholder(id: u32, layout_shape: &XmlElement) -> Option<XmlElement> {
    let layout_ph = layout_shape.find(&["nvSpPr", "nvPr", "ph"])?;
    let mut ph = XmlElement::new("p:ph");
    for key in ["type", "orient", "sz", "idx"] {
        if let Some(value) = layout_ph.attr(key) {
            ph.set_attr(key, value);
        }
    }
    let name = shape_name(layout_shape).unwrap_or("Placeholder");
    Some(
        XmlElement::new("p:sp")
            .with_child(
                XmlElement::new("p:nvSpPr")
                    .with_child(non_visual_props(id, name))
                    .with_child(
                        XmlElement::new("p:cNvSpPr")
                            .with_child(XmlElement::new("a:spLocks").with_attr("noGrp", "1")),
                    )
                    .with_child(XmlElement::new("p:nvPr").with_child(ph)),
            )
            .with_child(XmlElement::new("p:spPr"))
            .with_child(
                XmlElement::new("p:txBody")
                    .with_child(XmlElement::new("a:bodyPr"))
                    .with_child(XmlElement::new("a:lstStyle"))
                    .with_child(
                        XmlElement::new("a:p").with_child(
                            XmlElement::new("a:endParaRPr").with_attr("lang", "en-US"),
                        ),
                    ),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use office_core::shape::catalog::MSO_PLACEHOLDER;
    use office_core::shape::GradientFill;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> XmlElement {
        crate::xml::parse(src.as_bytes()).unwrap()
    }

    #[test]
    fn test_describe_auto_shape() {
        let sp = parse(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="4" name="Oval 3"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
<p:spPr><a:xfrm rot="5400000"><a:off x="914400" y="127000"/><a:ext cx="1828800" cy="635000"/></a:xfrm><a:prstGeom prst="ellipse"><a:avLst/></a:prstGeom></p:spPr>
<p:txBody><a:bodyPr/><a:p><a:r><a:t>Hello</a:t></a:r><a:br/><a:r><a:t>there</a:t></a:r></a:p><a:p><a:fld type="slidenum"><a:t>3</a:t></a:fld></a:p></p:txBody></p:sp>"#,
        );
        let info = describe(&sp, None).unwrap();
        assert_eq!(info.id, 4);
        assert_eq!(info.type_id, MSO_AUTO_SHAPE);
        assert_eq!(info.auto_shape.as_deref(), Some("oval"));
        assert_eq!(info.frame(), Frame::new(72.0, 10.0, 144.0, 50.0));
        assert_eq!(info.rotation, 90.0);
        assert_eq!(info.text.as_deref(), Some("Hello\nthere\n3"));
    }

    #[test]
    fn test_describe_placeholder_inherits_geometry() {
        let sp = parse(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
        );
        let inherited = Transform::from_frame(Frame::new(36.0, 20.0, 600.0, 60.0));
        let info = describe(&sp, Some(inherited)).unwrap();
        assert_eq!(info.type_id, MSO_PLACEHOLDER);
        assert_eq!(info.placeholder_type_id, Some(1));
        assert_eq!(info.left, 36.0);
        assert_eq!(info.text.as_deref(), None);
        assert!(!info.has_text);
    }

    #[test]
    fn test_describe_frames() {
        let table = parse(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="7" name="Table 6"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="12700" cy="25400"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"/></a:graphic></p:graphicFrame>"#,
        );
        let info = describe(&table, None).unwrap();
        assert_eq!(info.type_id, MSO_TABLE);
        assert_eq!((info.width, info.height), (1.0, 2.0));

        let text_box = new_text_box(9, "TextBox 8", &Transform::default());
        assert_eq!(describe(&text_box, None).unwrap().type_id, MSO_TEXT_BOX);
    }

    #[test]
    fn test_set_text_keeps_run_properties() {
        let mut sp = parse(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Body"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="2400" dirty="0"/><a:t>old</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        set_text(&mut sp, "first\n\nthird").unwrap();
        assert_eq!(text(&sp).as_deref(), Some("first\n\nthird"));
        let body = sp.child("txBody").unwrap();
        let names: Vec<&str> = body.elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["bodyPr", "lstStyle", "p", "p", "p"]);
        let first = body.child("p").unwrap();
        assert_eq!(first.child("pPr").unwrap().attr("algn"), Some("ctr"));
        let r_pr = first.find(&["r", "rPr"]).unwrap();
        assert_eq!(r_pr.attr("sz"), Some("2400"));
        assert_eq!(r_pr.attr("dirty"), None);
    }

    #[test]
    fn test_set_text_rejects_pictures() {
        let mut pic = parse(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture 2"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:spPr/></p:pic>"#,
        );
        assert!(matches!(set_text(&mut pic, "x"), Err(PptxError::Unsupported(_))));
    }

    #[test]
    fn test_set_transform_creates_xfrm() {
        let mut sp = parse(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:prstGeom prst="rect"/></p:spPr></p:sp>"#,
        );
        let mut t = Transform::from_frame(Frame::new(1.0, 2.0, 3.0, 4.0));
        t.rot = 45 * 60_000;
        set_transform(&mut sp, &t).unwrap();
        let sp_pr = sp.child("spPr").unwrap();
        assert_eq!(sp_pr.elements().next().unwrap().local_name(), "xfrm");
        assert_eq!(transform(&sp), Some(t));
    }

    #[test]
    fn test_styles() {
        let mut sp = new_auto_shape(5, "Shape 4", &Transform::default(), "rect");
        set_text(&mut sp, "styled").unwrap();
        apply_font(
            &mut sp,
            &FontStyle {
                family: Some("Arial".into()),
                size: Some(18.0),
                bold: Some(true),
                color: Some(Rgb::new(255, 0, 0)),
                ..Default::default()
            },
        )
        .unwrap();
        let r_pr = sp.find(&["txBody", "p", "r", "rPr"]).unwrap();
        assert_eq!(r_pr.attr("sz"), Some("1800"));
        assert_eq!(r_pr.attr("b"), Some("1"));
        let children: Vec<&str> = r_pr.elements().map(|e| e.local_name()).collect();
        assert_eq!(children, vec!["solidFill", "latin"]);

        apply_fill(
            &mut sp,
            &FillStyle::Gradient {
                gradient: GradientFill {
                    start_color: Rgb::new(0, 0, 0),
                    end_color: Rgb::new(255, 255, 255),
                    angle: Some(90.0),
                },
            },
        )
        .unwrap();
        apply_fill(
            &mut sp,
            &FillStyle::Solid {
                color: Rgb::new(0, 0, 255),
                transparency: Some(25.0),
            },
        )
        .unwrap();
        apply_line(
            &mut sp,
            &LineStyle {
                color: Some(Rgb::new(0, 255, 0)),
                width: Some(2.0),
                style: Some(LineDash::Dash),
            },
        )
        .unwrap();
        let sp_pr = sp.child("spPr").unwrap();
        let children: Vec<&str> = sp_pr.elements().map(|e| e.local_name()).collect();
        assert_eq!(children, vec!["xfrm", "prstGeom", "solidFill", "ln"]);
        let alpha = sp_pr.find(&["solidFill", "srgbClr", "alpha"]).unwrap();
        assert_eq!(alpha.attr("val"), Some("75000"));
        let ln = sp_pr.child("ln").unwrap();
        assert_eq!(ln.attr("w"), Some("25400"));
        let ln_children: Vec<&str> = ln.elements().map(|e| e.local_name()).collect();
        assert_eq!(ln_children, vec!["solidFill", "prstDash"]);

        apply_line(
            &mut sp,
            &LineStyle {
                style: Some(LineDash::None),
                ..Default::default()
            },
        )
        .unwrap();
        let ln = sp.find(&["spPr", "ln"]).unwrap();
        assert!(ln.child("noFill").is_some());
        assert!(ln.child("solidFill").is_none());
    }

    #[test]
    fn test_new_placeholder_copies_ph() {
        let layout_sp = parse(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph idx="1" hasCustomPrompt="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="1" y="2"/><a:ext cx="3" cy="4"/></a:xfrm></p:spPr></p:sp>"#,
        );
        let sp = new_placeholder(2, &layout_sp).unwrap();
        let ph = placeholder(&sp).unwrap();
        assert_eq!(ph.idx, Some(1));
        assert_eq!(ph.effective_type(), "obj");
        assert_eq!(shape_name(&sp), Some("Content Placeholder 2"));
        assert_eq!(transform(&sp), None);
    }
}
