//! PowerPoint automation on top of [`ComObject`].

#![cfg(windows)]

use office_com_protocol::{
    WireEdit, WireFill, WireFrame, WireLayout, WirePresentation, WireShape, WireStyle,
};

use crate::dispatch::{variant_f64, variant_i32, variant_object, variant_str, ComObject};
use crate::values::PPT_SAVE_AS_PPTX;

const MSO_TRUE: i32 = -1;
const MSO_FALSE: i32 = 0;
const MSO_AUTO_SHAPE: i32 = 1;
const MSO_PLACEHOLDER: i32 = 14;
const MSO_TEXT_ORIENTATION_HORIZONTAL: i32 = 1;
const MSO_GRADIENT_HORIZONTAL: i32 = 1;

/// The user's PowerPoint instance
pub struct PowerPointSession {
    app: ComObject,
}

impl PowerPointSession {
    pub fn attach() -> Result<Self, String> {
        let (app, launched) = ComObject::attach_or_launch("PowerPoint.Application")?;
        if launched {
            app.put("Visible", variant_i32(MSO_TRUE))?;
            eprintln!("[office-com-bridge] Launched a new PowerPoint instance");
        } else {
            eprintln!("[office-com-bridge] Attached to running PowerPoint");
        }
        Ok(Self { app })
    }

    pub fn version(&self) -> Result<String, String> {
        self.app.string("Version")
    }

    fn presentation(&self, index: u32) -> Result<ComObject, String> {
        let all = self.app.object("Presentations")?;
        let count = all.count()?;
        if index == 0 || index as i32 > count {
            return Err(format!("Presentation index {index} out of range (1-{count})"));
        }
        all.item(index as i32)
    }

    fn slide(&self, presentation: u32, slide: u32) -> Result<ComObject, String> {
        let slides = self.presentation(presentation)?.object("Slides")?;
        let count = slides.count()?;
        if slide == 0 || slide as i32 > count {
            return Err(format!("Slide index {slide} out of range (1-{count})"));
        }
        slides.item(slide as i32)
    }

    fn shape(&self, presentation: u32, slide: u32, id: u32) -> Result<ComObject, String> {
        let shapes = self.slide(presentation, slide)?.object("Shapes")?;
        for i in 1..=shapes.count()? {
            let shape = shapes.item(i)?;
            if shape.int("Id")? as u32 == id {
                return Ok(shape);
            }
        }
        Err(format!("Shape with ID {id} not found on slide {slide}"))
    }

    fn describe(index: u32, pres: &ComObject) -> Result<WirePresentation, String> {
        Ok(WirePresentation {
            index,
            name: pres.string("Name")?,
            full_name: pres.string("FullName")?,
            path: pres.string("Path")?,
            slides: pres.object("Slides")?.count()? as u32,
            saved: pres.flag("Saved")?,
            read_only: pres.flag("ReadOnly")?,
        })
    }

    pub fn list_presentations(&self) -> Result<Vec<WirePresentation>, String> {
        let all = self.app.object("Presentations")?;
        (1..=all.count()?)
            .map(|i| Self::describe(i as u32, &all.item(i)?))
            .collect()
    }

    pub fn open_presentation(&self, path: &str) -> Result<WirePresentation, String> {
        let all = self.app.object("Presentations")?;
        let opened = all.call_object("Open", &[variant_str(path)])?;
        let full_name = opened.string("FullName")?;
        for i in 1..=all.count()? {
            let pres = all.item(i)?;
            if pres.string("FullName")? == full_name {
                return Self::describe(i as u32, &pres);
            }
        }
        Self::describe(all.count()? as u32, &opened)
    }

    pub fn save_presentation(&self, index: u32, path: Option<&str>) -> Result<(), String> {
        let pres = self.presentation(index)?;
        match path {
            Some(path) => pres
                .call("SaveAs", &[variant_str(path), variant_i32(PPT_SAVE_AS_PPTX)])
                .map(|_| ()),
            None if pres.string("Path")?.is_empty() => {
                Err("save_path is required for a presentation that has never been saved".to_string())
            }
            None => pres.call("Save", &[]).map(|_| ()),
        }
    }

    fn custom_layouts(&self, presentation: u32) -> Result<ComObject, String> {
        self.presentation(presentation)?
            .object("SlideMaster")?
            .object("CustomLayouts")
    }

    pub fn list_layouts(&self, presentation: u32) -> Result<Vec<WireLayout>, String> {
        let layouts = self.custom_layouts(presentation)?;
        (1..=layouts.count()?)
            .map(|i| {
                Ok(WireLayout {
                    index: i as u32,
                    name: layouts.item(i)?.string("Name")?,
                })
            })
            .collect()
    }

    /// Append a slide; an out-of-range layout falls back to the first one
    pub fn add_slide(&self, presentation: u32, layout: u32) -> Result<u32, String> {
        let layouts = self.custom_layouts(presentation)?;
        let count = layouts.count()?;
        let layout = if layout >= 1 && layout as i32 <= count {
            layout as i32
        } else {
            eprintln!("[office-com-bridge] Layout {layout} out of range (1-{count}), using 1");
            1
        };
        let slides = self.presentation(presentation)?.object("Slides")?;
        let position = slides.count()? + 1;
        let layout_obj = layouts.item(layout)?;
        let added = slides.call_object(
            "AddSlide",
            &[variant_i32(position), variant_object(&layout_obj)],
        )?;
        Ok(added.int("SlideIndex")? as u32)
    }

    pub fn delete_slide(&self, presentation: u32, slide: u32) -> Result<(), String> {
        self.slide(presentation, slide)?.call("Delete", &[]).map(|_| ())
    }

    pub fn list_shapes(&self, presentation: u32, slide: u32) -> Result<(Vec<WireShape>, Option<String>), String> {
        let slide_obj = self.slide(presentation, slide)?;
        let layout = slide_obj
            .object("CustomLayout")
            .and_then(|l| l.string("Name"))
            .ok();
        let shapes = slide_obj.object("Shapes")?;
        let mut out = Vec::new();
        for i in 1..=shapes.count()? {
            out.push(wire_shape(&shapes.item(i)?)?);
        }
        Ok((out, layout))
    }

    pub fn add_text_box(
        &self,
        presentation: u32,
        slide: u32,
        frame: &WireFrame,
        text: &str,
        font_size: Option<f64>,
    ) -> Result<WireShape, String> {
        let shapes = self.slide(presentation, slide)?.object("Shapes")?;
        let mut args = vec![variant_i32(MSO_TEXT_ORIENTATION_HORIZONTAL)];
        args.extend(frame_args(frame));
        let shape = shapes.call_object("AddTextbox", &args)?;
        let range = shape.object("TextFrame")?.object("TextRange")?;
        range.put("Text", variant_str(text))?;
        if let Some(size) = font_size {
            range.object("Font")?.put("Size", variant_f64(size))?;
        }
        let name = format!("TextBox_{}", shape.int("Id")?);
        shape.put("Name", variant_str(&name))?;
        wire_shape(&shape)
    }

    pub fn add_shape(
        &self,
        presentation: u32,
        slide: u32,
        auto_shape: i32,
        frame: &WireFrame,
    ) -> Result<WireShape, String> {
        let shapes = self.slide(presentation, slide)?.object("Shapes")?;
        let mut args = vec![variant_i32(auto_shape)];
        args.extend(frame_args(frame));
        let shape = shapes.call_object("AddShape", &args)?;
        let name = format!("Shape_{}", shape.int("Id")?);
        shape.put("Name", variant_str(&name))?;
        wire_shape(&shape)
    }

    /// Straight line of the given connector type between two shapes' centres
    pub fn add_connector(
        &self,
        presentation: u32,
        slide: u32,
        connector: i32,
        from: u32,
        to: u32,
    ) -> Result<WireShape, String> {
        let (x1, y1) = centre(&self.shape(presentation, slide, from)?)?;
        let (x2, y2) = centre(&self.shape(presentation, slide, to)?)?;
        let shapes = self.slide(presentation, slide)?.object("Shapes")?;
        let shape = shapes.call_object(
            "AddConnector",
            &[
                variant_i32(connector),
                variant_f64(x1),
                variant_f64(y1),
                variant_f64(x2),
                variant_f64(y2),
            ],
        )?;
        let name = format!("Connector_{}", shape.int("Id")?);
        shape.put("Name", variant_str(&name))?;
        wire_shape(&shape)
    }

    pub fn edit_shape(
        &self,
        presentation: u32,
        slide: u32,
        id: u32,
        edit: &WireEdit,
    ) -> Result<WireShape, String> {
        let shape = self.shape(presentation, slide, id)?;
        if let Some(text) = &edit.text {
            if shape.flag("HasTextFrame")? {
                shape
                    .object("TextFrame")?
                    .object("TextRange")?
                    .put("Text", variant_str(text))?;
            }
        }
        for (prop, value) in [
            ("Left", edit.left),
            ("Top", edit.top),
            ("Width", edit.width),
            ("Height", edit.height),
            ("Rotation", edit.rotation),
        ] {
            if let Some(value) = value {
                shape.put(prop, variant_f64(value))?;
            }
        }
        if let Some(name) = &edit.name {
            shape.put("Name", variant_str(name))?;
        }
        wire_shape(&shape)
    }

    pub fn style_shape(
        &self,
        presentation: u32,
        slide: u32,
        id: u32,
        style: &WireStyle,
    ) -> Result<(), String> {
        let shape = self.shape(presentation, slide, id)?;

        if let Some(font) = &style.font {
            if shape.flag("HasTextFrame")? {
                let target = shape.object("TextFrame")?.object("TextRange")?.object("Font")?;
                if let Some(name) = &font.name {
                    target.put("Name", variant_str(name))?;
                }
                if let Some(size) = font.size {
                    target.put("Size", variant_f64(size))?;
                }
                for (prop, value) in [
                    ("Bold", font.bold),
                    ("Italic", font.italic),
                    ("Underline", font.underline),
                ] {
                    if let Some(on) = value {
                        target.put(prop, variant_i32(if on { MSO_TRUE } else { MSO_FALSE }))?;
                    }
                }
                if let Some(color) = font.color {
                    target.object("Color")?.put("RGB", variant_i32(color))?;
                }
            }
        }

        if let Some(fill) = &style.fill {
            let target = shape.object("Fill")?;
            match fill {
                WireFill::Solid {
                    color,
                    transparency,
                } => {
                    target.put("Visible", variant_i32(MSO_TRUE))?;
                    target.call("Solid", &[])?;
                    target.object("ForeColor")?.put("RGB", variant_i32(*color))?;
                    if let Some(t) = transparency {
                        target.put("Transparency", variant_f64(*t))?;
                    }
                }
                WireFill::Gradient {
                    start_color,
                    end_color,
                } => {
                    target.put("Visible", variant_i32(MSO_TRUE))?;
                    target.call(
                        "TwoColorGradient",
                        &[variant_i32(MSO_GRADIENT_HORIZONTAL), variant_i32(1)],
                    )?;
                    target.object("ForeColor")?.put("RGB", variant_i32(*start_color))?;
                    target.object("BackColor")?.put("RGB", variant_i32(*end_color))?;
                }
                WireFill::None => target.put("Visible", variant_i32(MSO_FALSE))?,
            }
        }

        if let Some(line) = &style.line {
            let target = shape.object("Line")?;
            if line.hidden {
                target.put("Visible", variant_i32(MSO_FALSE))?;
            } else {
                target.put("Visible", variant_i32(MSO_TRUE))?;
                if let Some(color) = line.color {
                    target.object("ForeColor")?.put("RGB", variant_i32(color))?;
                }
                if let Some(weight) = line.weight {
                    target.put("Weight", variant_f64(weight))?;
                }
                if let Some(dash) = line.dash_style {
                    target.put("DashStyle", variant_i32(dash))?;
                }
            }
        }
        Ok(())
    }

    pub fn set_background(&self, presentation: u32, slide: u32, color: i32) -> Result<(), String> {
        let slide = self.slide(presentation, slide)?;
        slide.put("FollowMasterBackground", variant_i32(MSO_FALSE))?;
        let fill = slide.object("Background")?.object("Fill")?;
        fill.call("Solid", &[])?;
        fill.object("ForeColor")?.put("RGB", variant_i32(color))
    }
}

fn frame_args(frame: &WireFrame) -> [windows::Win32::System::Variant::VARIANT; 4] {
    [
        variant_f64(frame.left),
        variant_f64(frame.top),
        variant_f64(frame.width),
        variant_f64(frame.height),
    ]
}

fn centre(shape: &ComObject) -> Result<(f64, f64), String> {
    Ok((
        shape.number("Left")? + shape.number("Width")? / 2.0,
        shape.number("Top")? + shape.number("Height")? / 2.0,
    ))
}

fn wire_shape(shape: &ComObject) -> Result<WireShape, String> {
    let type_id = shape.int("Type")?;
    let text = if shape.flag("HasTextFrame").unwrap_or(false) {
        let frame = shape.object("TextFrame")?;
        if frame.flag("HasText").unwrap_or(false) {
            Some(frame.object("TextRange")?.string("Text")?)
        } else {
            None
        }
    } else {
        None
    };
    let placeholder_type = if type_id == MSO_PLACEHOLDER {
        shape
            .object("PlaceholderFormat")
            .and_then(|p| p.int("Type"))
            .ok()
    } else {
        None
    };
    let auto_shape_type = if type_id == MSO_AUTO_SHAPE {
        shape.int("AutoShapeType").ok()
    } else {
        None
    };
    Ok(WireShape {
        id: shape.int("Id")? as u32,
        name: shape.string("Name")?,
        type_id,
        left: shape.number("Left")?,
        top: shape.number("Top")?,
        width: shape.number("Width")?,
        height: shape.number("Height")?,
        rotation: shape.number("Rotation").unwrap_or(0.0),
        text,
        placeholder_type,
        auto_shape_type,
    })
}
