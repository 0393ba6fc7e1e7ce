//! PowerPoint backend driving the running application through the COM bridge

use office_com::WirePresentation;
use office_core::shape::catalog::{AutoShapeKind, ConnectorKind};
use office_core::shape::{Frame, ShapeEdit, StyleProperties};
use office_core::{Identifier, Rgb, ShapeInfo};

use super::{
    no_presentation, presentation_not_found, LayoutEntry, PowerPointBackend, PresentationRef,
    PresentationSummary, SlideShapes, SAVE_PATH_REQUIRED,
};
use crate::error::{ToolError, ToolResult};
use crate::live::LiveSession;

pub struct LivePowerPoint {
    session: LiveSession,
    /// Full name of the presentation last opened or saved
    current: Option<String>,
}

fn bridge_index(n: usize) -> ToolResult<u32> {
    u32::try_from(n).map_err(|_| ToolError::invalid(format!("Index {n} is out of range.")))
}

impl LivePowerPoint {
    pub fn new(session: LiveSession) -> Self {
        Self {
            session,
            current: None,
        }
    }

    pub fn session(&self) -> &LiveSession {
        &self.session
    }

    /// Open presentation a caller means: 1-based position, name, or full
    /// path of a saved presentation (ignoring case)
    fn presentation(&self, id: &Identifier) -> ToolResult<WirePresentation> {
        let open = self.session.bridge().list_presentations()?;
        let found = match id {
            Identifier::Index(_) => id.position_in(open.len()).map(|i| open[i].clone()),
            Identifier::Name(name) => {
                let wanted = name.trim().to_lowercase();
                open.into_iter().find(|p| {
                    p.name.to_lowercase() == wanted
                        || (!p.path.is_empty() && p.full_name.to_lowercase() == wanted)
                })
            }
        };
        found.ok_or_else(|| presentation_not_found(id))
    }

    /// The current presentation, else the first open one
    fn current(&self) -> ToolResult<WirePresentation> {
        let open = self.session.bridge().list_presentations()?;
        let current = self
            .current
            .as_ref()
            .and_then(|name| open.iter().find(|p| &p.full_name == name))
            .or_else(|| open.first());
        current.cloned().ok_or_else(no_presentation)
    }

    fn slide_of(&self, id: &Identifier, slide: usize) -> ToolResult<(u32, u32)> {
        Ok((self.presentation(id)?.index, bridge_index(slide)?))
    }
}

impl PowerPointBackend for LivePowerPoint {
    fn list_presentations(&mut self) -> ToolResult<Vec<PresentationSummary>> {
        let open = self.session.bridge().list_presentations()?;
        Ok(open
            .into_iter()
            .map(|p| PresentationSummary {
                path: if p.read_only {
                    format!("{} (ReadOnly)", p.full_name)
                } else {
                    p.full_name
                },
                name: p.name,
                slides: p.slides as usize,
                saved: p.saved,
                index: p.index as usize,
            })
            .collect())
    }

    fn open_presentation(&mut self, path: &str) -> ToolResult<PresentationRef> {
        let app_path = self.session.app_path(path);
        let opened = self.session.bridge().open_presentation(&app_path)?;
        self.current = Some(opened.full_name.clone());
        Ok(PresentationRef {
            name: opened.name,
            path: opened.full_name,
            index: opened.index as usize,
        })
    }

    fn save_presentation(
        &mut self,
        id: Option<&Identifier>,
        save_path: Option<&str>,
    ) -> ToolResult<String> {
        let presentation = match id {
            Some(id) => self.presentation(id)?,
            None => self.current()?,
        };
        let target = save_path.map(|p| self.session.app_path(p));
        if target.is_none() && presentation.path.is_empty() {
            return Err(ToolError::invalid(SAVE_PATH_REQUIRED));
        }
        self.session
            .bridge()
            .save_presentation(presentation.index, target.as_deref())?;
        self.current = Some(target.unwrap_or(presentation.full_name));
        Ok(presentation.name)
    }

    fn presentation_key(&mut self, id: &Identifier) -> ToolResult<String> {
        Ok(self.presentation(id)?.full_name)
    }

    fn slide_count(&mut self, id: &Identifier) -> ToolResult<usize> {
        Ok(self.presentation(id)?.slides as usize)
    }

    fn layouts(&mut self, id: &Identifier) -> ToolResult<Vec<LayoutEntry>> {
        let presentation = self.presentation(id)?;
        let layouts = self.session.bridge().list_layouts(presentation.index)?;
        Ok(layouts
            .into_iter()
            .map(|l| LayoutEntry {
                index: l.index as usize,
                name: l.name,
            })
            .collect())
    }

    fn add_slide(&mut self, id: &Identifier, layout: usize) -> ToolResult<usize> {
        let presentation = self.presentation(id)?;
        let slide = self
            .session
            .bridge()
            .add_slide(presentation.index, bridge_index(layout)?)?;
        Ok(slide as usize)
    }

    fn delete_slide(&mut self, id: &Identifier, slide: usize) -> ToolResult<()> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        self.session.bridge().delete_slide(presentation, slide)?;
        Ok(())
    }

    fn slide_shapes(&mut self, id: &Identifier, slide: usize) -> ToolResult<SlideShapes> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        let listed = self.session.bridge().slide_shapes(presentation, slide)?;
        Ok(SlideShapes {
            layout: listed.layout,
            shapes: listed.shapes,
        })
    }

    fn add_text_box(
        &mut self,
        id: &Identifier,
        slide: usize,
        frame: Frame,
        text: &str,
        font_size: Option<f64>,
    ) -> ToolResult<ShapeInfo> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        Ok(self
            .session
            .bridge()
            .add_text_box(presentation, slide, frame, text, font_size)?)
    }

    fn add_shape(
        &mut self,
        id: &Identifier,
        slide: usize,
        kind: &AutoShapeKind,
        frame: Frame,
    ) -> ToolResult<ShapeInfo> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        Ok(self
            .session
            .bridge()
            .add_shape(presentation, slide, kind, frame)?)
    }

    fn add_connector(
        &mut self,
        id: &Identifier,
        slide: usize,
        kind: &ConnectorKind,
        from: u32,
        to: u32,
    ) -> ToolResult<ShapeInfo> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        Ok(self
            .session
            .bridge()
            .add_connector(presentation, slide, kind, from, to)?)
    }

    fn edit_shape(
        &mut self,
        id: &Identifier,
        slide: usize,
        shape: u32,
        edit: &ShapeEdit,
    ) -> ToolResult<ShapeInfo> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        Ok(self
            .session
            .bridge()
            .edit_shape(presentation, slide, shape, edit)?)
    }

    fn style_shape(
        &mut self,
        id: &Identifier,
        slide: usize,
        shape: u32,
        style: &StyleProperties,
    ) -> ToolResult<()> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        self.session
            .bridge()
            .style_shape(presentation, slide, shape, style)?;
        Ok(())
    }

    fn set_background(&mut self, id: &Identifier, slide: usize, color: Rgb) -> ToolResult<()> {
        let (presentation, slide) = self.slide_of(id, slide)?;
        self.session
            .bridge()
            .set_background(presentation, slide, color)?;
        Ok(())
    }
}
