//! PowerPoint backend over PPTX files held in memory

use std::fs;
use std::path::{Path, PathBuf};

use office_core::shape::catalog::{AutoShapeKind, ConnectorKind};
use office_core::shape::{ConnectorPath, FontStyle, Frame, ShapeEdit, StyleProperties};
use office_core::{Identifier, Rgb, ShapeInfo};
use office_pptx::{PptxError, Presentation};
use serde_json::{Map, Value};
use tracing::info;

use super::templates::{
    self, AppliedTemplate, CreatedSlide, TemplateInfo, TemplateLibrary, TemplateMetadata,
    TemplateOptions,
};
use super::{
    no_presentation, presentation_not_found, LayoutEntry, PowerPointBackend, PresentationRef,
    PresentationSummary, SlideShapes,
};
use crate::cache::{CachedDocument, DocumentCache};
use crate::error::{ToolError, ToolResult};

/// Presentations tracked by path, plus the workspace's template library
pub struct DocumentPowerPoint {
    workspace: PathBuf,
    cache: DocumentCache<Presentation>,
    templates: TemplateLibrary,
}

/// Read an existing presentation, or start an empty one that is written on
/// the first save
fn load_or_create(path: &Path) -> Result<(Presentation, bool), PptxError> {
    if path.exists() {
        return Ok((Presentation::open(path)?, true));
    }
    info!("new presentation for {}", path.display());
    Ok((Presentation::new()?, false))
}

/// 0-based slide position for a 1-based slide number
fn slide_position(presentation: &Presentation, slide: usize) -> ToolResult<usize> {
    let count = presentation.slide_count();
    if slide == 0 || slide > count {
        return Err(PptxError::SlideOutOfRange {
            number: slide,
            count,
        }
        .into());
    }
    Ok(slide - 1)
}

impl DocumentPowerPoint {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        Self {
            templates: TemplateLibrary::new(&workspace),
            workspace,
            cache: DocumentCache::new(),
        }
    }

    fn workspace_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// 0-based cache position; a name that is a presentation file in the
    /// workspace is opened on first use
    fn position(&mut self, id: &Identifier) -> ToolResult<usize> {
        if let Some(index) = self.cache.resolve(id) {
            return Ok(index);
        }
        if let Identifier::Name(name) = id {
            let path = self.workspace_path(name.trim());
            if path.is_file() {
                return Ok(self.cache.get_or_load(&path, load_or_create)?);
            }
        }
        Err(presentation_not_found(id))
    }

    fn entry(&mut self, id: &Identifier) -> ToolResult<&CachedDocument<Presentation>> {
        let index = self.position(id)?;
        self.cache.get(index).ok_or_else(|| presentation_not_found(id))
    }

    fn presentation(&mut self, id: &Identifier) -> ToolResult<&Presentation> {
        Ok(&self.entry(id)?.document)
    }

    fn presentation_mut(&mut self, id: &Identifier) -> ToolResult<&mut Presentation> {
        let index = self.position(id)?;
        self.cache
            .get_mut(index)
            .map(CachedDocument::document_mut)
            .ok_or_else(|| presentation_not_found(id))
    }

    /// Run an edit against a slide (0-based inside `edit`)
    fn edit_slide<T>(
        &mut self,
        id: &Identifier,
        slide: usize,
        edit: impl FnOnce(&mut Presentation, usize) -> Result<T, PptxError>,
    ) -> ToolResult<T> {
        let presentation = self.presentation_mut(id)?;
        let position = slide_position(presentation, slide)?;
        Ok(edit(presentation, position)?)
    }
}

impl PowerPointBackend for DocumentPowerPoint {
    fn list_presentations(&mut self) -> ToolResult<Vec<PresentationSummary>> {
        Ok(self
            .cache
            .iter()
            .enumerate()
            .map(|(i, entry)| PresentationSummary {
                name: entry.name(),
                path: entry.path.display().to_string(),
                slides: entry.document.slide_count(),
                saved: entry.saved,
                index: i + 1,
            })
            .collect())
    }

    fn open_presentation(&mut self, path: &str) -> ToolResult<PresentationRef> {
        let full = self.workspace_path(path);
        let index = self.cache.get_or_load(&full, load_or_create)?;
        let entry = self
            .cache
            .get(index)
            .ok_or_else(|| presentation_not_found(&Identifier::parse(path)))?;
        Ok(PresentationRef {
            name: entry.name(),
            path: entry.path.display().to_string(),
            index: index + 1,
        })
    }

    fn save_presentation(
        &mut self,
        id: Option<&Identifier>,
        save_path: Option<&str>,
    ) -> ToolResult<String> {
        let index = match id {
            Some(id) => self.position(id)?,
            None => self.cache.current().ok_or_else(no_presentation)?,
        };
        let target = save_path.map(|p| self.workspace_path(p));
        let entry = self.cache.get_mut(index).ok_or_else(no_presentation)?;
        let path = target.clone().unwrap_or_else(|| entry.path.clone());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.document.save(&path)?;
        entry.saved = true;
        info!("saved presentation to {}", path.display());
        if let Some(target) = target {
            self.cache.rename(index, &target);
        }
        self.cache.set_current(index);
        Ok(self
            .cache
            .get(index)
            .map(CachedDocument::name)
            .unwrap_or_default())
    }

    fn presentation_key(&mut self, id: &Identifier) -> ToolResult<String> {
        Ok(self.entry(id)?.path.display().to_string())
    }

    fn slide_count(&mut self, id: &Identifier) -> ToolResult<usize> {
        Ok(self.presentation(id)?.slide_count())
    }

    fn layouts(&mut self, id: &Identifier) -> ToolResult<Vec<LayoutEntry>> {
        Ok(self
            .presentation(id)?
            .layouts()
            .into_iter()
            .map(|l| LayoutEntry {
                index: l.index + 1,
                name: l.name,
            })
            .collect())
    }

    fn add_slide(&mut self, id: &Identifier, layout: usize) -> ToolResult<usize> {
        let layout = layout
            .checked_sub(1)
            .ok_or_else(|| ToolError::invalid(format!("Layout index {layout} invalid.")))?;
        let slide = self.presentation_mut(id)?.add_slide(layout)?;
        Ok(slide + 1)
    }

    fn delete_slide(&mut self, id: &Identifier, slide: usize) -> ToolResult<()> {
        self.edit_slide(id, slide, |p, i| p.delete_slide(i))
    }

    fn slide_shapes(&mut self, id: &Identifier, slide: usize) -> ToolResult<SlideShapes> {
        let presentation = self.presentation(id)?;
        let position = slide_position(presentation, slide)?;
        Ok(SlideShapes {
            layout: presentation.layout_name(position)?,
            shapes: presentation.shapes(position)?,
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
        self.edit_slide(id, slide, |p, i| {
            let shape = p.add_text_box(i, frame, text)?;
            p.set_name(i, shape, &format!("TextBox_{shape}"))?;
            if let Some(size) = font_size {
                let font = FontStyle {
                    size: Some(size),
                    ..FontStyle::default()
                };
                p.apply_font(i, shape, &font)?;
            }
            p.shape(i, shape)
        })
    }

    fn add_shape(
        &mut self,
        id: &Identifier,
        slide: usize,
        kind: &AutoShapeKind,
        frame: Frame,
    ) -> ToolResult<ShapeInfo> {
        self.edit_slide(id, slide, |p, i| {
            let shape = p.add_auto_shape(i, kind, frame)?;
            p.set_name(i, shape, &format!("Shape_{shape}"))?;
            p.shape(i, shape)
        })
    }

    fn add_connector(
        &mut self,
        id: &Identifier,
        slide: usize,
        kind: &ConnectorKind,
        from: u32,
        to: u32,
    ) -> ToolResult<ShapeInfo> {
        self.edit_slide(id, slide, |p, i| {
            let path = ConnectorPath::between(&p.shape(i, from)?, &p.shape(i, to)?);
            let shape = p.add_connector(i, kind, &path)?;
            p.set_name(i, shape, &format!("Connector_{shape}"))?;
            p.shape(i, shape)
        })
    }

    fn edit_shape(
        &mut self,
        id: &Identifier,
        slide: usize,
        shape: u32,
        edit: &ShapeEdit,
    ) -> ToolResult<ShapeInfo> {
        self.edit_slide(id, slide, |p, i| p.edit_shape(i, shape, edit))
    }

    fn style_shape(
        &mut self,
        id: &Identifier,
        slide: usize,
        shape: u32,
        style: &StyleProperties,
    ) -> ToolResult<()> {
        self.edit_slide(id, slide, |p, i| p.apply_style(i, shape, style))
    }

    fn set_background(&mut self, id: &Identifier, slide: usize, color: Rgb) -> ToolResult<()> {
        self.edit_slide(id, slide, |p, i| p.set_background(i, color))
    }

    fn supports_templates(&self) -> bool {
        true
    }

    fn list_templates(&mut self) -> ToolResult<Vec<TemplateInfo>> {
        self.templates.list()
    }

    fn save_as_template(
        &mut self,
        id: &Identifier,
        slide: usize,
        name: &str,
        description: &str,
    ) -> ToolResult<TemplateInfo> {
        let entry = self.entry(id)?;
        let source = entry.name();
        let position = slide_position(&entry.document, slide)?;
        let template = entry.document.copy_keeping_slide(position)?;
        let metadata = TemplateMetadata::new(description, &source, slide);
        self.templates.save(name, &template, &metadata)
    }

    fn create_slide_from_template(
        &mut self,
        id: &Identifier,
        name: &str,
        content: &Map<String, Value>,
    ) -> ToolResult<CreatedSlide> {
        let template = self.templates.load(name)?;
        let presentation = self.presentation_mut(id)?;
        templates::slide_from_template(presentation, &template, name, content)
    }

    fn apply_template(
        &mut self,
        id: &Identifier,
        name: &str,
        options: &TemplateOptions,
    ) -> ToolResult<AppliedTemplate> {
        let template = self.templates.load(name)?;
        let presentation = self.presentation_mut(id)?;
        templates::apply_template(presentation, &template, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deck(dir: &Path) -> (DocumentPowerPoint, Identifier) {
        let mut backend = DocumentPowerPoint::new(dir);
        backend.open_presentation("deck.pptx").unwrap();
        (backend, Identifier::parse("deck.pptx"))
    }

    #[test]
    fn test_new_presentation_is_unsaved_until_saved() {
        let dir = tempfile::tempdir().unwrap();
        let (mut backend, id) = deck(dir.path());
        let listed = backend.list_presentations().unwrap();
        assert_eq!(listed[0].slides, 0);
        assert!(!listed[0].saved);
        assert!(!dir.path().join("deck.pptx").exists());

        let name = backend.save_presentation(None, None).unwrap();
        assert_eq!(name, "deck.pptx");
        assert!(dir.path().join("deck.pptx").is_file());
        assert!(backend.list_presentations().unwrap()[0].saved);
        assert_eq!(backend.slide_count(&id).unwrap(), 0);
    }

    #[test]
    fn test_slides_are_one_based() {
        let dir = tempfile::tempdir().unwrap();
        let (mut backend, id) = deck(dir.path());
        assert_eq!(backend.add_slide(&id, 2).unwrap(), 1);
        assert_eq!(backend.add_slide(&id, 4).unwrap(), 2);

        let shapes = backend.slide_shapes(&id, 1).unwrap();
        assert_eq!(shapes.layout.as_deref(), Some("Title and Content"));
        assert_eq!(shapes.shapes.len(), 2);
        assert!(backend.slide_shapes(&id, 2).unwrap().shapes.is_empty());

        let err = backend.slide_shapes(&id, 3).unwrap_err();
        assert_eq!(err.to_string(), "Slide 3 out of range. Presentation has 2 slides.");
        assert!(backend.slide_shapes(&id, 0).is_err());

        backend.delete_slide(&id, 1).unwrap();
        assert_eq!(backend.slide_count(&id).unwrap(), 1);
    }

    #[test]
    fn test_added_shapes_are_named_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let (mut backend, id) = deck(dir.path());
        backend.add_slide(&id, 4).unwrap();

        let text = backend
            .add_text_box(&id, 1, Frame::new(72.0, 72.0, 288.0, 72.0), "Hello", Some(24.0))
            .unwrap();
        assert_eq!(text.name, format!("TextBox_{}", text.id));
        assert_eq!(text.text.as_deref(), Some("Hello"));

        let kind = office_core::shape::catalog::auto_shape("oval").unwrap();
        let oval = backend
            .add_shape(&id, 1, kind, Frame::new(300.0, 150.0, 144.0, 72.0))
            .unwrap();
        assert_eq!(oval.name, format!("Shape_{}", oval.id));
        assert_eq!(oval.auto_shape.as_deref(), Some("oval"));

        let straight = office_core::shape::catalog::connector("straight").unwrap();
        let line = backend
            .add_connector(&id, 1, straight, text.id, oval.id)
            .unwrap();
        assert_eq!(line.name, format!("Connector_{}", line.id));
        assert_eq!(backend.slide_shapes(&id, 1).unwrap().shapes.len(), 3);
    }

    #[test]
    fn test_save_as_template_keeps_one_slide() {
        let dir = tempfile::tempdir().unwrap();
        let (mut backend, id) = deck(dir.path());
        backend.add_slide(&id, 1).unwrap();
        backend.add_slide(&id, 2).unwrap();

        let info = backend
            .save_as_template(&id, 2, "agenda", "Agenda slide")
            .unwrap();
        assert_eq!(info.metadata["created_from"], "deck.pptx");
        assert_eq!(info.metadata["slide_index"], 2);

        let template = Presentation::open(dir.path().join("templates/agenda.pptx")).unwrap();
        assert_eq!(template.slide_count(), 1);
        assert_eq!(template.layout_name(0).unwrap().as_deref(), Some("Title and Content"));
        assert_eq!(backend.list_templates().unwrap().len(), 1);
        // the source deck is untouched
        assert_eq!(backend.slide_count(&id).unwrap(), 2);
    }
}
