//! PowerPoint tools, served by either backend.
//!
//! Backends count slides from 1 like the tools do. Shape lookup, element ids
//! and the shape analyzers live here; templates are only offered by the
//! document backend.

mod document;
mod live;
pub mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use office_core::shape::catalog::{self, AutoShapeKind, ConnectorKind};
use office_core::shape::search::{self, ElementQuery, ElementType, PositionQuery};
use office_core::shape::{Frame, ShapeEdit, StyleProperties};
use office_core::{Identifier, Rgb, ShapeInfo};

use crate::elements::ElementRegistry;
use crate::error::{ToolError, ToolResult};
use crate::tools::{self, arguments, payload, Schema, ToolDefinition, ToolSet};

pub use document::DocumentPowerPoint;
pub use live::LivePowerPoint;
use templates::{AppliedTemplate, CreatedSlide, TemplateInfo, TemplateOptions};

/// Layout used by `add_slide` when none is named
pub const DEFAULT_LAYOUT: &str = "Title and Content";

pub const SAVE_PATH_REQUIRED: &str =
    "save_path is required for a new presentation that hasn't been saved before.";

/// A presentation as `list_open_presentations` reports it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationSummary {
    pub name: String,
    pub path: String,
    pub slides: usize,
    pub saved: bool,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationRef {
    pub name: String,
    pub path: String,
    pub index: usize,
}

/// A slide layout; `index` is 1-based
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEntry {
    pub index: usize,
    pub name: String,
}

/// Shapes of one slide and the name of its layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideShapes {
    pub layout: Option<String>,
    pub shapes: Vec<ShapeInfo>,
}

pub fn presentation_not_found(id: &Identifier) -> ToolError {
    ToolError::not_found(format!("Presentation '{id}' not found."))
}

pub fn no_presentation() -> ToolError {
    ToolError::not_found("No presentation is open.")
}

fn document_only() -> ToolError {
    ToolError::invalid("Templates are only available with the document strategy.")
}

/// Presentation access for one strategy; slides and layouts are 1-based
pub trait PowerPointBackend: Send {
    fn list_presentations(&mut self) -> ToolResult<Vec<PresentationSummary>>;
    fn open_presentation(&mut self, path: &str) -> ToolResult<PresentationRef>;
    /// Save the identified presentation, or the current one; returns its name
    fn save_presentation(
        &mut self,
        presentation: Option<&Identifier>,
        save_path: Option<&str>,
    ) -> ToolResult<String>;
    /// Key element ids are registered under
    fn presentation_key(&mut self, presentation: &Identifier) -> ToolResult<String>;
    fn slide_count(&mut self, presentation: &Identifier) -> ToolResult<usize>;
    fn layouts(&mut self, presentation: &Identifier) -> ToolResult<Vec<LayoutEntry>>;
    /// Append a slide; returns its 1-based index
    fn add_slide(&mut self, presentation: &Identifier, layout: usize) -> ToolResult<usize>;
    fn delete_slide(&mut self, presentation: &Identifier, slide: usize) -> ToolResult<()>;
    fn slide_shapes(&mut self, presentation: &Identifier, slide: usize) -> ToolResult<SlideShapes>;
    fn add_text_box(
        &mut self,
        presentation: &Identifier,
        slide: usize,
        frame: Frame,
        text: &str,
        font_size: Option<f64>,
    ) -> ToolResult<ShapeInfo>;
    fn add_shape(
        &mut self,
        presentation: &Identifier,
        slide: usize,
        kind: &AutoShapeKind,
        frame: Frame,
    ) -> ToolResult<ShapeInfo>;
    /// Connector between the centres of two shapes
    fn add_connector(
        &mut self,
        presentation: &Identifier,
        slide: usize,
        kind: &ConnectorKind,
        from: u32,
        to: u32,
    ) -> ToolResult<ShapeInfo>;
    fn edit_shape(
        &mut self,
        presentation: &Identifier,
        slide: usize,
        shape: u32,
        edit: &ShapeEdit,
    ) -> ToolResult<ShapeInfo>;
    fn style_shape(
        &mut self,
        presentation: &Identifier,
        slide: usize,
        shape: u32,
        style: &StyleProperties,
    ) -> ToolResult<()>;
    fn set_background(&mut self, presentation: &Identifier, slide: usize, color: Rgb)
        -> ToolResult<()>;

    fn supports_templates(&self) -> bool {
        false
    }

    fn list_templates(&mut self) -> ToolResult<Vec<TemplateInfo>> {
        Err(document_only())
    }

    fn save_as_template(
        &mut self,
        _presentation: &Identifier,
        _slide: usize,
        _name: &str,
        _description: &str,
    ) -> ToolResult<TemplateInfo> {
        Err(document_only())
    }

    fn create_slide_from_template(
        &mut self,
        _presentation: &Identifier,
        _name: &str,
        _content: &Map<String, Value>,
    ) -> ToolResult<CreatedSlide> {
        Err(document_only())
    }

    fn apply_template(
        &mut self,
        _presentation: &Identifier,
        _name: &str,
        _options: &TemplateOptions,
    ) -> ToolResult<AppliedTemplate> {
        Err(document_only())
    }
}

fn default_true() -> bool {
    true
}

fn default_shape_type() -> String {
    "rectangle".to_string()
}

fn default_connector() -> String {
    "straight".to_string()
}

fn default_element_type() -> String {
    "any".to_string()
}

#[derive(Debug, Deserialize)]
struct PathArgs {
    path: String,
}

#[derive(Debug, Deserialize)]
struct UploadArgs {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct SaveArgs {
    #[serde(default)]
    identifier: Option<Identifier>,
    #[serde(default)]
    save_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PresentationArgs {
    identifier: Identifier,
}

#[derive(Debug, Deserialize)]
struct AddSlideArgs {
    identifier: Identifier,
    #[serde(default)]
    layout_index: Option<i64>,
    #[serde(default)]
    layout_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlideArgs {
    identifier: Identifier,
    slide_index: usize,
}

#[derive(Debug, Deserialize)]
struct TextBoxArgs {
    identifier: Identifier,
    slide_index: usize,
    text: String,
    #[serde(default)]
    left: Option<f64>,
    #[serde(default)]
    top: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    font_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ShapeArgs {
    identifier: Identifier,
    slide_index: usize,
    #[serde(default = "default_shape_type")]
    shape_type: String,
    #[serde(default)]
    left: Option<f64>,
    #[serde(default)]
    top: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    style_properties: Option<StyleProperties>,
}

#[derive(Debug, Deserialize)]
struct ConnectArgs {
    identifier: Identifier,
    slide_index: usize,
    from_shape: Value,
    to_shape: Value,
    #[serde(default = "default_connector")]
    connector_type: String,
    #[serde(default)]
    style_properties: Option<StyleProperties>,
}

#[derive(Debug, Deserialize)]
struct EditArgs {
    identifier: Identifier,
    slide_index: usize,
    shape_identifier: Value,
    #[serde(default)]
    properties: ShapeEdit,
}

#[derive(Debug, Deserialize)]
struct StyleArgs {
    identifier: Identifier,
    slide_index: usize,
    shape_identifier: Value,
    style_properties: StyleProperties,
}

#[derive(Debug, Deserialize)]
struct TextSearchArgs {
    identifier: Identifier,
    slide_index: usize,
    search_text: String,
    #[serde(default = "default_true")]
    partial_match: bool,
}

#[derive(Debug, Deserialize)]
struct TypeSearchArgs {
    identifier: Identifier,
    slide_index: usize,
    shape_type_name: String,
}

#[derive(Debug, Deserialize)]
struct PlaceholderArgs {
    identifier: Identifier,
    slide_index: usize,
    placeholder_name: String,
}

#[derive(Debug, Deserialize)]
struct FindElementArgs {
    identifier: Identifier,
    slide_index: usize,
    #[serde(default = "default_element_type")]
    element_type: String,
    #[serde(default)]
    search_text: Option<String>,
    #[serde(default)]
    position: Option<PositionQuery>,
}

#[derive(Debug, Deserialize)]
struct BackgroundArgs {
    identifier: Identifier,
    slide_index: usize,
    color: Value,
}

#[derive(Debug, Deserialize)]
struct SaveTemplateArgs {
    identifier: Identifier,
    slide_index: usize,
    template_name: String,
    #[serde(default)]
    template_description: String,
}

#[derive(Debug, Deserialize)]
struct FromTemplateArgs {
    identifier: Identifier,
    template_name: String,
    #[serde(default)]
    content: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ApplyTemplateArgs {
    identifier: Identifier,
    template_name: String,
    #[serde(default)]
    options: TemplateOptions,
}

/// 1-based layout for `add_slide`: a valid index, else the named layout,
/// else the first one
fn choose_layout(
    layouts: &[LayoutEntry],
    index: Option<i64>,
    name: Option<&str>,
) -> ToolResult<usize> {
    if layouts.is_empty() {
        return Err(ToolError::invalid("Presentation has no slide layouts."));
    }
    if let Some(index) = index {
        if index >= 1 && (index as usize) <= layouts.len() {
            return Ok(index as usize);
        }
        warn!("Layout index {index} invalid. Using layout 1.");
        return Ok(1);
    }
    let name = name.unwrap_or(DEFAULT_LAYOUT);
    let wanted = name.trim().to_lowercase();
    match layouts.iter().find(|l| l.name.to_lowercase() == wanted) {
        Some(layout) => Ok(layout.index),
        None => {
            warn!("Layout '{name}' not found. Using layout 1.");
            Ok(1)
        }
    }
}

fn shape_label(shape: &Value) -> String {
    match shape {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The PowerPoint tool family over one backend
pub struct PowerPointTools<B> {
    backend: B,
    elements: ElementRegistry,
    workspace: PathBuf,
}

impl<B: PowerPointBackend> PowerPointTools<B> {
    pub fn new(backend: B, workspace: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            elements: ElementRegistry::new(),
            workspace: workspace.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn check_slide(&mut self, presentation: &Identifier, slide: usize) -> ToolResult<()> {
        let count = self.backend.slide_count(presentation)?;
        if slide == 0 || slide > count {
            return Err(ToolError::invalid(format!(
                "Slide {slide} out of range. Presentation has {count} slides."
            )));
        }
        Ok(())
    }

    /// Shapes of a slide with element ids filled in
    fn shapes(&mut self, presentation: &Identifier, slide: usize) -> ToolResult<(String, SlideShapes)> {
        self.check_slide(presentation, slide)?;
        let key = self.backend.presentation_key(presentation)?;
        let mut listed = self.backend.slide_shapes(presentation, slide)?;
        self.elements.annotate(&key, slide, &mut listed.shapes);
        Ok((key, listed))
    }

    /// Shape id for a caller's shape reference: a shape id, an element id or
    /// an exact shape name
    fn resolve_shape(
        &mut self,
        presentation: &Identifier,
        slide: usize,
        shape: &Value,
    ) -> ToolResult<ShapeInfo> {
        let (key, listed) = self.shapes(presentation, slide)?;
        let by_id = |id: u32| listed.shapes.iter().find(|s| s.id == id).cloned();
        let found = match shape {
            Value::Number(n) => n.as_u64().and_then(|id| u32::try_from(id).ok()).and_then(by_id),
            Value::String(text) => {
                let text = text.trim();
                text.parse::<u32>()
                    .ok()
                    .and_then(by_id)
                    .or_else(|| {
                        self.elements
                            .shape_id(&key, slide, text)
                            .and_then(by_id)
                    })
                    .or_else(|| listed.shapes.iter().find(|s| s.name == text).cloned())
            }
            _ => None,
        };
        found.ok_or_else(|| {
            ToolError::not_found(format!(
                "Shape '{}' not found on slide {slide}.",
                shape_label(shape)
            ))
        })
    }

    fn registered(&mut self, presentation: &Identifier, slide: usize, shape: ShapeInfo) -> ToolResult<ShapeInfo> {
        let key = self.backend.presentation_key(presentation)?;
        Ok(self.elements.annotated(&key, slide, shape))
    }

    fn list_open_presentations(&mut self) -> ToolResult<Value> {
        Ok(json!({ "presentations": payload(self.backend.list_presentations()?)? }))
    }

    /// `.pptx` files in the workspace
    fn list_presentations(&mut self) -> ToolResult<Value> {
        let mut names = Vec::new();
        if self.workspace.is_dir() {
            for entry in fs::read_dir(&self.workspace)? {
                let path = entry?.path();
                if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("pptx") {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(json!({ "presentations": names }))
    }

    /// Copy a `.pptx` file into the workspace
    fn upload_presentation(&mut self, args: UploadArgs) -> ToolResult<Value> {
        let source = Path::new(&args.file_path);
        let is_pptx = source
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pptx"));
        if !is_pptx {
            return Err(ToolError::invalid("Only .pptx files are supported"));
        }
        if !source.is_file() {
            return Err(ToolError::not_found(format!("File {} not found", args.file_path)));
        }
        let name = source
            .file_name()
            .ok_or_else(|| ToolError::invalid(format!("Invalid file path '{}'", args.file_path)))?;
        fs::create_dir_all(&self.workspace)?;
        let target = self.workspace.join(name);
        fs::copy(source, &target)?;
        Ok(json!({
            "message": format!("Presentation uploaded to {}", target.display()),
            "path": target.display().to_string(),
        }))
    }

    fn open_presentation(&mut self, args: PathArgs) -> ToolResult<Value> {
        let presentation = self.backend.open_presentation(&args.path)?;
        Ok(json!({
            "message": format!("Presentation '{}' opened successfully.", presentation.name),
            "presentation": payload(presentation)?,
        }))
    }

    fn save_presentation(&mut self, args: SaveArgs) -> ToolResult<Value> {
        let name = self
            .backend
            .save_presentation(args.identifier.as_ref(), args.save_path.as_deref())?;
        Ok(json!({ "message": format!("Save command issued for presentation '{name}'.") }))
    }

    fn get_slide_count(&mut self, args: PresentationArgs) -> ToolResult<Value> {
        Ok(json!({ "count": self.backend.slide_count(&args.identifier)? }))
    }

    fn list_layouts(&mut self, args: PresentationArgs) -> ToolResult<Value> {
        Ok(json!({ "layouts": payload(self.backend.layouts(&args.identifier)?)? }))
    }

    fn add_slide(&mut self, args: AddSlideArgs) -> ToolResult<Value> {
        let layouts = self.backend.layouts(&args.identifier)?;
        let layout = choose_layout(&layouts, args.layout_index, args.layout_name.as_deref())?;
        let slide_index = self.backend.add_slide(&args.identifier, layout)?;
        Ok(json!({
            "message": "Slide added successfully.",
            "slide_index": slide_index,
        }))
    }

    fn delete_slide(&mut self, args: SlideArgs) -> ToolResult<Value> {
        self.check_slide(&args.identifier, args.slide_index)?;
        let key = self.backend.presentation_key(&args.identifier)?;
        self.backend.delete_slide(&args.identifier, args.slide_index)?;
        self.elements.slide_deleted(&key, args.slide_index);
        Ok(json!({
            "success": true,
            "message": format!("Slide {} deleted successfully.", args.slide_index),
        }))
    }

    fn list_shapes(&mut self, args: SlideArgs) -> ToolResult<Value> {
        let (_, listed) = self.shapes(&args.identifier, args.slide_index)?;
        Ok(json!({ "shapes": payload(listed.shapes)? }))
    }

    fn analyze_slide(&mut self, args: SlideArgs) -> ToolResult<Value> {
        let (_, listed) = self.shapes(&args.identifier, args.slide_index)?;
        let content = search::analyze_slide(listed.layout, &listed.shapes);
        Ok(json!({ "content": payload(content)? }))
    }

    fn add_text_box(&mut self, args: TextBoxArgs) -> ToolResult<Value> {
        self.check_slide(&args.identifier, args.slide_index)?;
        let frame = Frame::new(
            args.left.unwrap_or(72.0),
            args.top.unwrap_or(72.0),
            args.width.unwrap_or(288.0),
            args.height.unwrap_or(72.0),
        );
        let shape = self.backend.add_text_box(
            &args.identifier,
            args.slide_index,
            frame,
            &args.text,
            args.font_size,
        )?;
        let shape = self.registered(&args.identifier, args.slide_index, shape)?;
        Ok(json!({
            "message": "Text box added successfully.",
            "shape_id": shape.id,
            "element_id": shape.element_id,
        }))
    }

    fn add_shape(&mut self, args: ShapeArgs) -> ToolResult<Value> {
        self.check_slide(&args.identifier, args.slide_index)?;
        let kind = catalog::auto_shape(&args.shape_type)?;
        let frame = Frame::new(
            args.left.unwrap_or(72.0),
            args.top.unwrap_or(150.0),
            args.width.unwrap_or(144.0),
            args.height.unwrap_or(72.0),
        );
        let shape = self
            .backend
            .add_shape(&args.identifier, args.slide_index, kind, frame)?;
        if let Some(style) = args.style_properties.filter(|s| !s.is_empty()) {
            self.backend
                .style_shape(&args.identifier, args.slide_index, shape.id, &style)?;
        }
        let shape = self.registered(&args.identifier, args.slide_index, shape)?;
        Ok(json!({
            "message": format!("Shape '{}' added successfully.", kind.name),
            "shape_id": shape.id,
            "element_id": shape.element_id,
        }))
    }

    fn connect_shapes(&mut self, args: ConnectArgs) -> ToolResult<Value> {
        let kind = catalog::connector(&args.connector_type)?;
        let from = self.resolve_shape(&args.identifier, args.slide_index, &args.from_shape)?;
        let to = self.resolve_shape(&args.identifier, args.slide_index, &args.to_shape)?;
        let connector = self.backend.add_connector(
            &args.identifier,
            args.slide_index,
            kind,
            from.id,
            to.id,
        )?;
        if let Some(style) = args.style_properties.filter(|s| !s.is_empty()) {
            self.backend
                .style_shape(&args.identifier, args.slide_index, connector.id, &style)?;
        }
        let connector = self.registered(&args.identifier, args.slide_index, connector)?;
        Ok(json!({
            "message": format!("Connector added between '{}' and '{}'.", from.name, to.name),
            "connector_id": connector.id,
            "element_id": connector.element_id,
        }))
    }

    fn edit_element(&mut self, args: EditArgs) -> ToolResult<Value> {
        let shape = self.resolve_shape(&args.identifier, args.slide_index, &args.shape_identifier)?;
        let updated = self.backend.edit_shape(
            &args.identifier,
            args.slide_index,
            shape.id,
            &args.properties,
        )?;
        let updated = self.registered(&args.identifier, args.slide_index, updated)?;
        Ok(json!({
            "message": format!(
                "Element '{}' updated successfully.",
                shape_label(&args.shape_identifier)
            ),
            "properties": payload(updated)?,
        }))
    }

    fn style_element(&mut self, args: StyleArgs) -> ToolResult<Value> {
        if args.style_properties.is_empty() {
            return Err(ToolError::invalid(
                "style_properties must set at least one of font, fill or line.",
            ));
        }
        args.style_properties.validate()?;
        let shape = self.resolve_shape(&args.identifier, args.slide_index, &args.shape_identifier)?;
        self.backend.style_shape(
            &args.identifier,
            args.slide_index,
            shape.id,
            &args.style_properties,
        )?;
        Ok(json!({
            "success": true,
            "message": format!(
                "Style applied to element '{}'.",
                shape_label(&args.shape_identifier)
            ),
        }))
    }

    fn find_shape_by_text(&mut self, args: TextSearchArgs) -> ToolResult<Value> {
        let (_, listed) = self.shapes(&args.identifier, args.slide_index)?;
        let found = search::find_by_text(&listed.shapes, &args.search_text, args.partial_match);
        Ok(json!({ "shapes": payload(found)? }))
    }

    fn find_shapes_by_type(&mut self, args: TypeSearchArgs) -> ToolResult<Value> {
        let (_, listed) = self.shapes(&args.identifier, args.slide_index)?;
        let found = search::find_by_type(&listed.shapes, &args.shape_type_name)?;
        Ok(json!({ "shapes": payload(found)? }))
    }

    fn get_placeholder_shape(&mut self, args: PlaceholderArgs) -> ToolResult<Value> {
        let (_, listed) = self.shapes(&args.identifier, args.slide_index)?;
        match search::find_placeholder(&listed.shapes, &args.placeholder_name)? {
            Some(shape) => Ok(json!({
                "placeholder_found": true,
                "shape_info": payload(shape)?,
            })),
            None => Ok(json!({
                "placeholder_found": false,
                "message": format!(
                    "Placeholder '{}' not found on slide {}.",
                    args.placeholder_name, args.slide_index
                ),
            })),
        }
    }

    fn find_element(&mut self, args: FindElementArgs) -> ToolResult<Value> {
        let query = ElementQuery {
            element_type: ElementType::parse(&args.element_type)?,
            search_text: args.search_text,
            position: args.position,
        };
        let (_, listed) = self.shapes(&args.identifier, args.slide_index)?;
        let found = search::find_elements(&listed.shapes, &query);
        Ok(json!({ "elements": payload(found)? }))
    }

    fn set_background_color(&mut self, args: BackgroundArgs) -> ToolResult<Value> {
        let color = Rgb::from_json(&args.color)?;
        self.check_slide(&args.identifier, args.slide_index)?;
        self.backend
            .set_background(&args.identifier, args.slide_index, color)?;
        Ok(json!({
            "success": true,
            "message": format!(
                "Background color of slide {} set to {color}.",
                args.slide_index
            ),
        }))
    }

    fn debug_element_mappings(&mut self, args: SlideArgs) -> ToolResult<Value> {
        let key = self.backend.presentation_key(&args.identifier)?;
        let mappings = self
            .elements
            .mappings(&key, args.slide_index)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                ToolError::not_found(format!(
                    "No elements registered for slide {}",
                    args.slide_index
                ))
            })?;
        let mappings: Map<String, Value> = mappings
            .iter()
            .map(|(shape, element)| (shape.to_string(), Value::String(element.clone())))
            .collect();
        Ok(json!({
            "presentation": key,
            "slide": args.slide_index,
            "mappings": mappings,
        }))
    }

    fn list_templates(&mut self) -> ToolResult<Value> {
        Ok(json!({ "templates": payload(self.backend.list_templates()?)? }))
    }

    fn save_as_template(&mut self, args: SaveTemplateArgs) -> ToolResult<Value> {
        self.check_slide(&args.identifier, args.slide_index)?;
        let info = self.backend.save_as_template(
            &args.identifier,
            args.slide_index,
            &args.template_name,
            &args.template_description,
        )?;
        Ok(json!({
            "message": format!("Template '{}' saved successfully.", info.name),
            "template_info": payload(info)?,
        }))
    }

    fn create_slide_from_template(&mut self, args: FromTemplateArgs) -> ToolResult<Value> {
        let created = self.backend.create_slide_from_template(
            &args.identifier,
            &args.template_name,
            &args.content,
        )?;
        Ok(json!({
            "message": format!(
                "Slide created from template '{}'.",
                args.template_name
            ),
            "slide_index": created.slide_index,
            "populated_placeholders": created.populated_placeholders,
        }))
    }

    fn apply_template(&mut self, args: ApplyTemplateArgs) -> ToolResult<Value> {
        let applied =
            self.backend
                .apply_template(&args.identifier, &args.template_name, &args.options)?;
        Ok(json!({ "applied": payload(applied)? }))
    }
}

fn presentation_schema() -> Schema {
    Schema::new().required(
        "identifier",
        tools::identifier("Presentation name, full path, or 1-based index"),
    )
}

fn slide_schema() -> Schema {
    presentation_schema().required("slide_index", tools::integer("1-based slide number"))
}

fn shape_identifier(description: &str) -> Value {
    tools::identifier(description)
}

fn style_schema() -> Value {
    tools::object("Optional {font, fill, line} styling")
}

impl<B: PowerPointBackend> ToolSet for PowerPointTools<B> {
    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = vec![
            ToolDefinition::new(
                "list_open_presentations",
                "List the open presentations with their 1-based index",
                Schema::new().build(),
            ),
            ToolDefinition::new(
                "list_presentations",
                "List the .pptx files in the workspace",
                Schema::new().build(),
            ),
            ToolDefinition::new(
                "upload_presentation",
                "Copy a .pptx file into the workspace",
                Schema::new()
                    .required("file_path", tools::string("Path of the .pptx file"))
                    .build(),
            ),
            ToolDefinition::new(
                "open_presentation",
                "Open a presentation file",
                Schema::new()
                    .required("path", tools::string("Path of the presentation"))
                    .build(),
            ),
            ToolDefinition::new(
                "save_presentation",
                "Save a presentation (the current one if no identifier is given)",
                Schema::new()
                    .optional(
                        "identifier",
                        tools::identifier("Presentation name, full path, or 1-based index"),
                    )
                    .optional("save_path", tools::string("Target path; required for a new presentation"))
                    .build(),
            ),
            ToolDefinition::new(
                "get_slide_count",
                "Number of slides",
                presentation_schema().build(),
            ),
            ToolDefinition::new(
                "list_layouts",
                "List the slide layouts with their 1-based index",
                presentation_schema().build(),
            ),
            ToolDefinition::new(
                "add_slide",
                "Append a slide by layout index or name",
                presentation_schema()
                    .optional("layout_index", tools::integer("1-based layout index"))
                    .optional(
                        "layout_name",
                        tools::string("Layout name (default \"Title and Content\")"),
                    )
                    .build(),
            ),
            ToolDefinition::new("delete_slide", "Delete a slide", slide_schema().build()),
            ToolDefinition::new(
                "list_shapes",
                "List the shapes of a slide with their element ids",
                slide_schema().build(),
            ),
            ToolDefinition::new(
                "analyze_slide",
                "Group a slide's shapes into text boxes, images, shapes, charts and tables",
                slide_schema().build(),
            ),
            ToolDefinition::new(
                "add_text_box",
                "Add a text box; geometry in points",
                slide_schema()
                    .required("text", tools::string("Text of the box"))
                    .optional("left", tools::number("Left edge (default 72)"))
                    .optional("top", tools::number("Top edge (default 72)"))
                    .optional("width", tools::number("Width (default 288)"))
                    .optional("height", tools::number("Height (default 72)"))
                    .optional("font_size", tools::number("Font size in points"))
                    .build(),
            ),
            ToolDefinition::new(
                "add_shape",
                "Add an auto-shape; geometry in points",
                slide_schema()
                    .optional("shape_type", tools::string("Shape type (default rectangle)"))
                    .optional("left", tools::number("Left edge (default 72)"))
                    .optional("top", tools::number("Top edge (default 150)"))
                    .optional("width", tools::number("Width (default 144)"))
                    .optional("height", tools::number("Height (default 72)"))
                    .optional("style_properties", style_schema())
                    .build(),
            ),
            ToolDefinition::new(
                "add_rectangle",
                "Add a rectangle; geometry in points",
                slide_schema()
                    .optional("left", tools::number("Left edge (default 72)"))
                    .optional("top", tools::number("Top edge (default 150)"))
                    .optional("width", tools::number("Width (default 144)"))
                    .optional("height", tools::number("Height (default 72)"))
                    .optional("style_properties", style_schema())
                    .build(),
            ),
            ToolDefinition::new(
                "connect_shapes",
                "Draw a connector between the centres of two shapes",
                slide_schema()
                    .required("from_shape", shape_identifier("Shape id, element id or name"))
                    .required("to_shape", shape_identifier("Shape id, element id or name"))
                    .optional(
                        "connector_type",
                        tools::string("straight, elbow or curved (default straight)"),
                    )
                    .optional("style_properties", style_schema())
                    .build(),
            ),
            ToolDefinition::new(
                "edit_element",
                "Change a shape's text, geometry, name or rotation",
                slide_schema()
                    .required("shape_identifier", shape_identifier("Shape id, element id or name"))
                    .required(
                        "properties",
                        tools::object("Any of text, left, top, width, height, name, rotation"),
                    )
                    .build(),
            ),
            ToolDefinition::new(
                "style_element",
                "Apply font, fill and line styling to a shape",
                slide_schema()
                    .required("shape_identifier", shape_identifier("Shape id, element id or name"))
                    .required("style_properties", tools::object("{font, fill, line}"))
                    .build(),
            ),
            ToolDefinition::new(
                "find_shape_by_text",
                "Find shapes by their text, ignoring case",
                slide_schema()
                    .required("search_text", tools::string("Text to look for"))
                    .optional(
                        "partial_match",
                        tools::boolean("Match substrings (default true)"),
                    )
                    .build(),
            ),
            ToolDefinition::new(
                "find_shapes_by_type",
                "Find shapes of a type such as textbox, picture or rectangle",
                slide_schema()
                    .required("shape_type_name", tools::string("Shape type name"))
                    .build(),
            ),
            ToolDefinition::new(
                "get_placeholder_shape",
                "Find a placeholder such as title or body",
                slide_schema()
                    .required("placeholder_name", tools::string("Placeholder name"))
                    .build(),
            ),
            ToolDefinition::new(
                "find_element",
                "Find elements by type, text and position, best match first",
                slide_schema()
                    .optional(
                        "element_type",
                        tools::string("any, text, image, chart, table or shape (default any)"),
                    )
                    .optional("search_text", tools::string("Text to match"))
                    .optional(
                        "position",
                        tools::object("{x, y, proximity} in points; proximity defaults to 72"),
                    )
                    .build(),
            ),
            ToolDefinition::new(
                "set_background_color",
                "Set a slide's background to a solid colour",
                slide_schema()
                    .required(
                        "color",
                        json!({
                            "type": ["string", "array"],
                            "description": "#RRGGBB, RRGGBB or [r, g, b]",
                        }),
                    )
                    .build(),
            ),
            ToolDefinition::new(
                "debug_element_mappings",
                "Show the shape id to element id mappings issued for a slide",
                slide_schema().build(),
            ),
        ];
        if self.backend.supports_templates() {
            definitions.extend([
                ToolDefinition::new(
                    "list_templates",
                    "List the saved slide templates",
                    Schema::new().build(),
                ),
                ToolDefinition::new(
                    "save_as_template",
                    "Save one slide as a reusable template",
                    slide_schema()
                        .required("template_name", tools::string("Template name"))
                        .optional("template_description", tools::string("Description"))
                        .build(),
                ),
                ToolDefinition::new(
                    "create_slide_from_template",
                    "Append a slide from a template, filling placeholders from content",
                    presentation_schema()
                        .required("template_name", tools::string("Template name"))
                        .optional(
                            "content",
                            tools::object("Placeholder name to text, e.g. {\"title\": \"...\"}"),
                        )
                        .build(),
                ),
                ToolDefinition::new(
                    "apply_template",
                    "Apply a template's theme to a presentation",
                    presentation_schema()
                        .required("template_name", tools::string("Template name"))
                        .optional(
                            "options",
                            tools::object("{apply_master, apply_theme, apply_layouts}, all default true"),
                        )
                        .build(),
                ),
            ]);
        }
        definitions
    }

    fn call(&mut self, name: &str, args: Value) -> ToolResult<Value> {
        match name {
            "list_open_presentations" => self.list_open_presentations(),
            "list_presentations" => self.list_presentations(),
            "upload_presentation" => self.upload_presentation(arguments(args)?),
            "open_presentation" => self.open_presentation(arguments(args)?),
            "save_presentation" => self.save_presentation(arguments(args)?),
            "get_slide_count" => self.get_slide_count(arguments(args)?),
            "list_layouts" => self.list_layouts(arguments(args)?),
            "add_slide" => self.add_slide(arguments(args)?),
            "delete_slide" => self.delete_slide(arguments(args)?),
            "list_shapes" => self.list_shapes(arguments(args)?),
            "analyze_slide" => self.analyze_slide(arguments(args)?),
            "add_text_box" => self.add_text_box(arguments(args)?),
            "add_shape" => self.add_shape(arguments(args)?),
            "add_rectangle" => {
                let mut args: ShapeArgs = arguments(args)?;
                args.shape_type = default_shape_type();
                self.add_shape(args)
            }
            "connect_shapes" => self.connect_shapes(arguments(args)?),
            "edit_element" => self.edit_element(arguments(args)?),
            "style_element" => self.style_element(arguments(args)?),
            "find_shape_by_text" => self.find_shape_by_text(arguments(args)?),
            "find_shapes_by_type" => self.find_shapes_by_type(arguments(args)?),
            "get_placeholder_shape" => self.get_placeholder_shape(arguments(args)?),
            "find_element" => self.find_element(arguments(args)?),
            "set_background_color" => self.set_background_color(arguments(args)?),
            "debug_element_mappings" => self.debug_element_mappings(arguments(args)?),
            "list_templates" => self.list_templates(),
            "save_as_template" => self.save_as_template(arguments(args)?),
            "create_slide_from_template" => self.create_slide_from_template(arguments(args)?),
            "apply_template" => self.apply_template(arguments(args)?),
            other => Err(tools::unknown_tool(other)),
        }
    }
}
