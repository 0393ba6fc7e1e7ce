//! Slide templates kept as `.pptx` files (plus a `.json` metadata sidecar) in
//! the workspace's `templates/` directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use office_pptx::Presentation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ToolError, ToolResult};

/// A template as `list_templates` reports it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    /// Relative to the workspace
    pub path: String,
    pub metadata: Value,
}

/// Sidecar written by `save_as_template`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub description: String,
    pub created_from: String,
    pub slide_index: usize,
    pub created_date: String,
}

impl TemplateMetadata {
    pub fn new(description: &str, created_from: &str, slide_index: usize) -> Self {
        Self {
            description: description.to_string(),
            created_from: created_from.to_string(),
            slide_index,
            created_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn yes() -> bool {
    true
}

/// What `apply_template` copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TemplateOptions {
    #[serde(default = "yes")]
    pub apply_master: bool,
    #[serde(default = "yes")]
    pub apply_theme: bool,
    #[serde(default = "yes")]
    pub apply_layouts: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            apply_master: true,
            apply_theme: true,
            apply_layouts: true,
        }
    }
}

/// What `apply_template` changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppliedTemplate {
    /// Slide masters are never replaced, only the master's theme
    pub master_slides: bool,
    pub theme: bool,
    /// Template layouts the presentation has by the same name
    pub layouts: Vec<String>,
}

/// Result of `create_slide_from_template`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedSlide {
    /// 1-based
    pub slide_index: usize,
    pub populated_placeholders: Vec<String>,
}

pub struct TemplateLibrary {
    workspace: PathBuf,
    dir: PathBuf,
}

fn check_name(name: &str) -> ToolResult<()> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name == "..";
    if invalid {
        return Err(ToolError::invalid(format!("Invalid template name '{name}'")));
    }
    Ok(())
}

impl TemplateLibrary {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let dir = workspace.join("templates");
        Self { workspace, dir }
    }

    fn package_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.pptx"))
    }

    fn metadata_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.workspace)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Metadata sidecar, or `{}` when it is missing or unreadable
    fn metadata(&self, name: &str) -> Value {
        fs::read_to_string(self.metadata_path(name))
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Every template, by name
    pub fn list(&self) -> ToolResult<Vec<TemplateInfo>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut templates = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pptx") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            templates.push(TemplateInfo {
                name: name.to_string(),
                path: self.relative(&path),
                metadata: self.metadata(name),
            });
        }
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    pub fn save(
        &self,
        name: &str,
        template: &Presentation,
        metadata: &TemplateMetadata,
    ) -> ToolResult<TemplateInfo> {
        check_name(name)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.package_path(name);
        template.save(&path)?;
        let metadata = serde_json::to_value(metadata).map_err(|e| ToolError::Backend(e.to_string()))?;
        let text = serde_json::to_string_pretty(&metadata).map_err(|e| ToolError::Backend(e.to_string()))?;
        fs::write(self.metadata_path(name), text)?;
        info!("saved template '{name}' to {}", path.display());
        Ok(TemplateInfo {
            name: name.to_string(),
            path: self.relative(&path),
            metadata,
        })
    }

    pub fn load(&self, name: &str) -> ToolResult<Presentation> {
        check_name(name)?;
        let path = self.package_path(name);
        if !path.is_file() {
            return Err(ToolError::not_found(format!("Template '{name}' not found")));
        }
        Ok(Presentation::open(&path)?)
    }
}

/// The content key that fills a placeholder: an exact placeholder-type match
/// first, then one containing (or contained in) the type name
fn content_key<'a>(placeholder: &str, keys: &[&'a String], used: &[String]) -> Option<&'a String> {
    let placeholder = placeholder.to_lowercase();
    keys.iter()
        .find(|k| k.to_lowercase() == placeholder)
        .or_else(|| {
            keys.iter().find(|k| {
                let key = k.to_lowercase();
                !used.contains(*k) && (placeholder.contains(&key) || key.contains(&placeholder))
            })
        })
        .copied()
}

/// Write `content` values into the matching placeholders of a slide (0-based);
/// returns the keys that were used
pub fn populate_placeholders(
    presentation: &mut Presentation,
    slide: usize,
    content: &Map<String, Value>,
) -> ToolResult<Vec<String>> {
    let keys: Vec<&String> = content.keys().collect();
    let mut used: Vec<String> = Vec::new();
    for shape in presentation.shapes(slide)? {
        let Some(kind) = shape.placeholder_type_name.as_deref() else {
            continue;
        };
        let Some(key) = content_key(kind, &keys, &used) else {
            continue;
        };
        if !presentation.shape_kind(slide, shape.id)?.supports_text() {
            continue;
        }
        let text = match &content[key.as_str()] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        presentation.set_text(slide, shape.id, &text)?;
        debug!("filled {kind} placeholder {} from '{key}'", shape.id);
        if !used.contains(key) {
            used.push(key.clone());
        }
    }
    Ok(used)
}

/// Append a slide modelled on the template's first slide; its layout is
/// matched by name, falling back to the first layout
pub fn slide_from_template(
    target: &mut Presentation,
    template: &Presentation,
    template_name: &str,
    content: &Map<String, Value>,
) -> ToolResult<CreatedSlide> {
    if template.slide_count() == 0 {
        return Err(ToolError::invalid(format!(
            "Template '{template_name}' has no slides"
        )));
    }
    let layout = template
        .layout_name(0)?
        .and_then(|name| target.layout_index(&name))
        .unwrap_or(0);
    let slide = target.add_slide(layout)?;
    let populated_placeholders = populate_placeholders(target, slide, content)?;
    Ok(CreatedSlide {
        slide_index: slide + 1,
        populated_placeholders,
    })
}

/// Copy the template's theme into `target` and report the shared layouts
pub fn apply_template(
    target: &mut Presentation,
    template: &Presentation,
    options: &TemplateOptions,
) -> ToolResult<AppliedTemplate> {
    let mut applied = AppliedTemplate::default();
    if options.apply_theme {
        if let Some(theme) = template.theme() {
            target.set_theme(theme.to_vec())?;
            applied.theme = true;
        }
    }
    if options.apply_layouts {
        applied.layouts = template
            .layouts()
            .into_iter()
            .filter(|l| target.layout_index(&l.name).is_some())
            .map(|l| l.name)
            .collect();
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use office_core::shape::Frame;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn deck_with_title_slide() -> Presentation {
        let mut deck = Presentation::new().unwrap();
        let layout = deck.layout_index("Title Slide").unwrap();
        deck.add_slide(layout).unwrap();
        deck
    }

    #[test]
    fn test_save_list_load() {
        let dir = tempfile::tempdir().unwrap();
        let library = TemplateLibrary::new(dir.path());
        assert!(library.list().unwrap().is_empty());

        let deck = deck_with_title_slide();
        let metadata = TemplateMetadata::new("Cover page", "deck.pptx", 1);
        let saved = library.save("cover", &deck, &metadata).unwrap();
        assert_eq!(saved.path, "templates/cover.pptx");
        assert_eq!(saved.metadata["description"], "Cover page");

        let listed = library.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "cover");
        assert_eq!(listed[0].metadata["slide_index"], 1);

        assert_eq!(library.load("cover").unwrap().slide_count(), 1);
        let err = library.load("missing").unwrap_err();
        assert_eq!(err.to_string(), "Template 'missing' not found");
        assert!(library.save("../escape", &deck, &metadata).is_err());
    }

    #[test]
    fn test_template_without_metadata_lists_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let library = TemplateLibrary::new(dir.path());
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        deck_with_title_slide()
            .save(dir.path().join("templates/plain.pptx"))
            .unwrap();
        let listed = library.list().unwrap();
        assert_eq!(listed[0].metadata, json!({}));
    }

    #[test]
    fn test_slide_from_template_fills_placeholders() {
        let template = deck_with_title_slide();
        let mut target = Presentation::new().unwrap();
        let content = json!({"title": "Quarterly review", "subtitle": "Q3 2024"});
        let created = slide_from_template(
            &mut target,
            &template,
            "cover",
            content.as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(created.slide_index, 1);
        assert_eq!(target.layout_name(0).unwrap().as_deref(), Some("Title Slide"));

        let texts: Vec<String> = target
            .shapes(0)
            .unwrap()
            .into_iter()
            .filter_map(|s| s.text)
            .collect();
        assert!(texts.contains(&"Quarterly review".to_string()));
        assert!(texts.contains(&"Q3 2024".to_string()));
        let mut populated = created.populated_placeholders;
        populated.sort();
        assert_eq!(populated, vec!["subtitle", "title"]);
    }

    #[test]
    fn test_empty_template_is_rejected() {
        let template = Presentation::new().unwrap();
        let mut target = Presentation::new().unwrap();
        let err = slide_from_template(&mut target, &template, "blank", &Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "Template 'blank' has no slides");
    }

    #[test]
    fn test_apply_template() {
        let template = Presentation::new().unwrap();
        let mut target = Presentation::new().unwrap();
        target.add_slide(0).unwrap();
        target
            .add_text_box(0, Frame::new(72.0, 72.0, 288.0, 72.0), "kept")
            .unwrap();

        let applied = apply_template(&mut target, &template, &TemplateOptions::default()).unwrap();
        assert!(applied.theme);
        assert!(!applied.master_slides);
        assert_eq!(
            applied.layouts,
            vec!["Title Slide", "Title and Content", "Title Only", "Blank"]
        );

        let options: TemplateOptions = serde_json::from_value(json!({"apply_theme": false})).unwrap();
        let applied = apply_template(&mut target, &template, &options).unwrap();
        assert!(!applied.theme);
        assert_eq!(applied.layouts.len(), 4);
    }
}
