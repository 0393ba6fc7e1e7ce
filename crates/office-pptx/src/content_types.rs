//! `[Content_Types].xml`

use crate::error::PptxResult;
use crate::xml::{self, XmlElement};

const TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// (extension, content type)
    defaults: Vec<(String, String)>,
    /// (part name without leading `/`, content type)
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn parse(bytes: &[u8]) -> PptxResult<Self> {
        let root = xml::parse(bytes)?;
        let mut types = Self::default();
        for e in root.elements() {
            let Some(content_type) = e.attr("ContentType") else {
                continue;
            };
            if e.is("Default") {
                if let Some(ext) = e.attr("Extension") {
                    types.defaults.push((ext.to_lowercase(), content_type.to_string()));
                }
            } else if e.is("Override") {
                if let Some(part) = e.attr("PartName") {
                    let part = part.trim_start_matches('/').to_string();
                    types.overrides.push((part, content_type.to_string()));
                }
            }
        }
        Ok(types)
    }

    pub fn to_xml(&self) -> Vec<u8> {
        let mut root = XmlElement::new("Types").with_attr("xmlns", TYPES_NS);
        for (ext, content_type) in &self.defaults {
            root = root.with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", ext.as_str())
                    .with_attr("ContentType", content_type.as_str()),
            );
        }
        for (part, content_type) in &self.overrides {
            root = root.with_child(
                XmlElement::new("Override")
                    .with_attr("PartName", format!("/{part}"))
                    .with_attr("ContentType", content_type.as_str()),
            );
        }
        xml::to_part(&root)
    }

    pub fn add_default(&mut self, ext: &str, content_type: &str) {
        let ext = ext.to_lowercase();
        if !self.defaults.iter().any(|(e, _)| *e == ext) {
            self.defaults.push((ext, content_type.to_string()));
        }
    }

    pub fn set_override(&mut self, part: &str, content_type: &str) {
        match self.overrides.iter_mut().find(|(p, _)| p == part) {
            Some((_, ct)) => *ct = content_type.to_string(),
            None => self
                .overrides
                .push((part.to_string(), content_type.to_string())),
        }
    }

    pub fn remove_override(&mut self, part: &str) {
        self.overrides.retain(|(p, _)| p != part);
    }

    /// Content type of a part: its override, else the default for its extension
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        if let Some((_, ct)) = self.overrides.iter().find(|(p, _)| p == part) {
            return Some(ct);
        }
        let ext = part.rsplit_once('.')?.1.to_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_and_defaults() {
        let src = br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="XML" ContentType="application/xml"/>
  <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
</Types>"#;
        let mut types = ContentTypes::parse(src).unwrap();
        assert_eq!(types.content_type_of("ppt/slides/slide1.xml"), Some(CT_SLIDE));
        assert_eq!(types.content_type_of("docProps/app.xml"), Some("application/xml"));

        types.set_override("ppt/slides/slide2.xml", CT_SLIDE);
        types.remove_override("ppt/slides/slide1.xml");
        types.add_default("png", "image/png");

        let back = ContentTypes::parse(&types.to_xml()).unwrap();
        assert_eq!(back, types);
        assert_eq!(back.content_type_of("ppt/slides/slide1.xml"), Some("application/xml"));
        assert_eq!(back.content_type_of("ppt/media/a.PNG"), Some("image/png"));
    }
}
