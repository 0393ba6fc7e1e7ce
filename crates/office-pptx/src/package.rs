//! The zip container: every part kept as bytes, keyed by part name

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use log::debug;

use crate::error::{PptxError, PptxResult};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";

/// All parts of an OPC package. Part names carry no leading `/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R: Read + Seek>(reader: R) -> PptxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            parts.insert(name, bytes);
        }
        if !parts.contains_key(CONTENT_TYPES_PART) {
            return Err(PptxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }
        debug!("read package with {} part(s)", parts.len());
        Ok(Self { parts })
    }

    /// Write the content types and root relationships first, then the rest
    /// in name order
    pub fn write<W: Write + Seek>(&self, writer: W) -> PptxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let leading = [CONTENT_TYPES_PART, ROOT_RELS_PART];
        for name in leading {
            if let Some(bytes) = self.parts.get(name) {
                zip.start_file(name, options)?;
                zip.write_all(bytes)?;
            }
        }
        for (name, bytes) in &self.parts {
            if leading.contains(&name.as_str()) {
                continue;
            }
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        zip.finish()?;
        Ok(())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> PptxResult<&[u8]> {
        self.part(name)
            .ok_or_else(|| PptxError::MissingPart(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn set_part(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.parts.insert(name.into(), bytes);
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// First `<dir>/<stem><n>.<ext>` name not in use, counting from 1
    pub fn next_part_name(&self, dir: &str, stem: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{dir}/{stem}{n}.{ext}"))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| format!("{dir}/{stem}.{ext}"))
    }
}

/// Relationships part belonging to `part`
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn directory_of(part: &str) -> &str {
    part.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolve a relationship target against the part that owns the relationship
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = directory_of(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relative target from `source_part` to `target_part`
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let from: Vec<&str> = directory_of(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = target_part.split('/').collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut segments: Vec<&str> = vec![".."; from.len() - common];
    segments.extend(&to[common..]);
    segments.join("/")
}
