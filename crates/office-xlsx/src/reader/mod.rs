//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::document::{PreservedParts, XlsxDocument};
use crate::error::{XlsxError, XlsxResult};
use office_core::{
    Cell, CellAddress, CellValue, SharedFormula, SheetVisibility, Workbook, Worksheet,
};

pub(crate) const STYLES_PART: &str = "xl/styles.xml";
pub(crate) const THEME_PART: &str = "xl/theme/theme1.xml";

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode characters XML cannot carry directly:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

/// A `<sheet>` entry of the workbook part
struct SheetEntry {
    name: String,
    r_id: String,
    visibility: SheetVisibility,
}

/// The `<f>` element of the cell being read
#[derive(Default)]
struct FormulaState {
    text: String,
    shared_index: Option<u32>,
    shared_ref: Option<String>,
}

/// Everything collected for one `<c>` element
#[derive(Default)]
struct CellState {
    reference: Option<String>,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    inline: Option<String>,
    formula: Option<FormulaState>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a document from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<XlsxDocument> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a document from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<XlsxDocument> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let sheet_entries = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        for entry in sheet_entries {
            let Some(path) = sheet_paths.get(&entry.r_id) else {
                warn!("sheet '{}' has no worksheet relationship, skipping", entry.name);
                continue;
            };
            let mut worksheet = Worksheet::new(entry.name.as_str());
            worksheet.set_visibility(entry.visibility);
            Self::read_worksheet(&mut archive, path, &mut worksheet, &shared_strings)?;
            workbook.push_worksheet(worksheet)?;
        }

        // Ensure at least one sheet exists
        if workbook.is_empty() {
            workbook.add_worksheet(None)?;
        }

        let preserved = PreservedParts {
            styles: Self::read_part_bytes(&mut archive, STYLES_PART)?,
            theme: Self::read_part_bytes(&mut archive, THEME_PART)?,
        };
        debug!(
            "read workbook with {} sheet(s), {} shared string(s)",
            workbook.sheet_count(),
            shared_strings.len()
        );

        Ok(XlsxDocument {
            workbook,
            preserved,
        })
    }

    fn read_part_bytes<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        name: &str,
    ) -> XlsxResult<Option<Vec<u8>>> {
        let mut file = match archive.by_name(name) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    /// Read the shared strings table; rich-text runs are concatenated and
    /// phonetic runs skipped.
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names, visibility and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SheetEntry>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                    let name = attr_value(&e, b"name");
                    let r_id = attr_value(&e, b"r:id");
                    let visibility = attr_value(&e, b"state")
                        .map(|s| SheetVisibility::from_state(&s))
                        .unwrap_or_default();
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push(SheetEntry {
                            name,
                            r_id,
                            visibility,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get worksheet part paths by rId
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to the xl/ folder unless absolute
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{target}"),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet's `<sheetData>` into `worksheet`
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));

        let mut buf = Vec::new();
        let mut cell: Option<CellState> = None;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_text = false;

        // Position for cells that omit their `r` attribute
        let mut row: u32 = 0;
        let mut next_col: u16 = 0;

        // Shared-formula anchors by group index
        let mut shared_anchors: HashMap<u32, String> = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"row" => {
                        if let Some(r) = attr_value(&e, b"r").and_then(|r| r.parse::<u32>().ok()) {
                            row = r.saturating_sub(1);
                        }
                        next_col = 0;
                    }
                    b"c" => cell = Some(Self::start_cell(&e)),
                    b"v" if cell.is_some() => in_value = true,
                    b"f" => {
                        if let Some(state) = cell.as_mut() {
                            state.formula = Some(Self::start_formula(&e));
                            in_formula = true;
                        }
                    }
                    b"t" => {
                        if let Some(state) = cell.as_mut() {
                            state.inline.get_or_insert_with(String::new);
                            in_inline_text = true;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"c" => {
                        let state = Self::start_cell(&e);
                        let addr = Self::cell_position(&state, row, next_col)?;
                        next_col = addr.col.saturating_add(1);
                        Self::process_cell(worksheet, addr, state, shared_strings, &mut shared_anchors)?;
                    }
                    b"f" => {
                        if let Some(state) = cell.as_mut() {
                            state.formula = Some(Self::start_formula(&e));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(state) = cell.as_mut() {
                        if in_value {
                            state.value.get_or_insert_with(String::new).push_str(&e.unescape()?);
                        } else if in_formula {
                            if let Some(f) = state.formula.as_mut() {
                                f.text.push_str(&e.unescape()?);
                            }
                        } else if in_inline_text {
                            if let Some(inline) = state.inline.as_mut() {
                                inline.push_str(&e.unescape()?);
                            }
                        }
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"t" => in_inline_text = false,
                    b"c" => {
                        if let Some(state) = cell.take() {
                            let addr = Self::cell_position(&state, row, next_col)?;
                            next_col = addr.col.saturating_add(1);
                            Self::process_cell(worksheet, addr, state, shared_strings, &mut shared_anchors)?;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Self::fill_shared_formula_text(worksheet, &shared_anchors);
        Ok(())
    }

    fn start_cell(e: &BytesStart) -> CellState {
        CellState {
            reference: attr_value(e, b"r"),
            cell_type: attr_value(e, b"t"),
            style: attr_value(e, b"s")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            ..CellState::default()
        }
    }

    fn start_formula(e: &BytesStart) -> FormulaState {
        let shared = attr_value(e, b"t").as_deref() == Some("shared");
        FormulaState {
            text: String::new(),
            shared_index: if shared {
                attr_value(e, b"si").and_then(|s| s.parse().ok())
            } else {
                None
            },
            shared_ref: if shared { attr_value(e, b"ref") } else { None },
        }
    }

    fn cell_position(state: &CellState, row: u32, next_col: u16) -> XlsxResult<CellAddress> {
        match &state.reference {
            Some(r) => CellAddress::parse(r).map_err(|e| {
                XlsxError::Parse(format!("Invalid cell reference '{r}': {e}"))
            }),
            None => Ok(CellAddress::new(row, next_col)),
        }
    }

    /// Interpret a `<v>` payload according to the cell's `t` attribute
    fn typed_value(
        cell_type: Option<&str>,
        raw: &str,
        shared_strings: &[String],
    ) -> XlsxResult<CellValue> {
        Ok(match cell_type {
            Some("s") => {
                let idx: usize = raw.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {raw}"))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {idx} out of bounds"))
                })?;
                CellValue::Text(s.clone())
            }
            Some("b") => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
            Some("e") => CellValue::Error(raw.to_string()),
            Some("str") | Some("inlineStr") => CellValue::Text(decode_excel_escapes(raw)),
            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(raw.to_string()),
            },
            Some(_) => CellValue::Text(raw.to_string()),
        })
    }

    fn process_cell(
        worksheet: &mut Worksheet,
        addr: CellAddress,
        state: CellState,
        shared_strings: &[String],
        shared_anchors: &mut HashMap<u32, String>,
    ) -> XlsxResult<()> {
        let cell_type = state.cell_type.as_deref();
        let plain = match (&state.value, &state.inline) {
            (_, Some(inline)) if cell_type == Some("inlineStr") => {
                CellValue::Text(decode_excel_escapes(inline))
            }
            (Some(raw), _) => Self::typed_value(cell_type, raw, shared_strings)?,
            _ => CellValue::Empty,
        };

        let value = match state.formula {
            Some(f) if !f.text.is_empty() || f.shared_index.is_some() => {
                let text = if f.text.is_empty() {
                    String::new()
                } else if f.text.starts_with('=') {
                    f.text
                } else {
                    format!("={}", f.text)
                };
                let shared = f.shared_index.map(|index| {
                    if f.shared_ref.is_some() && !text.is_empty() {
                        shared_anchors.insert(index, text.clone());
                    }
                    SharedFormula {
                        index,
                        range: f.shared_ref,
                    }
                });
                CellValue::Formula {
                    text,
                    cached_value: Box::new(plain),
                    shared,
                }
            }
            _ => plain,
        };

        if value.is_empty() && state.style == 0 {
            return Ok(());
        }
        worksheet.set_cell(
            &addr,
            Cell {
                value,
                style: state.style,
            },
        );
        Ok(())
    }

    /// Shared-formula members carry no text of their own; give them the
    /// group's formula as written at its anchor.
    fn fill_shared_formula_text(worksheet: &mut Worksheet, anchors: &HashMap<u32, String>) {
        let members: Vec<(CellAddress, Cell)> = worksheet
            .cells()
            .filter_map(|(addr, cell)| match &cell.value {
                CellValue::Formula {
                    text,
                    shared: Some(shared),
                    ..
                } if text.is_empty() => Some((addr, cell.clone(), shared.index)),
                _ => None,
            })
            .map(|(addr, mut cell, index)| {
                if let CellValue::Formula { text, .. } = &mut cell.value {
                    *text = anchors.get(&index).cloned().unwrap_or_else(|| "=".into());
                }
                (addr, cell)
            })
            .collect();
        for (addr, cell) in members {
            worksheet.set_cell(&addr, cell);
        }
    }
}
