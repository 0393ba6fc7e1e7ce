//! XLSX writer

use std::collections::HashMap;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use crate::document::XlsxDocument;
use crate::error::XlsxResult;
use crate::reader::{STYLES_PART, THEME_PART};
use office_core::cell::excel_serial;
use office_core::{CellValue, Workbook, Worksheet};

/// Stylesheet written when the document did not come with one
const MINIMAL_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>
    <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
    <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

/// Shared string table built while writing sheets
#[derive(Default)]
struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    /// Total references, for the `count` attribute
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a document to a file path
    pub fn write_file<P: AsRef<Path>>(doc: &XlsxDocument, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(doc, file)
    }

    /// Write a document to a writer
    pub fn write<W: Write + Seek>(doc: &XlsxDocument, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let workbook = &doc.workbook;
        let has_theme = doc.preserved.theme.is_some();
        // Cell style indices only mean something against the stylesheet they came with
        let keep_styles = doc.preserved.styles.is_some();

        let mut shared = SharedStrings::default();
        let sheets: Vec<String> = workbook
            .worksheets()
            .map(|sheet| Self::worksheet_xml(sheet, &mut shared, keep_styles))
            .collect();

        Self::write_content_types(&mut zip, workbook, has_theme)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook, has_theme)?;

        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(STYLES_PART, options)?;
        match &doc.preserved.styles {
            Some(bytes) => zip.write_all(bytes)?,
            None => zip.write_all(MINIMAL_STYLES.as_bytes())?,
        }
        if let Some(theme) = &doc.preserved.theme {
            zip.start_file(THEME_PART, options)?;
            zip.write_all(theme)?;
        }

        Self::write_shared_strings(&mut zip, &shared)?;

        for (i, xml) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(xml.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        has_theme: bool,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
        if has_theme {
            content.push_str(
                r#"
    <Override PartName="/xl/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            );
        }

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            let state = sheet
                .visibility()
                .as_state()
                .map(|s| format!(r#" state="{s}""#))
                .unwrap_or_default();
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                state,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        has_theme: bool,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        let count = workbook.sheet_count();
        for i in 0..count {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            count + 1,
            count + 2
        ));
        if has_theme {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>"#,
                count + 3
            ));
        }

        content.push_str("\n</Relationships>");
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_shared_strings<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        shared: &SharedStrings,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/sharedStrings.xml", options)?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            shared.references,
            shared.strings.len()
        );
        for s in &shared.strings {
            content.push_str(&format!(
                "\n    <si><t xml:space=\"preserve\">{}</t></si>",
                escape_xml(s)
            ));
        }
        content.push_str("\n</sst>");
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn worksheet_xml(sheet: &Worksheet, shared: &mut SharedStrings, keep_styles: bool) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        if let Some(used) = sheet.used_range() {
            content.push_str(&format!("\n    <dimension ref=\"{}\"/>", used.to_a1()));
        }
        content.push_str("\n    <sheetData>");

        // Write cell data (sparse, row-major)
        let mut current_row: Option<u32> = None;
        for (addr, cell) in sheet.cells() {
            let style = if keep_styles { cell.style } else { 0 };
            if cell.value.is_empty() && style == 0 {
                continue;
            }
            if current_row != Some(addr.row) {
                if current_row.is_some() {
                    content.push_str("\n        </row>");
                }
                content.push_str(&format!("\n        <row r=\"{}\">", addr.row + 1));
                current_row = Some(addr.row);
            }

            let cell_ref = addr.to_a1();
            let style_attr = if style != 0 {
                format!(" s=\"{style}\"")
            } else {
                String::new()
            };

            match &cell.value {
                CellValue::Formula {
                    text,
                    cached_value,
                    shared: group,
                } => {
                    let body = text.strip_prefix('=').unwrap_or(text);
                    let f = match group {
                        Some(g) => match &g.range {
                            Some(range) => format!(
                                "<f t=\"shared\" ref=\"{}\" si=\"{}\">{}</f>",
                                escape_xml(range),
                                g.index,
                                escape_xml(body)
                            ),
                            None => format!("<f t=\"shared\" si=\"{}\"/>", g.index),
                        },
                        None => format!("<f>{}</f>", escape_xml(body)),
                    };
                    let (t_attr, v) = Self::cached_value(cached_value);
                    content.push_str(&format!(
                        "\n            <c r=\"{cell_ref}\"{style_attr}{t_attr}>{f}{v}</c>"
                    ));
                }
                CellValue::Text(s) => {
                    let i = shared.intern(s);
                    content.push_str(&format!(
                        "\n            <c r=\"{cell_ref}\"{style_attr} t=\"s\"><v>{i}</v></c>"
                    ));
                }
                CellValue::Empty => {
                    // Preserve style-only cells
                    content.push_str(&format!("\n            <c r=\"{cell_ref}\"{style_attr}/>"));
                }
                other => {
                    let (t_attr, v) = Self::cached_value(other);
                    content.push_str(&format!(
                        "\n            <c r=\"{cell_ref}\"{style_attr}{t_attr}>{v}</c>"
                    ));
                }
            }
        }

        if current_row.is_some() {
            content.push_str("\n        </row>");
        }
        content.push_str("\n    </sheetData>\n</worksheet>");
        content
    }

    /// `t` attribute and `<v>` element for a plain (non-formula) value
    fn cached_value(value: &CellValue) -> (&'static str, String) {
        match value {
            CellValue::Number(n) => ("", format!("<v>{n}</v>")),
            CellValue::Boolean(b) => (" t=\"b\"", format!("<v>{}</v>", u8::from(*b))),
            CellValue::Text(s) => (" t=\"str\"", format!("<v>{}</v>", escape_xml(s))),
            CellValue::Error(e) => (" t=\"e\"", format!("<v>{}</v>", escape_xml(e))),
            CellValue::DateTime(dt) => {
                let serial = excel_serial(dt);
                ("", format!("<v>{serial}</v>"))
            }
            CellValue::Formula { cached_value, .. } => Self::cached_value(cached_value),
            CellValue::Empty => ("", String::new()),
        }
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_strings_dedupe() {
        let mut shared = SharedStrings::default();
        assert_eq!(shared.intern("a"), 0);
        assert_eq!(shared.intern("b"), 1);
        assert_eq!(shared.intern("a"), 0);
        assert_eq!(shared.references, 3);
        assert_eq!(shared.strings.len(), 2);
    }
}
