//! End-to-end tests for PPTX packages (edit -> save -> read -> verify)

use std::io::{Cursor, Write};

use office_core::shape::catalog::{
    auto_shape, MSO_AUTO_SHAPE, MSO_PICTURE, MSO_PLACEHOLDER, MSO_TABLE, MSO_TEXT_BOX,
};
use office_core::shape::{FillStyle, Frame, LineDash, LineStyle, StyleProperties};
use office_core::Rgb;
use office_pptx::{PptxError, Presentation};
use pretty_assertions::assert_eq;

fn roundtrip(pres: &Presentation) -> Presentation {
    let mut buf = Vec::new();
    pres.write(Cursor::new(&mut buf)).unwrap();
    Presentation::read(Cursor::new(&buf)).unwrap()
}

fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        for (name, body) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

fn part_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
  <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
  <Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#;

// Relationship ids, prefixes and slide ids chosen unlike the built-in template
const PRESENTATION: &str = r#"<?xml version="1.0"?>
<pr:presentation xmlns:pr="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:rel="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <pr:sldIdLst><pr:sldId id="300" rel:id="rIdS"/></pr:sldIdLst>
  <pr:sldSz cx="9144000" cy="6858000"/>
</pr:presentation>"#;

const PRESENTATION_RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rIdS" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="/ppt/slides/slide1.xml"/>
</Relationships>"#;

const SLIDE: &str = r#"<?xml version="1.0"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:cSld><p:spTree>
    <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="4" name="Callout"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
      <p:spPr><a:xfrm rot="5400000"><a:off x="127000" y="254000"/><a:ext cx="1270000" cy="635000"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>
      <p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" b="1"/><a:t>Line &amp; one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r></a:p></p:txBody>
    </p:sp>
    <p:pic>
      <p:nvPicPr><p:cNvPr id="5" name="Logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>
      <p:blipFill/><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="12700" cy="12700"/></a:xfrm></p:spPr>
    </p:pic>
    <p:graphicFrame>
      <p:nvGraphicFramePr><p:cNvPr id="6" name="Table 1"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>
      <p:xfrm><a:off x="0" y="1270000"/><a:ext cx="2540000" cy="1270000"/></p:xfrm>
      <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl/></a:graphicData></a:graphic>
    </p:graphicFrame>
  </p:spTree></p:cSld>
</p:sld>"#;

const SLIDE_RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/>
</Relationships>"#;

fn foreign_package() -> Vec<u8> {
    package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("ppt/presentation.xml", PRESENTATION),
        ("ppt/_rels/presentation.xml.rels", PRESENTATION_RELS),
        ("ppt/slides/slide1.xml", SLIDE),
        ("ppt/slides/_rels/slide1.xml.rels", SLIDE_RELS),
        ("ppt/notesSlides/notesSlide1.xml", "<p:notes/>"),
    ])
}

#[test]
fn test_reads_foreign_package() {
    let pres = Presentation::read(Cursor::new(foreign_package())).unwrap();
    assert_eq!(pres.slide_count(), 1);
    assert_eq!(pres.slide_size(), Some((720.0, 540.0)));
    assert!(pres.layouts().is_empty());
    assert_eq!(pres.layout_name(0).unwrap(), None);

    let shapes = pres.shapes(0).unwrap();
    let summary: Vec<(u32, &str, i32)> = shapes
        .iter()
        .map(|s| (s.id, s.name.as_str(), s.type_id))
        .collect();
    assert_eq!(
        summary,
        vec![
            (4, "Callout", MSO_AUTO_SHAPE),
            (5, "Logo", MSO_PICTURE),
            (6, "Table 1", MSO_TABLE),
        ]
    );
    let callout = &shapes[0];
    assert_eq!(callout.text.as_deref(), Some("Line & one\ntwo"));
    assert_eq!(callout.frame(), Frame::new(10.0, 20.0, 100.0, 50.0));
    assert_eq!(callout.rotation, 90.0);
    assert_eq!(shapes[2].frame(), Frame::new(0.0, 100.0, 200.0, 100.0));
}

#[test]
fn test_edits_foreign_package() {
    let mut pres = Presentation::read(Cursor::new(foreign_package())).unwrap();
    pres.set_geometry(0, 4, Frame::new(20.0, 20.0, 100.0, 50.0)).unwrap();
    pres.set_text(0, 4, "Replaced").unwrap();
    pres.set_geometry(0, 6, Frame::new(0.0, 0.0, 50.0, 50.0)).unwrap();
    assert!(matches!(pres.set_text(0, 5, "x"), Err(PptxError::Unsupported(_))));
    assert!(matches!(pres.set_text(0, 42, "x"), Err(PptxError::ShapeNotFound(42))));

    let back = roundtrip(&pres);
    let callout = back.shape(0, 4).unwrap();
    assert_eq!(callout.text.as_deref(), Some("Replaced"));
    // rotation survives a move
    assert_eq!(callout.rotation, 90.0);
    assert_eq!(callout.left, 20.0);
    assert_eq!(back.shape(0, 6).unwrap().width, 50.0);
}

#[test]
fn test_delete_foreign_slide_drops_notes() {
    let mut pres = Presentation::read(Cursor::new(foreign_package())).unwrap();
    pres.delete_slide(0).unwrap();
    assert_eq!(pres.slide_count(), 0);

    let mut buf = Vec::new();
    pres.write(Cursor::new(&mut buf)).unwrap();
    assert_eq!(
        part_names(&buf),
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/_rels/presentation.xml.rels",
            "ppt/presentation.xml",
        ]
    );
    let back = Presentation::read(Cursor::new(&buf)).unwrap();
    assert_eq!(back.slide_count(), 0);
}

#[test]
fn test_rejects_non_presentation() {
    let bytes = package(&[
        ("[Content_Types].xml", r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#),
        ("_rels/.rels", r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#),
        ("xl/workbook.xml", "<workbook/>"),
    ]);
    assert!(matches!(
        Presentation::read(Cursor::new(bytes)),
        Err(PptxError::InvalidFormat(_))
    ));
    assert!(Presentation::read(Cursor::new(b"not a zip".to_vec())).is_err());
}

#[test]
fn test_build_deck_and_save_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck.pptx");

    let mut pres = Presentation::new().unwrap();
    let title = pres.layout_index("Title Slide").unwrap();
    let blank = pres.layout_index("Blank").unwrap();
    pres.add_slide(title).unwrap();
    pres.add_slide(blank).unwrap();
    pres.set_text(0, 2, "Quarterly review").unwrap();

    let text = pres
        .add_text_box(1, Frame::new(36.0, 36.0, 300.0, 40.0), "Agenda\nNumbers")
        .unwrap();
    let star = pres
        .add_auto_shape(1, auto_shape("star5").unwrap(), Frame::new(400.0, 100.0, 80.0, 80.0))
        .unwrap();
    let style: StyleProperties = StyleProperties {
        fill: Some(FillStyle::Solid {
            color: Rgb::new(0xFF, 0xC0, 0x00),
            transparency: Some(25.0),
        }),
        line: Some(LineStyle {
            color: Some(Rgb::new(0, 0, 0)),
            width: Some(2.0),
            style: Some(LineDash::Dash),
        }),
        ..Default::default()
    };
    pres.apply_style(1, star, &style).unwrap();
    pres.set_background(1, Rgb::new(0x20, 0x20, 0x20)).unwrap();
    pres.save(&path).unwrap();

    let back = Presentation::open(&path).unwrap();
    assert_eq!(back.slide_count(), 2);
    assert_eq!(back.layout_name(1).unwrap().as_deref(), Some("Blank"));

    let first = back.shapes(0).unwrap();
    assert_eq!(first[0].type_id, MSO_PLACEHOLDER);
    assert_eq!(first[0].text.as_deref(), Some("Quarterly review"));

    let second = back.shapes(1).unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].id, text);
    assert_eq!(second[0].type_id, MSO_TEXT_BOX);
    assert_eq!(second[0].text.as_deref(), Some("Agenda\nNumbers"));
    assert_eq!(second[1].auto_shape.as_deref(), Some("star5"));

    let bad = StyleProperties {
        fill: Some(FillStyle::Solid {
            color: Rgb::new(0, 0, 0),
            transparency: Some(150.0),
        }),
        ..Default::default()
    };
    let mut back = back;
    assert!(back.apply_style(1, star, &bad).is_err());
}
