use std::io::Write;
use std::path::{Path, PathBuf};

use content_tree::{extract_from_document, ContentType, ExtractError, ExtractionWarning, Settings};
use zip::write::SimpleFileOptions;

const TWELVE: &str = "one two three four five six seven eight nine ten eleven twelve";

fn heading(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
        style, text
    )
}

fn para(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

fn numbered(num_id: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="{}"/></w:numPr></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
        num_id, text
    )
}

fn document_xml(body: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body.concat()
    )
}

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/></w:style>
  <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
  <w:style w:type="paragraph" w:styleId="HeadingFancy"><w:name w:val="Heading Fancy"/></w:style>
</w:styles>"#;

fn core_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title></cp:coreProperties>"#,
        title
    )
}

/// Writes a minimal .docx with the given entries into `dir`.
fn write_docx(dir: &Path, name: &str, entries: &[(&str, String)]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (entry, content) in entries {
        zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

#[test]
fn skipped_heading_levels_nest_by_depth() {
    let dir = tempfile::tempdir().unwrap();
    let body = vec![
        heading("Heading1", "Alpha"),
        para(&format!("{} alpha", TWELVE)),
        heading("Heading3", "Alpha detail"),
        para(&format!("{} detail", TWELVE)),
        heading("Heading1", "Beta"),
        para(&format!("{} beta", TWELVE)),
    ];
    let path = write_docx(
        dir.path(),
        "report.docx",
        &[
            ("word/document.xml", document_xml(&body)),
            ("word/styles.xml", STYLES_XML.to_string()),
        ],
    );

    let result = extract_from_document(&path, &Settings::default()).unwrap();

    assert_eq!(result.title, "report");
    assert_eq!(result.items.len(), 3);
    let root = &result.section_tree;
    assert_eq!(root.title, "report");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].title, "Alpha");
    assert_eq!(root.children[0].children.len(), 1);
    assert_eq!(root.children[0].children[0].title, "Alpha detail");
    assert_eq!(root.children[0].children[0].level, 2);
    assert_eq!(root.children[1].title, "Beta");
    assert!(root.children[1].children.is_empty());

    let detail = &result.items[1];
    assert_eq!(detail.heading_path, vec!["Alpha", "Alpha detail"]);
    assert_eq!(detail.heading_level, 2);
    assert_eq!(detail.source_location, None);
}

#[test]
fn lists_tables_and_title() {
    let dir = tempfile::tempdir().unwrap();
    let table = r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Role</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t>Ada</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Engineer</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#;
    let body = vec![
        heading("Title", "Ignored title paragraph"),
        heading("Heading1", "Steps"),
        numbered("3", &format!("{} first", TWELVE)),
        numbered("3", &format!("{} second", TWELVE)),
        para(&format!("• {} bullet", TWELVE)),
        para(&format!("- {} dash", TWELVE)),
        table.to_string(),
    ];
    let path = write_docx(
        dir.path(),
        "handbook.docx",
        &[
            ("word/document.xml", document_xml(&body)),
            ("word/styles.xml", STYLES_XML.to_string()),
            ("docProps/core.xml", core_xml("Team Handbook")),
        ],
    );

    let result = extract_from_document(&path, &Settings::default()).unwrap();

    assert_eq!(result.title, "Team Handbook");
    let types: Vec<_> = result.items.iter().map(|i| i.content_type).collect();
    assert_eq!(
        types,
        vec![
            ContentType::OrderedListItem,
            ContentType::OrderedListItem,
            ContentType::UnorderedListItem,
            ContentType::UnorderedListItem,
            ContentType::Table,
        ]
    );
    assert_eq!(result.items[4].text, "Name | Role ; Ada | Engineer");

    let steps = &result.sections.subsections[0];
    assert_eq!(steps.title, "Steps");
    assert_eq!(steps.lists.len(), 2);
    assert!(steps.lists[0].ordered);
    assert_eq!(steps.lists[0].items.len(), 2);
    assert!(!steps.lists[1].ordered);
    assert_eq!(steps.lists[1].items.len(), 2);
    assert_eq!(steps.tables.len(), 1);
    assert!(steps.paragraphs.is_empty());
}

#[test]
fn title_falls_back_to_title_style() {
    let dir = tempfile::tempdir().unwrap();
    let body = vec![heading("Title", "Quarterly Plan"), para(TWELVE)];
    let path = write_docx(
        dir.path(),
        "q3.docx",
        &[
            ("word/document.xml", document_xml(&body)),
            ("word/styles.xml", STYLES_XML.to_string()),
        ],
    );
    let result = extract_from_document(&path, &Settings::default()).unwrap();
    assert_eq!(result.title, "Quarterly Plan");
    assert_eq!(result.section_tree.title, "Quarterly Plan");
    assert_eq!(result.items.len(), 1);
}

#[test]
fn malformed_fragments_become_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let body = vec![
        heading("HeadingFancy", &format!("{} fancy", TWELVE)),
        numbered("x1", &format!("{} numbered", TWELVE)),
    ];
    let path = write_docx(
        dir.path(),
        "odd.docx",
        &[
            ("word/document.xml", document_xml(&body)),
            ("word/styles.xml", STYLES_XML.to_string()),
        ],
    );

    let result = extract_from_document(&path, &Settings::default()).unwrap();

    assert_eq!(result.warnings.len(), 2);
    assert!(matches!(
        &result.warnings[0],
        ExtractionWarning::HeadingWithoutLevel { style, .. } if style == "Heading Fancy"
    ));
    assert!(matches!(
        &result.warnings[1],
        ExtractionWarning::BadNumbering { value, .. } if value == "x1"
    ));
    assert!(result
        .items
        .iter()
        .all(|i| i.content_type == ContentType::Paragraph));
    assert_eq!(result.items.len(), 2);
}

#[test]
fn repeated_paragraphs_under_one_heading_are_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let body = vec![heading("Heading1", "Notes"), para(TWELVE), para(&format!("  {}  ", TWELVE))];
    let path = write_docx(dir.path(), "dup.docx", &[("word/document.xml", document_xml(&body))]);
    let result = extract_from_document(&path, &Settings::default()).unwrap();
    assert_eq!(result.items.len(), 1);
}

#[test]
fn unreadable_sources_are_unavailable() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("nope.docx");
    let err = extract_from_document(&missing, &Settings::default()).unwrap_err();
    assert!(matches!(err, ExtractError::SourceUnavailable { .. }));

    let not_zip = dir.path().join("plain.docx");
    std::fs::write(&not_zip, "just some text").unwrap();
    let err = extract_from_document(&not_zip, &Settings::default()).unwrap_err();
    assert!(matches!(err, ExtractError::SourceUnavailable { .. }));

    let no_document = write_docx(dir.path(), "empty.docx", &[("word/styles.xml", STYLES_XML.to_string())]);
    let err = extract_from_document(&no_document, &Settings::default()).unwrap_err();
    assert!(matches!(err, ExtractError::SourceUnavailable { .. }));
}
