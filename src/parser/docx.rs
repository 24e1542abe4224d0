use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::blocks::{table_text, Block};
use crate::error::{ExtractError, ExtractionWarning};

static HEADING_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^heading\s*(\d+)$").unwrap());
static HEADING_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^heading").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(?:[•○▪]|-\s)").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:\d{1,3}|[A-Za-z]|[ivxlcdmIVXLCDM]{1,6})[.)]|\((?:\d{1,3}|[A-Za-z]|[ivxlcdmIVXLCDM]{1,6})\))\s+",
    )
    .unwrap()
});

const DOCUMENT_XML: &str = "word/document.xml";
const STYLES_XML: &str = "word/styles.xml";
const CORE_XML: &str = "docProps/core.xml";

/// A `.docx` file reduced to its block stream.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    /// `dc:title`, or the first `Title`-styled paragraph.
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Paragraph as it appears in `document.xml`, before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParagraph {
    pub style_id: Option<String>,
    pub num_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Paragraph(RawParagraph),
    Table(Vec<Vec<String>>),
}

pub fn read(path: &Path) -> Result<DocxDocument, ExtractError> {
    let file = File::open(path).map_err(|e| ExtractError::unavailable(path, e))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ExtractError::unavailable(path, e))?;

    let document_xml = read_entry(&mut archive, DOCUMENT_XML)
        .map_err(|e| ExtractError::unavailable(path, e))?
        .ok_or_else(|| ExtractError::unavailable(path, format!("missing {}", DOCUMENT_XML)))?;

    let styles = match read_entry(&mut archive, STYLES_XML) {
        Ok(Some(xml)) => parse_style_names(&xml).unwrap_or_else(|e| {
            warn!(error = %e, "styles.xml unreadable, using style ids");
            HashMap::new()
        }),
        Ok(None) => HashMap::new(),
        Err(e) => {
            warn!(error = %e, "styles.xml unreadable, using style ids");
            HashMap::new()
        }
    };
    let declared_title = read_entry(&mut archive, CORE_XML)
        .ok()
        .flatten()
        .and_then(|xml| parse_core_title(&xml).ok().flatten());

    let parts = parse_body(&document_xml).map_err(|e| ExtractError::unavailable(path, e))?;
    let mut doc = classify(parts, &styles);
    if declared_title.is_some() {
        doc.title = declared_title;
    }
    debug!(
        path = %path.display(),
        blocks = doc.blocks.len(),
        warnings = doc.warnings.len(),
        "docx parsed"
    );
    Ok(doc)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, std::io::Error> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(std::io::Error::other(e)),
    };
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// styleId → display name, e.g. `Heading1` → `heading 1`.
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut names = HashMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:style" => {
                current = attr(&e, b"w:styleId");
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"w:name" => {
                if let (Some(id), Some(name)) = (current.as_ref(), attr(&e, b"w:val")) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(e) if e.name().as_ref() == b"w:style" => current = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}

fn parse_core_title(xml: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"dc:title" => in_title = true,
            Event::Text(t) if in_title => title.push_str(&t.unescape()?),
            Event::End(e) if e.name().as_ref() == b"dc:title" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    let title = crate::text::normalize(&title);
    Ok((!title.is_empty()).then_some(title))
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

fn parse_body(xml: &str) -> Result<Vec<Part>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut parts = Vec::new();
    let mut tables: Vec<TableBuilder> = Vec::new();
    // textboxes nest paragraphs inside a paragraph's run
    let mut paras: Vec<RawParagraph> = Vec::new();
    let mut in_text = false;
    let mut in_num = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => paras.push(RawParagraph::default()),
                b"w:t" => in_text = true,
                b"w:numPr" => in_num = true,
                b"w:pStyle" => set_style(paras.last_mut(), &e),
                b"w:numId" if in_num => set_num(paras.last_mut(), &e),
                b"w:tbl" => tables.push(TableBuilder::default()),
                b"w:tr" => {
                    if let Some(t) = tables.last_mut() {
                        t.row.clear();
                    }
                }
                b"w:tc" => {
                    if let Some(t) = tables.last_mut() {
                        t.cell.clear();
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:pStyle" => set_style(paras.last_mut(), &e),
                b"w:numId" if in_num => set_num(paras.last_mut(), &e),
                b"w:tab" | b"w:br" | b"w:cr" => {
                    if let Some(p) = paras.last_mut() {
                        p.text.push(' ');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = paras.last_mut() {
                    p.text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:numPr" => in_num = false,
                b"w:p" => {
                    if let Some(p) = paras.pop() {
                        if let Some(outer) = paras.last_mut() {
                            // textbox text joins the paragraph that anchors it
                            if !outer.text.is_empty() {
                                outer.text.push(' ');
                            }
                            outer.text.push_str(&p.text);
                            outer.text.push(' ');
                            continue;
                        }
                        match tables.last_mut() {
                            Some(t) => {
                                if !t.cell.is_empty() {
                                    t.cell.push(' ');
                                }
                                t.cell.push_str(&p.text);
                            }
                            None => parts.push(Part::Paragraph(p)),
                        }
                    }
                }
                b"w:tc" => {
                    if let Some(t) = tables.last_mut() {
                        let cell = std::mem::take(&mut t.cell);
                        t.row.push(crate::text::normalize(&cell));
                    }
                }
                b"w:tr" => {
                    if let Some(t) = tables.last_mut() {
                        let row = std::mem::take(&mut t.row);
                        t.rows.push(row);
                    }
                }
                b"w:tbl" => {
                    if let Some(done) = tables.pop() {
                        match tables.last_mut() {
                            // nested table flattens into the enclosing cell
                            Some(outer) => {
                                if !outer.cell.is_empty() {
                                    outer.cell.push(' ');
                                }
                                outer.cell.push_str(&table_text(&done.rows));
                            }
                            None => parts.push(Part::Table(done.rows)),
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(parts)
}

fn set_style(para: Option<&mut RawParagraph>, e: &BytesStart) {
    if let Some(p) = para {
        p.style_id = attr(e, b"w:val");
    }
}

fn set_num(para: Option<&mut RawParagraph>, e: &BytesStart) {
    if let Some(p) = para {
        p.num_id = attr(e, b"w:val");
    }
}

#[derive(Debug, PartialEq)]
enum StyleKind {
    Heading(u8),
    Title,
    Body,
}

fn style_kind(
    para: &RawParagraph,
    styles: &HashMap<String, String>,
    warnings: &mut Vec<ExtractionWarning>,
) -> StyleKind {
    let Some(id) = para.style_id.as_deref() else {
        return StyleKind::Body;
    };
    let name = styles.get(id).map(String::as_str);
    let candidates: Vec<&str> = name.into_iter().chain(std::iter::once(id)).collect();

    if candidates.iter().any(|c| c.eq_ignore_ascii_case("title")) {
        return StyleKind::Title;
    }
    for c in &candidates {
        if let Some(caps) = HEADING_STYLE_RE.captures(c.trim()) {
            if let Ok(level @ 1..=9) = caps[1].parse::<u8>() {
                return StyleKind::Heading(level);
            }
        }
    }
    if candidates.iter().any(|c| HEADING_LIKE_RE.is_match(c.trim())) {
        let warning = ExtractionWarning::HeadingWithoutLevel {
            style: name.unwrap_or(id).to_string(),
            text: para.text.trim().to_string(),
        };
        warn!(%warning, "extraction warning");
        warnings.push(warning);
    }
    StyleKind::Body
}

/// Body paragraph → list item or paragraph. Numbering property wins, then a
/// leading bullet glyph, then a numbered prefix.
pub fn classify_body(para: &RawParagraph, warnings: &mut Vec<ExtractionWarning>) -> Block {
    if let Some(raw) = para.num_id.as_deref() {
        match raw.trim().parse::<u32>() {
            Ok(0) => {}
            Ok(_) => {
                return Block::ListItem {
                    ordered: true,
                    text: para.text.clone(),
                }
            }
            Err(_) => {
                let warning = ExtractionWarning::BadNumbering {
                    value: raw.to_string(),
                    text: para.text.trim().to_string(),
                };
                warn!(%warning, "extraction warning");
                warnings.push(warning);
            }
        }
    }
    if BULLET_RE.is_match(&para.text) {
        return Block::ListItem {
            ordered: false,
            text: para.text.clone(),
        };
    }
    if NUMBERED_RE.is_match(&para.text) {
        return Block::ListItem {
            ordered: true,
            text: para.text.clone(),
        };
    }
    Block::Paragraph(para.text.clone())
}

fn classify(parts: Vec<Part>, styles: &HashMap<String, String>) -> DocxDocument {
    let mut blocks = Vec::with_capacity(parts.len());
    let mut warnings = Vec::new();
    let mut title = None;

    for part in parts {
        let para = match part {
            Part::Table(rows) => {
                blocks.push(Block::Table(rows));
                continue;
            }
            Part::Paragraph(p) => p,
        };
        match style_kind(&para, styles, &mut warnings) {
            StyleKind::Heading(level) => blocks.push(Block::Heading {
                level,
                text: para.text,
            }),
            StyleKind::Title => {
                let text = crate::text::normalize(&para.text);
                if title.is_none() && !text.is_empty() {
                    title = Some(text);
                }
            }
            StyleKind::Body => blocks.push(classify_body(&para, &mut warnings)),
        }
    }

    DocxDocument {
        title,
        blocks,
        warnings,
    }
}
