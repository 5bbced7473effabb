//! PPTX slide text extraction.

use deckexplain_utils::error::ExtractionError;
use deckexplain_utils::types::SlideDeck;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_REL_TYPE_SUFFIX: &str = "/relationships/slide";

/// Mis-decoded copyright sign, removed from slide text. A correctly decoded
/// `©` is kept.
const STRIPPED: &str = "Â©";

/// Extracts per-slide text from PPTX archives.
///
/// Text is gathered run by run: every `a:r` run contributes its text
/// followed by one space, in document order. Only the text frames of
/// top-level shapes (`p:spTree/p:sp/p:txBody`) are read, so tables, charts
/// and grouped shapes contribute nothing. A slide with no runs maps to an
/// empty string.
#[derive(Debug, Default, Clone, Copy)]
pub struct PptxExtractor;

impl PptxExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract from a file on disk.
    pub fn extract_path(&self, path: impl AsRef<Path>) -> Result<SlideDeck, ExtractionError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!(path = %path.display(), "extracting slide text");
        self.extract(BufReader::new(file))
    }

    /// Extract from any seekable reader over a .pptx archive.
    pub fn extract<R: Read + Seek>(&self, reader: R) -> Result<SlideDeck, ExtractionError> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| ExtractionError::Archive(format!("Failed to open ZIP: {e}")))?;

        let order = slide_order(&mut archive)?;
        let mut texts = Vec::with_capacity(order.len());
        for part in &order {
            let xml = read_part(&mut archive, part)?;
            texts.push(slide_text(&xml, part)?);
        }

        debug!(slides = texts.len(), "extracted slide text");
        Ok(SlideDeck::from_ordered(texts))
    }
}

/// Slide part paths in presentation order.
///
/// The order comes from `p:sldIdLst` in `presentation.xml`. Archives without
/// that list fall back to the number in each slide part name.
fn slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, ExtractionError> {
    let rels_xml = read_part(archive, PRESENTATION_RELS_PART)?;
    let slide_rels = slide_relationships(&rels_xml)?;

    let listed = match read_part(archive, PRESENTATION_PART) {
        Ok(xml) => slide_id_list(&xml)?,
        Err(ExtractionError::Archive(_)) => Vec::new(),
        Err(e) => return Err(e),
    };

    if !listed.is_empty() {
        let mut parts = Vec::with_capacity(listed.len());
        for rel_id in &listed {
            let part = slide_rels.get(rel_id).ok_or_else(|| {
                ExtractionError::Archive(format!(
                    "presentation.xml references unknown relationship '{rel_id}'"
                ))
            })?;
            parts.push(part.clone());
        }
        return Ok(parts);
    }

    let mut parts: Vec<String> = slide_rels.into_values().collect();
    parts.sort_by(|a, b| {
        match (extract_slide_number(a), extract_slide_number(b)) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    Ok(parts)
}

/// Map relationship id to archive path for every slide relationship.
fn slide_relationships(xml: &str) -> Result<HashMap<String, String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut slides = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        _ => {}
                    }
                }
                if rel_type.ends_with(SLIDE_REL_TYPE_SUFFIX) {
                    slides.insert(id, part_path(&target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Xml {
                    part: PRESENTATION_RELS_PART.to_string(),
                    reason: e.to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids from `p:sldIdLst`, in list order.
fn slide_id_list(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // `id` is the numeric slide id; the namespaced `r:id` is the relationship.
                let rel = e.attributes().flatten().find(|a| {
                    let key = a.key.as_ref();
                    key.contains(&b':') && local_name(key) == b"id"
                });
                if let Some(attr) = rel {
                    ids.push(String::from_utf8_lossy(&attr.value).into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Xml {
                    part: PRESENTATION_PART.to_string(),
                    reason: e.to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Concatenate the run text of the top-level shape text frames of one slide part.
fn slide_text(xml: &str, part: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    // Depth of the open `txBody` being read, if any.
    let mut frame: Option<usize> = None;
    let mut run: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if frame.is_none() && name == b"txBody" && is_top_level_shape(&path) {
                    frame = Some(path.len());
                }
                if frame.is_some() {
                    match name.as_slice() {
                        b"r" => run = Some(String::new()),
                        b"t" if run.is_some() => in_text = true,
                        _ => {}
                    }
                }
                path.push(name);
            }
            Ok(Event::Empty(ref e))
                if frame.is_some() && local_name(e.name().as_ref()) == b"r" =>
            {
                out.push(' ');
            }
            Ok(Event::Text(ref e)) if in_text => {
                let text = e.unescape().map_err(|err| ExtractionError::Xml {
                    part: part.to_string(),
                    reason: err.to_string(),
                })?;
                if let Some(buf) = run.as_mut() {
                    buf.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                path.pop();
                if frame.is_some() {
                    match local_name(e.name().as_ref()) {
                        b"t" => in_text = false,
                        b"r" => {
                            if let Some(text) = run.take() {
                                out.push_str(&text);
                                out.push(' ');
                            }
                        }
                        _ => {}
                    }
                }
                if frame == Some(path.len()) {
                    frame = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Xml {
                    part: part.to_string(),
                    reason: e.to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(out.replace(STRIPPED, ""))
}

/// True when the open elements end in `spTree/sp`, i.e. a shape that is not
/// nested in a group.
fn is_top_level_shape(path: &[Vec<u8>]) -> bool {
    matches!(path, [.., tree, shape] if tree.as_slice() == b"spTree" && shape.as_slice() == b"sp")
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String, ExtractionError> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| ExtractionError::Archive(format!("Part '{path}' not found in archive: {e}")))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| ExtractionError::Archive(format!("Failed to read '{path}': {e}")))?;

    Ok(content)
}

/// Resolve a relationship target (relative to `ppt/`) into an archive path.
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{target}"),
    }
}

/// Strip the namespace prefix from an XML name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Trailing number of a part name such as `slides/slide12.xml`.
fn extract_slide_number(s: &str) -> Option<usize> {
    let stem = s.trim_end_matches(".xml");
    let start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    stem[start..].parse().ok()
}
