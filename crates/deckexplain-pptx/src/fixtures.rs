//! In-memory .pptx archives for tests.
//!
//! Only compiled for this crate's tests or with the `test-utils` feature.

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::FileOptions;

const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const MASTER_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";

/// Build a deck where each inner slice is one slide and each string one text run.
#[must_use]
pub fn build_pptx(slides: &[&[&str]]) -> Vec<u8> {
    slides
        .iter()
        .fold(PptxBuilder::new(), |b, runs| b.slide(runs))
        .build()
}

/// Builder for minimal but structurally valid PPTX archives.
#[derive(Debug, Default)]
pub struct PptxBuilder {
    slides: Vec<(String, Vec<String>)>,
    with_slide_list: bool,
}

impl PptxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            with_slide_list: true,
        }
    }

    /// Append a slide stored as `slide{n}.xml`, n being its position.
    #[must_use]
    pub fn slide(self, runs: &[&str]) -> Self {
        let part = format!("slide{}.xml", self.slides.len() + 1);
        self.slide_with_part(&part, runs)
    }

    /// Append a slide stored under an explicit part name.
    #[must_use]
    pub fn slide_with_part(mut self, part: &str, runs: &[&str]) -> Self {
        self.slides.push((
            part.to_string(),
            runs.iter().map(|r| (*r).to_string()).collect(),
        ));
        self
    }

    /// Omit `p:sldIdLst`, forcing order to come from part names.
    #[must_use]
    pub fn without_slide_list(mut self) -> Self {
        self.with_slide_list = false;
        self
    }

    /// Serialize the archive.
    ///
    /// # Panics
    ///
    /// Panics if writing to the in-memory buffer fails.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        let mut put = |name: &str, body: &str| {
            zip.start_file(name, options).expect("start zip entry");
            zip.write_all(body.as_bytes()).expect("write zip entry");
        };

        put("[Content_Types].xml", &self.content_types());
        put("ppt/_rels/presentation.xml.rels", &self.relationships());
        put("ppt/presentation.xml", &self.presentation());
        for (part, runs) in &self.slides {
            put(&format!("ppt/slides/{part}"), &slide_xml(runs));
        }

        zip.finish().expect("finish zip").into_inner()
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (part, _) in &self.slides {
            xml.push_str(&format!(
                r#"<Override PartName="/ppt/slides/{part}" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn relationships(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        xml.push_str(&format!(
            r#"<Relationship Id="rId1" Type="{MASTER_REL_TYPE}" Target="slideMasters/slideMaster1.xml"/>"#
        ));
        // Relationship ids deliberately run backwards so ordering cannot lean on them.
        let n = self.slides.len();
        for (i, (part, _)) in self.slides.iter().enumerate() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{SLIDE_REL_TYPE}" Target="slides/{part}"/>"#,
                n - i + 1
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn presentation(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        if self.with_slide_list {
            xml.push_str("<p:sldIdLst>");
            let n = self.slides.len();
            for i in 0..n {
                xml.push_str(&format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    256 + i,
                    n - i + 1
                ));
            }
            xml.push_str("</p:sldIdLst>");
        }
        xml.push_str("</p:presentation>");
        xml
    }
}

fn slide_xml(runs: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>"#,
    );
    if !runs.is_empty() {
        xml.push_str("<p:sp><p:txBody><a:bodyPr/><a:p>");
        for run in runs {
            xml.push_str(&format!("<a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r>", escape(run)));
        }
        xml.push_str("</a:p></p:txBody></p:sp>");
    }
    xml.push_str("</p:spTree></p:cSld></p:sld>");
    xml
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
