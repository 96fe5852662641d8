//! Plain-text extraction from hOCR markup.

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use std::path::{Path, PathBuf};
use tracing::info;

use super::naming::text_file_name;
use super::{HocrDocument, HocrError, HocrProcessor};

/// Extracts the recognized text from an hOCR document: one output line per
/// line element, words separated by single spaces, a blank line between
/// paragraphs. The result is written to a plain-text file named after the
/// input.
pub struct OcrExtractor {
    output_dir: PathBuf,
}

impl OcrExtractor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl HocrProcessor for OcrExtractor {
    fn init(&self) -> Result<(), HocrError> {
        info!("Generating OCR files from hOCR files...");
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    fn process(&self, path: &Path, doc: &HocrDocument) -> Result<(), HocrError> {
        let text = extract_text(doc);
        let out_path = self.output_dir.join(text_file_name(path));
        std::fs::write(out_path, text)?;
        Ok(())
    }
}

fn has_class(e: &BytesStart, value: &str) -> bool {
    e.attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"class" && a.value.as_ref() == value.as_bytes())
}

/// Walk the parsed events collecting text line by line.
///
/// A line is a `span` with class `ocr_line` directly inside a paragraph;
/// each direct-child `span` of a line is one word whose text is everything
/// nested within it.
fn extract_text(doc: &HocrDocument) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut para_depth: Option<usize> = None;
    let mut line_depth: Option<usize> = None;
    let mut word_depth: Option<usize> = None;
    let mut words: Vec<String> = Vec::new();
    let mut current_word = String::new();

    for event in doc.events() {
        match event {
            Event::Start(e) => {
                depth += 1;
                let name = e.local_name();
                if para_depth.is_none() && name.as_ref() == b"p" {
                    para_depth = Some(depth);
                } else if name.as_ref() == b"span" {
                    if let Some(pd) = para_depth {
                        if line_depth.is_none() && depth == pd + 1 && has_class(e, "ocr_line") {
                            line_depth = Some(depth);
                            words.clear();
                        } else if word_depth.is_none() && line_depth == Some(depth - 1) {
                            word_depth = Some(depth);
                            current_word.clear();
                        }
                    }
                }
            }
            Event::Empty(e) => {
                // A self-closing span in word position is an empty word.
                if e.local_name().as_ref() == b"span"
                    && word_depth.is_none()
                    && line_depth == Some(depth)
                {
                    words.push(String::new());
                }
            }
            Event::Text(t) => {
                if word_depth.is_some() {
                    current_word.push_str(&t.xml_content().unwrap_or_default());
                }
            }
            Event::GeneralRef(r) => {
                if word_depth.is_some() {
                    if let Ok(Some(ch)) = r.resolve_char_ref() {
                        current_word.push(ch);
                    } else if let Ok(name) = r.decode() {
                        if let Some(resolved) = resolve_xml_entity(&name) {
                            current_word.push_str(resolved);
                        }
                    }
                }
            }
            Event::End(_) => {
                if word_depth == Some(depth) {
                    words.push(std::mem::take(&mut current_word));
                    word_depth = None;
                } else if line_depth == Some(depth) {
                    out.push_str(&words.join(" "));
                    out.push('\n');
                    line_depth = None;
                } else if para_depth == Some(depth) {
                    out.push('\n');
                    para_depth = None;
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
  <body>
    <div class="ocr_page">
      <p class="ocr_par">
        <span class="ocr_line"><span class="ocrx_word">In</span> <span class="ocrx_word">the</span> <span class="ocrx_word">beginning</span></span>
        <span class="ocr_line"><span class="ocrx_word">was</span> <span class="ocrx_word">ink</span></span>
      </p>
      <p class="ocr_par">
        <span class="ocr_line"><span class="ocrx_word">Second</span> <span class="ocrx_word">paragraph</span></span>
      </p>
    </div>
  </body>
</html>"#;

    #[test]
    fn test_extract_lines_and_paragraphs() {
        let doc = HocrDocument::parse(FIXTURE).unwrap();
        let text = extract_text(&doc);
        assert_eq!(
            text,
            "In the beginning\nwas ink\n\nSecond paragraph"
        );
    }

    #[test]
    fn test_non_line_spans_are_ignored() {
        let doc = HocrDocument::parse(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><body>
<p><span class="ocr_line"><span>kept</span></span><span class="other"><span>dropped</span></span></p>
</body></html>"#,
        )
        .unwrap();
        assert_eq!(extract_text(&doc), "kept");
    }

    #[test]
    fn test_nested_markup_inside_word_is_flattened() {
        let doc = HocrDocument::parse(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><body>
<p><span class="ocr_line"><span>em<em>pha</em>sis</span> <span>plain</span></span></p>
</body></html>"#,
        )
        .unwrap();
        assert_eq!(extract_text(&doc), "emphasis plain");
    }

    #[test]
    fn test_empty_document_yields_empty_text() {
        let doc = HocrDocument::parse(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><body></body></html>"#,
        )
        .unwrap();
        assert_eq!(extract_text(&doc), "");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let doc = HocrDocument::parse(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><body>
<p><span class="ocr_line"><span>Johnson &amp; Sons</span></span></p>
</body></html>"#,
        )
        .unwrap();
        assert_eq!(extract_text(&doc), "Johnson & Sons");
    }

    #[test]
    fn test_process_writes_named_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("ocrs");
        let extractor = OcrExtractor::new(&out_dir);
        extractor.init().unwrap();

        let doc = HocrDocument::parse(FIXTURE).unwrap();
        extractor
            .process(Path::new("/staging/book_42_HOCR.shtml"), &doc)
            .unwrap();

        let written = std::fs::read_to_string(out_dir.join("book_42_OCR.asc")).unwrap();
        assert!(written.starts_with("In the beginning"));
    }
}
