//! hOCR header rewriting.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::Path;
use tracing::info;

use super::naming::source_image_name;
use super::{HocrDocument, HocrError, HocrProcessor};

/// Rewrites the document header: sets the title to the source image name and
/// appends a provenance marker identifying the recognition engine and, when
/// known, the model used. The file is rewritten in place, indented, UTF-8
/// without a byte-order mark.
pub struct HeaderRewriter {
    htr_id: Option<i64>,
    file_name: Option<String>,
}

impl HeaderRewriter {
    pub fn new(htr_id: Option<i64>, file_name: Option<String>) -> Self {
        Self { htr_id, file_name }
    }

    fn title_for(&self, path: &Path) -> String {
        let name = match &self.file_name {
            Some(name) => name.clone(),
            None => source_image_name(path),
        };
        format!("Image: {}", name)
    }

    fn provenance(&self) -> String {
        match self.htr_id {
            Some(id) => format!("Transkribus-HtrId:{}", id),
            None => "Transkribus".to_string(),
        }
    }

    fn provenance_meta(&self) -> BytesStart<'static> {
        let mut meta = BytesStart::new("meta");
        meta.push_attribute(("name", "ocr-system"));
        meta.push_attribute(("content", self.provenance().as_str()));
        meta
    }
}

impl HocrProcessor for HeaderRewriter {
    fn init(&self) -> Result<(), HocrError> {
        info!("Fixing hOCR file headers...");
        Ok(())
    }

    fn process(&self, path: &Path, doc: &HocrDocument) -> Result<(), HocrError> {
        let title = self.title_for(path);
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        let mut in_title = false;

        for event in doc.events() {
            match event {
                Event::Start(e) if e.local_name().as_ref() == b"title" => {
                    in_title = true;
                    write(&mut writer, event.clone())?;
                    write(&mut writer, Event::Text(BytesText::new(&title)))?;
                }
                Event::End(e) if e.local_name().as_ref() == b"title" => {
                    in_title = false;
                    write(&mut writer, event.clone())?;
                }
                // Drop the old title text.
                Event::Text(_) if in_title => {}
                Event::Empty(e) if e.local_name().as_ref() == b"title" => {
                    write(&mut writer, Event::Start(BytesStart::new("title")))?;
                    write(&mut writer, Event::Text(BytesText::new(&title)))?;
                    write(&mut writer, Event::End(BytesStart::new("title").to_end().into_owned()))?;
                }
                Event::End(e) if e.local_name().as_ref() == b"head" => {
                    write(&mut writer, Event::Empty(self.provenance_meta()))?;
                    write(&mut writer, event.clone())?;
                }
                _ => write(&mut writer, event.clone())?,
            }
        }

        std::fs::write(path, writer.into_inner())?;
        Ok(())
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<(), HocrError> {
    writer
        .write_event(event)
        .map_err(|e| HocrError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head>
    <title>old title</title>
  </head>
  <body>
    <p><span class="ocr_line"><span>word</span></span></p>
  </body>
</html>"#;

    fn rewrite(rewriter: &HeaderRewriter) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_001_HOCR.shtml");
        std::fs::write(&path, FIXTURE).unwrap();

        let doc = HocrDocument::load(&path).unwrap();
        rewriter.process(&path, &doc).unwrap();
        std::fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn test_title_derived_from_file_name() {
        let out = rewrite(&HeaderRewriter::new(None, None));
        assert!(out.contains("<title>Image: page_001_JP2.jpg</title>"));
        assert!(!out.contains("old title"));
    }

    #[test]
    fn test_title_from_explicit_name() {
        let out = rewrite(&HeaderRewriter::new(None, Some("scan.jpg".to_string())));
        assert!(out.contains("<title>Image: scan.jpg</title>"));
    }

    #[test]
    fn test_provenance_meta_with_model() {
        let out = rewrite(&HeaderRewriter::new(Some(12345), None));
        assert!(out.contains(r#"name="ocr-system""#));
        assert!(out.contains(r#"content="Transkribus-HtrId:12345""#));
    }

    #[test]
    fn test_provenance_meta_without_model() {
        let out = rewrite(&HeaderRewriter::new(None, None));
        assert!(out.contains(r#"content="Transkribus""#));
    }

    #[test]
    fn test_no_byte_order_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_001_HOCR.shtml");
        std::fs::write(&path, FIXTURE).unwrap();

        let doc = HocrDocument::load(&path).unwrap();
        HeaderRewriter::new(None, None).process(&path, &doc).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_ne!(&bytes[..3], [0xEF, 0xBB, 0xBF]);
    }

    #[test]
    fn test_body_content_preserved() {
        let out = rewrite(&HeaderRewriter::new(None, None));
        assert!(out.contains(r#"<span class="ocr_line">"#));
        assert!(out.contains("word"));
    }

    #[test]
    fn test_title_for_non_hocr_name_kept_verbatim() {
        let rewriter = HeaderRewriter::new(None, None);
        let title = rewriter.title_for(&PathBuf::from("/x/scan.xml"));
        assert_eq!(title, "Image: scan.xml");
    }
}
