//! Single-parse hOCR document model.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

use super::HocrError;

/// An hOCR file parsed once into an owned event buffer.
///
/// Every processor in a chain receives the same parse, so a file is never
/// read or parsed more than once per pass.
pub struct HocrDocument {
    events: Vec<Event<'static>>,
}

impl HocrDocument {
    /// Parse a document from an XML string.
    pub fn parse(xml: &str) -> Result<Self, HocrError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut events = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(event) => events.push(event.into_owned()),
                Err(e) => return Err(HocrError::Parse(e.to_string())),
            }
        }

        Ok(Self { events })
    }

    /// Parse a document from a file.
    pub fn load(path: &Path) -> Result<Self, HocrError> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse(&xml)
    }

    /// The parsed event stream.
    pub(crate) fn events(&self) -> &[Event<'static>] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_document() {
        let doc = HocrDocument::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
  <body><p>hello</p></body>
</html>"#,
        )
        .unwrap();
        assert!(!doc.events().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_document() {
        let result = HocrDocument::parse("<html><head></html>");
        assert!(matches!(result, Err(HocrError::Parse(_))));
    }
}
