//! hOCR markup processing.
//!
//! A batch pass parses each markup file exactly once and hands the parsed
//! document to every processor in the chain, so the chain cost is one parse
//! per file no matter how many processors run.

mod document;
mod header;
pub mod naming;
mod ocr_text;

pub use document::HocrDocument;
pub use header::HeaderRewriter;
pub use ocr_text::OcrExtractor;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur processing hOCR markup.
#[derive(Debug, Error)]
pub enum HocrError {
    /// The markup could not be parsed.
    #[error("Failed to parse hOCR document: {0}")]
    Parse(String),

    /// The rewritten markup could not be serialized.
    #[error("Failed to serialize hOCR document: {0}")]
    Serialize(String),

    /// I/O error reading or writing markup files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One transformation over parsed hOCR markup.
///
/// `init` runs once per batch before any file is touched; `process` runs
/// once per file and receives the shared parse.
pub trait HocrProcessor: Send + Sync {
    fn init(&self) -> Result<(), HocrError>;
    fn process(&self, path: &Path, doc: &HocrDocument) -> Result<(), HocrError>;
}

/// Run a chain of processors over every markup file in a directory.
pub fn run_chain(dir: &Path, processors: &[&dyn HocrProcessor]) -> Result<(), HocrError> {
    for processor in processors {
        processor.init()?;
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for file in &files {
        let doc = HocrDocument::load(file)?;
        for processor in processors {
            processor.process(file, &doc)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProcessor {
        inits: AtomicUsize,
        processed: AtomicUsize,
    }

    impl CountingProcessor {
        fn new() -> Self {
            Self {
                inits: AtomicUsize::new(0),
                processed: AtomicUsize::new(0),
            }
        }
    }

    impl HocrProcessor for CountingProcessor {
        fn init(&self) -> Result<(), HocrError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn process(&self, _path: &Path, _doc: &HocrDocument) -> Result<(), HocrError> {
            self.processed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    const DOC: &str =
        r#"<html xmlns="http://www.w3.org/1999/xhtml"><head><title>t</title></head><body/></html>"#;

    #[test]
    fn test_chain_inits_once_and_processes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_HOCR.shtml"), DOC).unwrap();
        std::fs::write(dir.path().join("b_HOCR.shtml"), DOC).unwrap();

        let first = CountingProcessor::new();
        let second = CountingProcessor::new();
        run_chain(dir.path(), &[&first, &second]).unwrap();

        assert_eq!(first.inits.load(Ordering::SeqCst), 1);
        assert_eq!(second.inits.load(Ordering::SeqCst), 1);
        assert_eq!(first.processed.load(Ordering::SeqCst), 2);
        assert_eq!(second.processed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_chain_over_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let processor = CountingProcessor::new();
        run_chain(dir.path(), &[&processor]).unwrap();
        assert_eq!(processor.inits.load(Ordering::SeqCst), 1);
        assert_eq!(processor.processed.load(Ordering::SeqCst), 0);
    }
}
