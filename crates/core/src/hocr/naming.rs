//! Filename derivations between pipeline stages.
//!
//! Stage artifacts share a page stem and differ by suffix:
//! `<stem>_JP2.jp2` -> `<stem>_JP2.jpg` -> `<stem>_ALTO.xml` ->
//! `<stem>_HOCR.shtml` -> `<stem>_OCR.asc`.

use std::path::Path;

pub const RESULT_SUFFIX: &str = "_ALTO.xml";
pub const MARKUP_SUFFIX: &str = "_HOCR.shtml";
pub const TEXT_SUFFIX: &str = "_OCR.asc";
pub const IMAGE_SUFFIX: &str = "_JP2.jpg";

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn swap_suffix(name: &str, from: &str, to: &str) -> String {
    match name.strip_suffix(from) {
        Some(stem) => format!("{}{}", stem, to),
        None => name.to_string(),
    }
}

/// Source image name a markup file was recognized from.
pub fn source_image_name(markup_path: &Path) -> String {
    swap_suffix(&file_name(markup_path), MARKUP_SUFFIX, IMAGE_SUFFIX)
}

/// Plain-text artifact name derived from a markup file.
pub fn text_file_name(markup_path: &Path) -> String {
    swap_suffix(&file_name(markup_path), MARKUP_SUFFIX, TEXT_SUFFIX)
}

/// Markup artifact name derived from a recognition-result file.
pub fn markup_file_name(result_path: &Path) -> String {
    swap_suffix(&file_name(result_path), RESULT_SUFFIX, MARKUP_SUFFIX)
}

/// Repository page identifier encoded in a converted image name.
pub fn pid_from_image_name(image_path: &Path) -> String {
    let name = file_name(image_path);
    name.strip_suffix(IMAGE_SUFFIX).unwrap_or(&name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_source_image_name() {
        assert_eq!(
            source_image_name(&PathBuf::from("/tmp/book_42_HOCR.shtml")),
            "book_42_JP2.jpg"
        );
    }

    #[test]
    fn test_text_file_name() {
        assert_eq!(
            text_file_name(&PathBuf::from("/tmp/book_42_HOCR.shtml")),
            "book_42_OCR.asc"
        );
    }

    #[test]
    fn test_markup_file_name() {
        assert_eq!(
            markup_file_name(&PathBuf::from("/tmp/book_42_ALTO.xml")),
            "book_42_HOCR.shtml"
        );
    }

    #[test]
    fn test_pid_from_image_name() {
        assert_eq!(
            pid_from_image_name(&PathBuf::from("/tmp/book:42_JP2.jpg")),
            "book:42"
        );
    }

    #[test]
    fn test_unmatched_suffix_is_kept() {
        assert_eq!(
            text_file_name(&PathBuf::from("/tmp/readme.txt")),
            "readme.txt"
        );
        assert_eq!(pid_from_image_name(&PathBuf::from("/tmp/scan.png")), "scan.png");
    }
}
