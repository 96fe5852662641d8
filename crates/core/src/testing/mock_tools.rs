//! Mock raster converter and markup transformer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tools::{MarkupTransformer, RasterConverter, ToolError};

/// Mock raster conversion: copies the source bytes to the destination and
/// records the invocation.
#[derive(Debug, Default)]
pub struct MockRasterConverter {
    conversions: Arc<RwLock<Vec<(PathBuf, PathBuf)>>>,
    next_error: Arc<RwLock<Option<String>>>,
}

impl MockRasterConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn conversions(&self) -> Vec<(PathBuf, PathBuf)> {
        self.conversions.read().await.clone()
    }

    pub async fn fail_next(&self, stderr: &str) {
        *self.next_error.write().await = Some(stderr.to_string());
    }
}

#[async_trait]
impl RasterConverter for MockRasterConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        if let Some(stderr) = self.next_error.write().await.take() {
            return Err(ToolError::Failed {
                program: "convert".to_string(),
                code: 1,
                stderr,
            });
        }
        std::fs::copy(input, output)?;
        self.conversions
            .write()
            .await
            .push((input.to_path_buf(), output.to_path_buf()));
        Ok(())
    }
}

/// A minimal hOCR document the mock transformer produces by default.
pub const DEFAULT_MARKUP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head>
    <title>unknown</title>
  </head>
  <body>
    <div class="ocr_page">
      <p class="ocr_par">
        <span class="ocr_line"><span class="ocrx_word">recognized</span> <span class="ocrx_word">text</span></span>
      </p>
    </div>
  </body>
</html>"#;

/// Mock markup transformation: writes a fixture hOCR document to the
/// destination and records the invocation.
#[derive(Debug)]
pub struct MockMarkupTransformer {
    markup: Arc<RwLock<String>>,
    transforms: Arc<RwLock<Vec<(PathBuf, PathBuf)>>>,
    next_error: Arc<RwLock<Option<String>>>,
}

impl Default for MockMarkupTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarkupTransformer {
    pub fn new() -> Self {
        Self {
            markup: Arc::new(RwLock::new(DEFAULT_MARKUP.to_string())),
            transforms: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the fixture document written on transform.
    pub async fn set_markup(&self, markup: &str) {
        *self.markup.write().await = markup.to_string();
    }

    pub async fn transforms(&self) -> Vec<(PathBuf, PathBuf)> {
        self.transforms.read().await.clone()
    }

    pub async fn fail_next(&self, stderr: &str) {
        *self.next_error.write().await = Some(stderr.to_string());
    }
}

#[async_trait]
impl MarkupTransformer for MockMarkupTransformer {
    async fn transform(
        &self,
        _stylesheet: &Path,
        input: &Path,
        output: &Path,
    ) -> Result<(), ToolError> {
        if let Some(stderr) = self.next_error.write().await.take() {
            return Err(ToolError::Failed {
                program: "xslt3".to_string(),
                code: 2,
                stderr,
            });
        }
        std::fs::write(output, self.markup.read().await.as_bytes())?;
        self.transforms
            .write()
            .await
            .push((input.to_path_buf(), output.to_path_buf()));
        Ok(())
    }
}
