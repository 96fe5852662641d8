//! Markup transform tool contract.

use async_trait::async_trait;
use std::path::Path;

use super::command::run_and_capture;
use super::ToolError;

/// Transforms one recognition-result XML file into hOCR markup using a
/// compiled stylesheet. One invocation per file.
#[async_trait]
pub trait MarkupTransformer: Send + Sync {
    async fn transform(
        &self,
        stylesheet: &Path,
        input: &Path,
        output: &Path,
    ) -> Result<(), ToolError>;
}

/// Markup transformation via the `xslt3` command.
pub struct XsltTransformer {
    program: String,
}

impl XsltTransformer {
    pub fn new() -> Self {
        Self {
            program: "xslt3".to_string(),
        }
    }

    fn build_args(stylesheet: &Path, input: &Path, output: &Path) -> Vec<String> {
        vec![
            format!("-xsl:{}", stylesheet.display()),
            format!("-s:{}", input.display()),
            format!("-o:{}", output.display()),
        ]
    }
}

impl Default for XsltTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarkupTransformer for XsltTransformer {
    async fn transform(
        &self,
        stylesheet: &Path,
        input: &Path,
        output: &Path,
    ) -> Result<(), ToolError> {
        let args = Self::build_args(stylesheet, input, output);
        run_and_capture(&self.program, &args).await
    }
}
