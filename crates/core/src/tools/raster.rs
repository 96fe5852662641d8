//! Raster format conversion tool contract.

use async_trait::async_trait;
use std::path::Path;

use super::command::run_and_capture;
use super::ToolError;

/// Converts one source raster into the format the recognition service
/// accepts. One invocation per file.
#[async_trait]
pub trait RasterConverter: Send + Sync {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Raster conversion via ImageMagick's `convert`.
pub struct ImageMagickConverter {
    program: String,
}

impl ImageMagickConverter {
    pub fn new() -> Self {
        Self {
            program: "convert".to_string(),
        }
    }
}

impl Default for ImageMagickConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RasterConverter for ImageMagickConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let args = vec![
            input.display().to_string(),
            output.display().to_string(),
        ];
        run_and_capture(&self.program, &args).await
    }
}
