//! Pipeline orchestration.
//!
//! One `PipelineRun` drives the whole flow for a batch or a single page:
//! stage images, convert, submit through the throttle, poll, transform
//! finished results, run the markup chain, publish.

mod error;
mod options;
mod runner;
mod staging;

pub use error::PipelineError;
pub use options::{OcrOptions, RepoOptions, SinglePageOptions, UploadOptions};
pub use runner::PipelineRun;
pub use staging::StagingDir;
