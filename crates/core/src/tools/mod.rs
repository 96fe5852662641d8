//! External command-line tool contracts.
//!
//! The pipeline treats these as opaque commands: the exit code and the
//! captured standard-error stream are the whole contract. Each concern is a
//! trait so tests can swap in mock implementations.

mod command;
mod error;
mod raster;
mod repository;
mod transform;

pub use error::ToolError;
pub use raster::{ImageMagickConverter, RasterConverter};
pub use repository::{Datastream, DrushRepository, RepoContext, Repository};
pub use transform::{MarkupTransformer, XsltTransformer};
