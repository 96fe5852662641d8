pub mod config;
pub mod hocr;
pub mod htr;
pub mod page;
pub mod pipeline;
pub mod testing;
pub mod tools;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, PipelineConfig,
    RepositoryConfig, SanitizedConfig,
};
pub use hocr::{run_chain, HeaderRewriter, HocrDocument, HocrError, HocrProcessor, OcrExtractor};
pub use htr::{HtrClient, HtrError, Throttle, TranskribusClient};
pub use page::{NewPage, Page, PageError, PageState, PageStore, SqlitePageStore};
pub use pipeline::{
    OcrOptions, PipelineError, PipelineRun, RepoOptions, SinglePageOptions, UploadOptions,
};
pub use tools::{
    Datastream, DrushRepository, ImageMagickConverter, MarkupTransformer, RasterConverter,
    RepoContext, Repository, ToolError, XsltTransformer,
};
