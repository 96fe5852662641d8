//! Mock implementations of the external seams, for tests.

mod mock_htr_client;
mod mock_repository;
mod mock_tools;

pub use mock_htr_client::{MockHtrClient, RecordedSubmission};
pub use mock_repository::{MockRepository, PushedDirectory, PushedFile};
pub use mock_tools::{MockMarkupTransformer, MockRasterConverter, DEFAULT_MARKUP};
