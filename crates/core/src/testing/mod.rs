//! Test doubles for exercising the pipeline without external binaries.
//!
//! The object store needs no mock here; tests use
//! [`crate::store::StoreClient::in_memory`].

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedRender};
