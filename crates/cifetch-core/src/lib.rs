//! cifetch - Core Library
//!
//! Types, configuration, annotation extraction and file materialization for
//! retrieving files produced by a hosted code interpreter.

pub mod config;
pub mod error;
pub mod extractor;
pub mod materializer;
pub mod preview;
pub mod report;
pub mod types;

pub use config::*;
pub use error::*;
pub use extractor::*;
pub use materializer::*;
pub use preview::*;
pub use report::*;
pub use types::*;
