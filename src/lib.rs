//! Media ingestion for the school administration back office
//!
//! Validates uploaded logos and avatars, normalizes raster images into a
//! bounded size and format, picks the payload that fits the storage ceiling,
//! and publishes it to S3-compatible object storage under a deterministic key.

pub mod clock;
pub mod error;
pub mod feedback;
pub mod image;
pub mod mime;
pub mod models;
pub mod naming;
pub mod pipeline;
pub mod policy;
pub mod storage;
pub mod validation;

pub use error::{Error, PipelineError, Result};
