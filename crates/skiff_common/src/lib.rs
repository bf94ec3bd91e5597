//! Shared foundational types used across the Skiff compiler driver.
//!
//! This crate provides the file type table consulted by every stage of job
//! construction and the internal error type used to report driver bugs.

#![warn(missing_docs)]

pub mod file_types;
pub mod result;

pub use file_types::{lookup_type_for_extension, FileType};
pub use result::{InternalError, SkiffResult};
