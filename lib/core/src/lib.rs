//! Core domain types and utilities for the cogflow platform.
//!
//! This crate provides the foundational ID types and error handling
//! shared by every other crate in the workspace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{DagId, JobId, ParseIdError, StepId, TriggerId, WorkflowId};
