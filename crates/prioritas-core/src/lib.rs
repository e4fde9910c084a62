//! Prioritas Core
//!
//! Core types and utilities shared across Prioritas components.
//!
//! This crate provides:
//! - The complaint record and its enumerated fields (category, urgency, priority)
//! - Error types and result handling
//! - The read-only data-access interface used to feed historical complaints

pub mod error;
pub mod source;
pub mod types;

pub use error::{Error, Result};
pub use source::{ComplaintSource, FileSource, InMemorySource};
pub use types::{Category, Complaint, PriorityLabel, UrgencyLevel};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::source::{ComplaintSource, FileSource, InMemorySource};
    pub use crate::types::{Category, Complaint, PriorityLabel, UrgencyLevel};
}
