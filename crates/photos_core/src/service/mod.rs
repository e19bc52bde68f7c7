//! Use-case services over the model tree.
//!
//! # Responsibility
//! - Expose the operations the presentation layer triggers.
//! - Persist the whole tree after each successful mutation.

pub mod library_service;
