//! # Domain Layer
//!
//! Pure types and rules: no storage, no transport.

pub mod entities;
pub mod errors;
pub mod identifier;
pub mod lifecycle;
pub mod node_type;
pub mod outcome;
pub mod payloads;
pub mod topic;
