//! Klass Core Types
//!
//! This crate provides the foundational types shared by the Klass compiler
//! and its consumers:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Model**: The immutable, index-based domain model ([`model`] module)

pub mod identifier;
pub mod model;
