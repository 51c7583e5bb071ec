//! Immutable domain model types.
//!
//! This module contains the output of a successful compilation: every
//! classifier, association, enumeration, projection and service, fully
//! resolved and cross-referenced.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ lexer
//! Tokens
//!     ↓ parser
//! Syntax Tree - syntactic structure with spans
//!     ↓ compiler phases
//! Staging Elements - mutable, partially resolved
//!     ↓ build
//! Domain Model (these types) - resolved types, validated references
//! ```
//!
//! # Organization
//!
//! - [`domain`] - The [`DomainModel`] tables and name lookup
//! - [`classifier`] - [`Classifier`] and its modifiers
//! - [`property`] - [`DataTypeProperty`], [`ParameterizedProperty`] and [`Parameter`]
//! - [`association`] - [`Association`] and [`AssociationEnd`]
//! - [`criteria`] - [`Criteria`], [`Expression`] and [`OrderBy`]
//! - [`projection`] - [`Projection`] trees
//! - [`service`] - [`ServiceGroup`], [`Url`] and [`Service`]
//! - [`types`] - Typed indices, [`PrimitiveType`] and [`Multiplicity`]

pub mod association;
pub mod classifier;
pub mod criteria;
pub mod domain;
pub mod enumeration;
pub mod projection;
pub mod property;
pub mod service;
pub mod types;

pub use association::*;
pub use classifier::*;
pub use criteria::*;
pub use domain::*;
pub use enumeration::*;
pub use projection::*;
pub use property::*;
pub use service::*;
pub use types::*;
