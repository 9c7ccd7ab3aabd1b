//! `tollgate-core`: claim model and error taxonomy shared by every layer.
//!
//! This crate contains **no IO**: it only describes what a verified token
//! looks like once decoded and how failures are reported.

pub mod claims;
pub mod error;

pub use claims::{ClaimSet, ClaimValue};
pub use error::{AuthError, AuthResult, ClaimShapeIssue};
