//! Shared types for the proc-modernize refactoring rules.
//!
//! This crate provides the building blocks the rule crate and the command-line
//! driver share:
//!
//! - **Source location tracking**: [`Span`], [`SourcePos`], [`SourceRange`], [`Location`]
//! - **Source buffers**: [`SourceBuffer`], [`LineIndex`]
//! - **Diagnostics**: [`Diagnostic`], [`Severity`], [`FixIt`]
//!
//! # Design Principles
//!
//! - **Plain data**: apart from `serde` derives the crate has no external
//!   dependencies. Rule crates add `miette`/`thiserror` on top for rich
//!   error rendering.
//! - **Byte offsets first**: spans are byte ranges into a normalized buffer;
//!   line/column pairs are derived through a [`LineIndex`].

mod diagnostic;
mod fixit;
mod source;
mod span;

pub use diagnostic::{Diagnostic, Severity};
pub use fixit::{apply_fixits, FixIt, FixItError};
pub use source::{normalize_line_endings, LineIndex, SourceBuffer};
pub use span::{Location, SourcePos, SourceRange, Span};
