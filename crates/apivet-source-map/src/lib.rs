//! # apivet-source-map
//!
//! Source file registry and position mapping.
//!
//! Every document apivet loads — from disk, over HTTP, or from an in-memory
//! fixture — is registered here under a [`FileId`]. The [`PositionMapper`]
//! converts flat byte offsets into (row, column) positions using a
//! precomputed index of line-break offsets, so later stages can report
//! precise locations without re-scanning file content.
//!
//! Offsets, rows, and columns are 0-indexed throughout; rendering code adds
//! 1 when displaying positions to humans.

mod context;
mod location;
mod mapper;

pub use context::{SourceContext, SourceFile};
pub use location::{FileId, Location, Range};
pub use mapper::PositionMapper;
