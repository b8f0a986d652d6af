//! Foundation types shared by every other layer.
//!
//! - [`FileId`] - stable file handles
//! - [`Vfs`] - path ↔ file id mapping with directory-relative lookup
//! - [`TextRange`], [`TextSize`] - source positions
//!
//! This module has NO dependencies on other quarry modules.

mod vfs;

pub use vfs::{FileId, Vfs};

pub use text_size::{TextRange, TextSize};
