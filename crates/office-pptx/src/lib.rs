//! # office-pptx
//!
//! PPTX (Office Open XML) editing for the PowerPoint document strategy.
//!
//! A presentation is held as its package of parts. Slides, layouts and masters
//! are parsed into element trees; every other part (media, theme, notes,
//! properties) stays as bytes. On save only the parts that were edited are
//! serialized again, so untouched slides come back byte for byte.
//!
//! Slide positions in this crate are 0-based.

pub mod content_types;
pub mod error;
pub mod package;
pub mod presentation;
pub mod rels;
pub mod shape;
pub mod slide;
pub mod template;
pub mod xml;

pub use error::{PptxError, PptxResult};
pub use presentation::{LayoutInfo, Presentation};
pub use shape::{ShapeKind, Transform};
