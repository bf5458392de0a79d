//! Fixed-layout PDF rendering of the CRT paper form.
//!
//! - `units`: millimeter anchors → PDF device coordinates
//! - `layout`: declarative field → anchor table, validated once at startup
//! - `font`: best-effort TrueType embedding with a built-in fallback
//! - `pdf`: minimal deterministic PDF object writer
//! - `renderer`: the render state machine

pub mod font;
pub mod layout;
pub mod pdf;
pub mod renderer;
pub mod units;

pub use font::{FontError, FontSource, LoadedFont};
pub use layout::{Cell, LayoutEntry, LayoutError, LayoutTable, Piece, Section};
pub use renderer::{PdfRenderer, RenderedPdf, render};
pub use units::{A4_HEIGHT_PT, A4_WIDTH_PT, Anchor, DevicePoint, MM_TO_PT, to_device};
