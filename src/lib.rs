//! # template-forge – editor templates → print-ready PDF
//!
//! A template designed in a visual editor (markup with `{{Object.Field}}`
//! merge tags) is turned into a paginated PDF in two stages:
//!
//! 1. **Compose** – merge an optional separate stylesheet, inject the print
//!    stylesheet generated from [`LayoutSettings`] and wrap the content in a
//!    page-geometry container ([`mod@compose`]). Pure, never fails.
//! 2. **Render** – load the composed document in a freshly launched headless
//!    browser, wait for network quiescence and export a PDF ([`render`]).
//!    The browser is torn down on every exit path.
//!
//! [`pipeline`] runs both; [`server`] exposes them over HTTP and [`ffi`]
//! over a C ABI. Merge tags are never resolved here.

pub mod chrome;
pub mod compose;
pub mod error;
pub mod export;
pub mod ffi;
pub mod layout_config;
mod markup;
pub mod merge_tags;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use compose::{compose, ComposedDocument};
pub use error::{Degradation, RenderError, TemplateError};
pub use layout_config::{resolve_page_geometry, CellAlign, LayoutSettings, PageGeometry, PageSize};
pub use merge_tags::MergeTag;
pub use pipeline::{generate_pdf, RenderRequest};
pub use render::{PageFormat, RenderedPdf, Renderer, RendererConfig};
pub use style::{build_print_stylesheet, extract_inline_style, merge_style};
