//! Error taxonomy.
//!
//! - [`RenderError`] – fatal for a single render request (engine launch,
//!   content-load timeout, PDF export).
//! - [`Degradation`] – non-fatal notes produced while composing; the
//!   composer always yields a document.
//! - [`TemplateError`] – refusing to build a persisted-template payload.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// A render request failed. No partial PDF is ever returned alongside it.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The engine process could not be started (missing binary, no sandbox
    /// support on the host, ...).
    #[error("failed to launch rendering engine: {0}")]
    Launch(String),

    /// The page never reached network quiescence.
    #[error("content did not reach network quiescence within {0:?}")]
    LoadTimeout(Duration),

    /// The engine rejected the document before the quiescence wait.
    #[error("failed to load document: {0}")]
    Load(String),

    /// `Page.printToPDF` failed or produced something that is not a PDF.
    #[error("PDF export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The blocking render worker was cancelled or panicked.
    #[error("render task aborted: {0}")]
    Task(String),
}

impl RenderError {
    /// `true` when the failure was the bounded content-load wait.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::LoadTimeout(_))
    }
}

/// Best-effort fallbacks taken by the composer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// A `<style>` open tag without a matching close; no style extracted.
    #[error("style block is not closed; treated as empty")]
    UnclosedStyleBlock,

    /// `<body>` without `</body>`; the page wrapper is closed at end of input.
    #[error("body is not closed; page wrapper closed at end of document")]
    UnclosedBody,

    /// Input already carried a page wrapper and was passed through.
    #[error("document already composed; left unchanged")]
    AlreadyComposed,
}

/// The persisted-template payload could not be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template name must not be empty")]
    MissingName,

    #[error("an object must be selected before saving a template")]
    MissingObject,
}
