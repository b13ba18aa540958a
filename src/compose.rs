//! Composer – turns an exported markup fragment plus [`LayoutSettings`] into
//! one self-contained document: the generated print stylesheet merged into
//! the head and the body content wrapped in a page-geometry container.
//!
//! Composition is pure and never fails. Anything unexpected in the input is
//! recorded as a [`Degradation`] and the best-effort document is returned.

use std::fmt;
use std::ops::Range;

use crate::error::Degradation;
use crate::layout_config::LayoutSettings;
use crate::markup;
use crate::style::build_print_stylesheet;

/// Attribute carried by the page wrapper `<div>`; appears once per document.
pub const PAGE_WRAPPER_MARKER: &str = "data-forge-page";
/// Attribute carried by the generated `<style>` block.
pub const PRINT_STYLE_MARKER: &str = "data-forge-print";
/// Class name of the page wrapper, for template authors who want to target it.
pub const PAGE_WRAPPER_CLASS: &str = "forge-page";

/// A document ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDocument {
    html: String,
    degradations: Vec<Degradation>,
}

impl ComposedDocument {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    /// Fallbacks taken while composing (empty for clean input).
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    pub fn is_degraded(&self) -> bool {
        self.degradations
            .iter()
            .any(|d| !matches!(d, Degradation::AlreadyComposed))
    }
}

impl AsRef<str> for ComposedDocument {
    fn as_ref(&self) -> &str {
        &self.html
    }
}

impl fmt::Display for ComposedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// `true` if `markup` already went through [`compose`], i.e. it contains a
/// `<div>` tag carrying the wrapper attribute. Text that merely mentions the
/// attribute name does not count.
pub fn is_composed(markup: &str) -> bool {
    markup::has_page_wrapper(markup)
}

/// Compose `markup` with `layout`.
///
/// - markup containing `<body>`: the body's inner content is wrapped and the
///   stylesheet goes first in the head (a head is created when missing)
/// - any other fragment: a full document skeleton is produced around it
/// - markup that is already composed is returned unchanged, so the wrapper
///   never nests
pub fn compose(markup: &str, layout: &LayoutSettings) -> ComposedDocument {
    if is_composed(markup) {
        log::debug!("Markup already carries a page wrapper, skipping composition");
        return ComposedDocument {
            html: markup.to_string(),
            degradations: vec![Degradation::AlreadyComposed],
        };
    }

    let mut degradations = Vec::new();
    if markup::has_style_open(markup) && markup::first_style_content(markup).is_none() {
        degradations.push(Degradation::UnclosedStyleBlock);
    }

    let wrapper = page_wrapper_open(layout);
    let style = print_style_block(layout);

    let html = match markup::body_open(markup) {
        Some(body) => compose_document(markup, body, &wrapper, &style, &mut degradations),
        None => compose_fragment(markup, &wrapper, &style),
    };

    for note in &degradations {
        log::warn!("Composition degraded: {note}");
    }

    ComposedDocument { html, degradations }
}

fn page_wrapper_open(layout: &LayoutSettings) -> String {
    let geometry = layout.page_size.geometry();
    format!(
        "<div class=\"{}\" {} style=\"width: {}; min-height: {}; padding: {}px; box-sizing: border-box; margin: 0 auto;\">",
        PAGE_WRAPPER_CLASS,
        PAGE_WRAPPER_MARKER,
        geometry.width(),
        geometry.height(),
        layout.page_margin_px
    )
}

fn print_style_block(layout: &LayoutSettings) -> String {
    format!(
        "<style {}>\n{}</style>",
        PRINT_STYLE_MARKER,
        build_print_stylesheet(layout)
    )
}

fn compose_fragment(markup: &str, wrapper: &str, style: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n{style}\n</head>\n<body>\n{wrapper}{markup}</div>\n</body>\n</html>\n"
    )
}

fn compose_document(
    markup: &str,
    body: Range<usize>,
    wrapper: &str,
    style: &str,
    degradations: &mut Vec<Degradation>,
) -> String {
    let mut wrapped = String::with_capacity(markup.len() + wrapper.len() + 6);
    wrapped.push_str(&markup[..body.end]);
    wrapped.push_str(wrapper);
    match markup::body_close_after(markup, body.end) {
        Some(close) => {
            wrapped.push_str(&markup[body.end..close.start]);
            wrapped.push_str("</div>");
            wrapped.push_str(&markup[close.start..]);
        }
        None => {
            degradations.push(Degradation::UnclosedBody);
            wrapped.push_str(&markup[body.end..]);
            wrapped.push_str("</div>");
        }
    }

    // Everything before the body tag is untouched by wrapping, so head
    // positions found in that prefix are still valid.
    insert_head_style(&wrapped, body.start, style)
}

fn insert_head_style(doc: &str, body_start: usize, style: &str) -> String {
    let prefix = &doc[..body_start];
    let (at, insert) = if let Some(head) = markup::head_open(prefix) {
        (head.end, style.to_string())
    } else if let Some(html) = markup::html_open(prefix) {
        (html.end, format!("<head>{style}</head>"))
    } else {
        // Content ahead of the doctype would drop the page into quirks mode.
        let at = markup::doctype(prefix).map_or(0, |d| d.end);
        (at, format!("<head>{style}</head>"))
    };

    let mut out = String::with_capacity(doc.len() + insert.len());
    out.push_str(&doc[..at]);
    out.push_str(&insert);
    out.push_str(&doc[at..]);
    out
}
