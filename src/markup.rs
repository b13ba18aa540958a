//! Tag scanning over raw markup text.
//!
//! Editor output is trusted, so we locate the handful of structural tags we
//! care about with case-insensitive patterns instead of building a DOM.
//! Nested or commented-out tags are not special-cased.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).unwrap_or_else(|e| panic!("bad pattern {source}: {e}")))
}

fn style_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?is)<style\b[^>]*>(.*?)</style\s*>")
}

fn style_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)<style\b")
}

fn doctype_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)^\s*<!doctype\b[^>]*>")
}

fn page_wrapper_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)<div\b[^>]*\sdata-forge-page\b")
}

fn html_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)<html\b[^>]*>")
}

fn head_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)<head\b[^>]*>")
}

fn head_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)</head\s*>")
}

fn body_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)<body\b[^>]*>")
}

fn body_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?i)</body\s*>")
}

/// Inner text of the first complete `<style>` block.
pub(crate) fn first_style_content(markup: &str) -> Option<&str> {
    style_block()
        .captures(markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `true` when a `<style` open tag exists at all.
pub(crate) fn has_style_open(markup: &str) -> bool {
    style_open().is_match(markup)
}

/// Leading `<!DOCTYPE ...>` declaration, allowing whitespace before it.
pub(crate) fn doctype(markup: &str) -> Option<Range<usize>> {
    doctype_re().find(markup).map(|m| m.range())
}

/// `true` when a `<div>` open tag carries the page wrapper attribute.
pub(crate) fn has_page_wrapper(markup: &str) -> bool {
    page_wrapper_re().is_match(markup)
}

pub(crate) fn html_open(markup: &str) -> Option<Range<usize>> {
    html_open_re().find(markup).map(|m| m.range())
}

pub(crate) fn head_open(markup: &str) -> Option<Range<usize>> {
    head_open_re().find(markup).map(|m| m.range())
}

pub(crate) fn head_close(markup: &str) -> Option<Range<usize>> {
    head_close_re().find(markup).map(|m| m.range())
}

pub(crate) fn body_open(markup: &str) -> Option<Range<usize>> {
    body_open_re().find(markup).map(|m| m.range())
}

/// Last `</body>` at or after `from`.
pub(crate) fn body_close_after(markup: &str, from: usize) -> Option<Range<usize>> {
    body_close_re()
        .find_iter(&markup[from..])
        .last()
        .map(|m| (m.start() + from)..(m.end() + from))
}
