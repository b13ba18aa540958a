//! Styles – pulling the author's inline stylesheet out of exported markup,
//! generating the print stylesheet from [`LayoutSettings`], and merging a
//! separately supplied stylesheet into a document.

use crate::layout_config::LayoutSettings;
use crate::markup;

/// Border colour of table cells when `table_border_px > 0`.
pub const TABLE_BORDER_COLOR: &str = "#cccccc";
/// Background of even rows when striping is enabled.
pub const STRIPE_BACKGROUND: &str = "#f6f8fa";
/// Background of the hovered row when hover highlight is enabled.
pub const HOVER_BACKGROUND: &str = "#eef4ff";
/// Cell padding applied to every `th` / `td`.
pub const CELL_PADDING: &str = "6px 8px";

/// Return the inner text of the first `<style>` block, or an empty string.
///
/// Matching is case-insensitive and non-greedy. Malformed markup (an open
/// tag with no close) yields an empty string as well.
pub fn extract_inline_style(markup: &str) -> String {
    match markup::first_style_content(markup) {
        Some(css) => css.to_string(),
        None => {
            if markup::has_style_open(markup) {
                log::warn!("Style block is not closed; no inline style extracted");
            }
            String::new()
        }
    }
}

/// Build the print stylesheet for `layout`.
///
/// The output depends only on `layout`; equal settings always produce
/// byte-identical text.
pub fn build_print_stylesheet(layout: &LayoutSettings) -> String {
    let border = if layout.table_border_px == 0 {
        "none".to_string()
    } else {
        format!("{}px solid {}", layout.table_border_px, TABLE_BORDER_COLOR)
    };

    let mut css = String::new();
    css.push_str("* { -webkit-print-color-adjust: exact; print-color-adjust: exact; }\n");
    css.push_str("table { border-collapse: collapse; }\n");
    css.push_str(&format!(
        "th, td {{ border: {}; padding: {}; text-align: {}; }}\n",
        border,
        CELL_PADDING,
        layout.cell_align.as_css()
    ));
    if layout.striped_rows {
        css.push_str(&format!(
            "tr:nth-child(even) td {{ background-color: {}; }}\n",
            STRIPE_BACKGROUND
        ));
    }
    if layout.hover_highlight {
        css.push_str(&format!(
            "tr:hover td {{ background-color: {}; }}\n",
            HOVER_BACKGROUND
        ));
    }
    css
}

/// Merge a separately supplied stylesheet into `markup`.
///
/// - empty `css` → `markup` unchanged
/// - `</head>` present → `<style>` appended to the head
/// - `<body>` present without a head → a head is inserted before the body
/// - otherwise the fragment becomes the body of a minimal document
pub fn merge_style(markup: &str, css: &str) -> String {
    if css.trim().is_empty() {
        return markup.to_string();
    }
    let block = format!("<style>{css}</style>");

    if let Some(close) = markup::head_close(markup) {
        let mut out = String::with_capacity(markup.len() + block.len());
        out.push_str(&markup[..close.start]);
        out.push_str(&block);
        out.push_str(&markup[close.start..]);
        return out;
    }

    if let Some(body) = markup::body_open(markup) {
        let mut out = String::with_capacity(markup.len() + block.len() + 13);
        out.push_str(&markup[..body.start]);
        out.push_str("<head>");
        out.push_str(&block);
        out.push_str("</head>");
        out.push_str(&markup[body.start..]);
        return out;
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n{block}\n</head>\n<body>{markup}</body>\n</html>\n"
    )
}
