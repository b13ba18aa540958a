//! Pipeline – ties together style merging, composition and rendering into a
//! single call.

use serde::{Deserialize, Serialize};

use crate::compose::{compose, ComposedDocument};
use crate::error::Result;
use crate::layout_config::LayoutSettings;
use crate::render::{Margins, PageFormat, RenderedPdf, Renderer};
use crate::style::merge_style;

/// One render job: markup, an optional separate stylesheet, and the layout
/// chosen in the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub html: String,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub layout: LayoutSettings,
}

impl RenderRequest {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub fn with_layout(mut self, layout: LayoutSettings) -> Self {
        self.layout = layout;
        self
    }

    /// Merge the separate stylesheet (if any) and compose.
    pub fn compose(&self) -> ComposedDocument {
        match self.css.as_deref() {
            Some(css) => compose(&merge_style(&self.html, css), &self.layout),
            None => compose(&self.html, &self.layout),
        }
    }

    /// Export format for a composed document.
    ///
    /// Sheet margins are zero: the page margin is already the padding of the
    /// page wrapper.
    pub fn page_format(&self) -> PageFormat {
        PageFormat {
            paper: self.layout.page_size,
            print_background: true,
            margins: Margins::default(),
        }
    }
}

/// Full pipeline: request → composed document → PDF bytes.
pub async fn generate_pdf(renderer: &Renderer, request: &RenderRequest) -> Result<RenderedPdf> {
    let document = request.compose();
    renderer.render(document.as_str(), &request.page_format()).await
}

/// Blocking variant of [`generate_pdf`].
pub fn generate_pdf_blocking(renderer: &Renderer, request: &RenderRequest) -> Result<RenderedPdf> {
    let document = request.compose();
    renderer.render_blocking(document.as_str(), &request.page_format())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{PAGE_WRAPPER_MARKER, PRINT_STYLE_MARKER};
    use crate::layout_config::PageSize;

    #[test]
    fn separate_css_lands_in_head_after_print_rules() {
        let request = RenderRequest::new("<table><tr><td>A</td></tr></table>")
            .with_css("td { color: navy; }");
        let doc = request.compose();
        let html = doc.as_str();
        assert_eq!(html.matches(PAGE_WRAPPER_MARKER).count(), 1);
        let generated = html.find(PRINT_STYLE_MARKER).unwrap();
        let authored = html.find("td { color: navy; }").unwrap();
        let body = html.find("<td>A</td>").unwrap();
        assert!(generated < authored && authored < body);
    }

    #[test]
    fn fragment_is_standards_mode_with_or_without_css() {
        let bare = RenderRequest::new("<p>x</p>").compose();
        let styled = RenderRequest::new("<p>x</p>").with_css("p{}").compose();
        assert!(bare.as_str().starts_with("<!DOCTYPE html>"));
        assert!(styled.as_str().starts_with("<!DOCTYPE html>"));
        assert_eq!(styled.as_str().matches("<!DOCTYPE").count(), 1);
    }

    #[test]
    fn page_format_follows_layout() {
        let request = RenderRequest::new("<p>x</p>").with_layout(LayoutSettings {
            page_size: PageSize::Legal,
            ..LayoutSettings::default()
        });
        let format = request.page_format();
        assert_eq!(format.paper, PageSize::Legal);
        assert!(format.print_background);
        assert_eq!(format.margins, Margins::uniform(0));
    }

    #[test]
    fn request_json_shape() {
        let request: RenderRequest = serde_json::from_str(
            r#"{"html":"<p>x</p>","css":"p{}","layout":{"pageSize":"Letter"}}"#,
        )
        .unwrap();
        assert_eq!(request.css.as_deref(), Some("p{}"));
        assert_eq!(request.layout.page_size, PageSize::Letter);
        assert_eq!(request.layout.page_margin_px, 20);

        let bare: RenderRequest = serde_json::from_str(r#"{"html":"<p>x</p>"}"#).unwrap();
        assert_eq!(bare.css, None);
        assert_eq!(bare.layout, LayoutSettings::default());
    }
}
