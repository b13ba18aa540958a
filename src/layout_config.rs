//! Layout settings – the page and table formatting options chosen in the
//! editor, and the fixed physical geometry of each supported paper size.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Paper size of the printed document.
///
/// Parsing never fails: unrecognised names resolve to [`PageSize::Letter`],
/// the fixed fallback geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Case-insensitive lookup; `None` for names we do not know.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "letter" => Some(PageSize::Letter),
            "legal" => Some(PageSize::Legal),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        }
    }

    /// Physical dimensions of the sheet.
    pub fn geometry(self) -> PageGeometry {
        match self {
            PageSize::A4 => PageGeometry::new(210, 297),
            PageSize::Letter => PageGeometry::new(216, 279),
            PageSize::Legal => PageGeometry::new(216, 356),
        }
    }

    /// Sheet size in inches, the unit `Page.printToPDF` expects.
    pub fn inches(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (8.27, 11.69),
            PageSize::Letter => (8.5, 11.0),
            PageSize::Legal => (8.5, 14.0),
        }
    }
}

impl From<&str> for PageSize {
    fn from(name: &str) -> Self {
        PageSize::parse(name).unwrap_or_else(|| {
            log::warn!("Unknown page size '{name}', using Letter geometry");
            PageSize::Letter
        })
    }
}

impl From<String> for PageSize {
    fn from(name: String) -> Self {
        PageSize::from(name.as_str())
    }
}

impl From<PageSize> for String {
    fn from(size: PageSize) -> Self {
        size.name().to_string()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default horizontal alignment of table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CellAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl CellAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            CellAlign::Left => "left",
            CellAlign::Center => "center",
            CellAlign::Right => "right",
        }
    }
}

impl From<&str> for CellAlign {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" => CellAlign::Center,
            "right" => CellAlign::Right,
            "left" => CellAlign::Left,
            other => {
                log::warn!("Unknown cell alignment '{other}', using left");
                CellAlign::Left
            }
        }
    }
}

impl From<String> for CellAlign {
    fn from(value: String) -> Self {
        CellAlign::from(value.as_str())
    }
}

impl From<CellAlign> for String {
    fn from(align: CellAlign) -> Self {
        align.as_css().to_string()
    }
}

/// Fixed physical page dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width_mm: u32,
    pub height_mm: u32,
}

impl PageGeometry {
    pub const fn new(width_mm: u32, height_mm: u32) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// CSS length for the width, e.g. `"210mm"`.
    pub fn width(&self) -> String {
        format!("{}mm", self.width_mm)
    }

    /// CSS length for the height, e.g. `"297mm"`.
    pub fn height(&self) -> String {
        format!("{}mm", self.height_mm)
    }
}

/// Map a page size name to its geometry. Unknown names get the Letter
/// dimensions.
pub fn resolve_page_geometry(page_size: &str) -> PageGeometry {
    PageSize::from(page_size).geometry()
}

/// Page and table formatting options for one template.
///
/// Numeric fields are unsigned, so the non-negative invariant holds by
/// construction. Missing JSON keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    pub page_size: PageSize,
    /// Padding of the page wrapper, in CSS pixels.
    pub page_margin_px: u32,
    /// Width of table cell borders, in CSS pixels.
    pub table_border_px: u32,
    /// Alternate background on even table rows.
    pub striped_rows: bool,
    /// Highlight background on hovered rows.
    pub hover_highlight: bool,
    pub cell_align: CellAlign,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            page_margin_px: 20,
            table_border_px: 1,
            striped_rows: true,
            hover_highlight: true,
            cell_align: CellAlign::Left,
        }
    }
}

impl LayoutSettings {
    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
