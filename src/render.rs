//! Renderer – converts a composed document into PDF bytes by driving a
//! disposable browser-engine instance.
//!
//! Each call acquires its own engine through [`Engine::launch`] and holds it
//! in an [`EngineScope`]. The scope tears the engine down when dropped, so
//! the instance is released on success, on error, on the load timeout and
//! while unwinding from a panic. Nothing is shared between calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::chrome::{ChromeConfig, ChromeEngine};
use crate::error::{RenderError, Result};
use crate::layout_config::PageSize;

/// Default bound on the content-load (network quiescence) wait.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// CSS pixels per inch.
const PX_PER_INCH: f64 = 96.0;

/// Sheet margins in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub const fn uniform(px: u32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// `(top, right, bottom, left)` in inches.
    pub fn inches(&self) -> (f64, f64, f64, f64) {
        (
            px_to_inches(self.top),
            px_to_inches(self.right),
            px_to_inches(self.bottom),
            px_to_inches(self.left),
        )
    }
}

fn px_to_inches(px: u32) -> f64 {
    f64::from(px) / PX_PER_INCH
}

/// Paper and margin settings for the PDF export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFormat {
    pub paper: PageSize,
    pub print_background: bool,
    pub margins: Margins,
}

impl Default for PageFormat {
    /// A4, backgrounds on, 20px on every side.
    fn default() -> Self {
        Self {
            paper: PageSize::A4,
            print_background: true,
            margins: Margins::uniform(20),
        }
    }
}

/// The output of a successful render.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub format: PageFormat,
}

impl RenderedPdf {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Starts browser-engine instances.
pub trait Engine: Send + Sync + 'static {
    /// Launch one fresh, isolated instance with a single page open.
    fn launch(&self) -> Result<Box<dyn EngineSession>>;
}

/// One running engine instance, exclusively owned by one render call.
pub trait EngineSession: Send {
    /// Load `document` and block until the network is quiet or `timeout`
    /// elapses (→ [`RenderError::LoadTimeout`]).
    fn load(&mut self, document: &str, timeout: Duration) -> Result<()>;

    /// Paginate the loaded page and return the PDF bytes.
    fn print_pdf(&mut self, format: &PageFormat) -> Result<Vec<u8>>;

    /// Release the instance. Must be safe to call more than once.
    fn teardown(&mut self);
}

/// Owns an [`EngineSession`] for the duration of one render and tears it
/// down when dropped.
pub struct EngineScope {
    session: Box<dyn EngineSession>,
}

impl EngineScope {
    pub fn acquire(engine: &dyn Engine) -> Result<Self> {
        let session = engine.launch()?;
        log::debug!("Engine instance launched");
        Ok(Self { session })
    }

    pub fn load(&mut self, document: &str, timeout: Duration) -> Result<()> {
        self.session.load(document, timeout)
    }

    pub fn print_pdf(&mut self, format: &PageFormat) -> Result<Vec<u8>> {
        self.session.print_pdf(format)
    }
}

impl Drop for EngineScope {
    fn drop(&mut self) {
        self.session.teardown();
        log::debug!("Engine instance torn down");
    }
}

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Bound on the wait for network quiescence after loading content.
    pub load_timeout: Duration,
    /// Browser binary; `None` lets the driver locate one.
    pub chrome_path: Option<PathBuf>,
    /// Run the browser inside its OS sandbox.
    pub sandbox: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            chrome_path: None,
            sandbox: true,
        }
    }
}

/// Converts composed documents to PDF. Cheap to clone; clones share only the
/// (stateless) engine launcher.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn Engine>,
    config: RendererConfig,
}

impl Renderer {
    pub fn new(engine: impl Engine, config: RendererConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
        }
    }

    /// Renderer backed by headless Chromium.
    pub fn chrome(config: RendererConfig) -> Self {
        let engine = ChromeEngine::new(ChromeConfig::from_renderer(&config));
        Self::new(engine, config)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render `document` to PDF.
    ///
    /// Engine work runs on the blocking pool so waiting on the browser never
    /// stalls other requests on the runtime.
    pub async fn render(&self, document: &str, format: &PageFormat) -> Result<RenderedPdf> {
        let engine = Arc::clone(&self.engine);
        let document = document.to_string();
        let format = format.clone();
        let timeout = self.config.load_timeout;

        tokio::task::spawn_blocking(move || render_with(engine.as_ref(), &document, &format, timeout))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }

    /// Blocking variant of [`Renderer::render`] for callers without a runtime.
    pub fn render_blocking(&self, document: &str, format: &PageFormat) -> Result<RenderedPdf> {
        render_with(
            self.engine.as_ref(),
            document,
            format,
            self.config.load_timeout,
        )
    }
}

/// One complete render on the current thread: launch, load, export, tear
/// down.
pub fn render_with(
    engine: &dyn Engine,
    document: &str,
    format: &PageFormat,
    load_timeout: Duration,
) -> Result<RenderedPdf> {
    let started = Instant::now();
    let mut scope = EngineScope::acquire(engine).map_err(|e| {
        log::warn!("Engine launch failed: {e}");
        e
    })?;

    if let Err(e) = scope.load(document, load_timeout) {
        log::warn!("Document load failed: {e}");
        return Err(e);
    }

    let bytes = scope.print_pdf(format)?;
    if !bytes.starts_with(b"%PDF-") {
        return Err(RenderError::Export(format!(
            "engine returned {} bytes without a PDF header",
            bytes.len()
        )));
    }

    log::info!(
        "Rendered {} byte PDF ({}) in {:?}",
        bytes.len(),
        format.paper,
        started.elapsed()
    );

    Ok(RenderedPdf {
        bytes,
        format: format.clone(),
    })
}
