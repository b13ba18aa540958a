//! Headless Chromium engine, driven over the DevTools protocol by
//! `headless_chrome`.
//!
//! The document is written to a private temp file and loaded with a normal
//! navigation. Quiescence is Chromium's own `networkIdle` lifecycle event
//! (no network connections for 500 ms), the same signal as puppeteer's
//! `networkidle0`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tempfile::NamedTempFile;

use crate::error::{RenderError, Result};
use crate::render::{Engine, EngineSession, PageFormat, RendererConfig};

/// Extra time the browser connection may stay silent beyond the load wait.
const IDLE_GRACE: Duration = Duration::from_secs(60);

/// How to launch Chromium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeConfig {
    /// Browser binary; `None` searches the usual install locations.
    pub path: Option<PathBuf>,
    pub sandbox: bool,
    /// Connection idle limit before the driver gives up on the browser.
    pub idle_timeout: Duration,
}

impl ChromeConfig {
    pub fn from_renderer(config: &RendererConfig) -> Self {
        Self {
            path: config.chrome_path.clone(),
            sandbox: config.sandbox,
            idle_timeout: config.load_timeout + IDLE_GRACE,
        }
    }
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self::from_renderer(&RendererConfig::default())
    }
}

/// Launches one headless Chromium process per render.
#[derive(Debug, Clone, Default)]
pub struct ChromeEngine {
    config: ChromeConfig,
}

impl ChromeEngine {
    pub fn new(config: ChromeConfig) -> Self {
        Self { config }
    }
}

impl Engine for ChromeEngine {
    fn launch(&self) -> Result<Box<dyn EngineSession>> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.config.sandbox)
            .path(self.config.path.clone())
            .idle_browser_timeout(self.config.idle_timeout)
            .build()
            .map_err(|e| RenderError::Launch(format!("invalid launch options: {e}")))?;

        let browser = Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))?;
        // If the tab cannot be opened the browser is dropped here, which kills
        // the process.
        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Launch(format!("failed to open page: {e}")))?;

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            tab: Some(tab),
            page_file: None,
        }))
    }
}

struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    /// Kept alive until teardown so the page can still resolve it.
    page_file: Option<NamedTempFile>,
}

impl ChromeSession {
    fn tab(&self) -> Result<&Arc<Tab>> {
        self.tab
            .as_ref()
            .ok_or_else(|| RenderError::Load("engine already torn down".into()))
    }
}

impl EngineSession for ChromeSession {
    fn load(&mut self, document: &str, timeout: Duration) -> Result<()> {
        let mut file = tempfile::Builder::new()
            .prefix("forge-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(document.as_bytes())?;
        file.flush()?;
        let url = format!("file://{}", file.path().display());
        self.page_file = Some(file);

        let tab = Arc::clone(self.tab()?);

        // Only count `networkIdle` for the document we navigate to, not a
        // late event from the initial blank page.
        let (idle_tx, idle_rx) = mpsc::sync_channel::<()>(1);
        let committed = AtomicBool::new(false);
        let listener = tab
            .add_event_listener(Arc::new(move |event: &Event| {
                if let Event::PageLifecycleEvent(lifecycle) = event {
                    match lifecycle.params.name.as_str() {
                        "init" => committed.store(true, Ordering::SeqCst),
                        "networkIdle" if committed.load(Ordering::SeqCst) => {
                            let _ = idle_tx.try_send(());
                        }
                        _ => {}
                    }
                }
            }))
            .map_err(|e| RenderError::Load(format!("cannot observe page lifecycle: {e}")))?;

        tab.set_default_timeout(timeout);
        let outcome = tab
            .navigate_to(&url)
            .map_err(|e| RenderError::Load(e.to_string()))
            .and_then(|_| {
                idle_rx
                    .recv_timeout(timeout)
                    .map_err(|_| RenderError::LoadTimeout(timeout))
            });

        if let Err(e) = tab.remove_event_listener(&listener) {
            log::debug!("Removing lifecycle listener failed: {e}");
        }
        outcome
    }

    fn print_pdf(&mut self, format: &PageFormat) -> Result<Vec<u8>> {
        let (paper_width, paper_height) = format.paper.inches();
        let (top, right, bottom, left) = format.margins.inches();

        let options = PrintToPdfOptions {
            landscape: Some(false),
            display_header_footer: Some(false),
            print_background: Some(format.print_background),
            scale: Some(1.0),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(top),
            margin_bottom: Some(bottom),
            margin_left: Some(left),
            margin_right: Some(right),
            prefer_css_page_size: Some(false),
            ..Default::default()
        };

        self.tab()?
            .print_to_pdf(Some(options))
            .map_err(|e| RenderError::Export(e.to_string()))
    }

    fn teardown(&mut self) {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(false) {
                log::debug!("Closing page failed: {e}");
            }
        }
        // Dropping the browser kills the Chromium process.
        self.browser.take();
        self.page_file.take();
    }
}
