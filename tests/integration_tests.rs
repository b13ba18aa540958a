//! Integration tests for the template-forge pipeline.
//!
//! These tests validate:
//! - Print stylesheet generation is pure and honours every layout flag
//! - Composition yields one page wrapper with the stylesheet ahead of content
//! - The renderer tears its engine down on every exit path
//! - Concurrent renders do not interfere
//! - The HTTP endpoint returns PDFs and textual failures

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use template_forge::compose::{compose, PAGE_WRAPPER_MARKER, PRINT_STYLE_MARKER};
use template_forge::error::{Degradation, RenderError, Result};
use template_forge::layout_config::{resolve_page_geometry, CellAlign, LayoutSettings, PageSize};
use template_forge::pipeline::{generate_pdf, RenderRequest};
use template_forge::render::{
    Engine, EngineSession, Margins, PageFormat, Renderer, RendererConfig,
};
use template_forge::server;
use template_forge::style::{build_print_stylesheet, extract_inline_style};
use template_forge::templates;

// =====================================================================
// Helpers
// =====================================================================

/// What the fake engine does on `load`.
#[derive(Clone, Copy, Debug)]
enum Behaviour {
    Succeed,
    /// Never reaches quiescence: waits out the timeout, then fails.
    NeverIdle,
    Panic,
    RefuseLaunch,
}

/// Engine double that counts live instances, the way a harness would count
/// browser processes.
struct FakeEngine {
    behaviour: Behaviour,
    live: Arc<AtomicUsize>,
    launched: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    load_delay: Duration,
}

struct FakeSession {
    behaviour: Behaviour,
    live: Arc<AtomicUsize>,
    load_delay: Duration,
    document: Option<String>,
    torn_down: bool,
}

impl FakeEngine {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            live: Arc::new(AtomicUsize::new(0)),
            launched: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            load_delay: Duration::ZERO,
        }
    }

    fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (
            Arc::clone(&self.live),
            Arc::clone(&self.launched),
            Arc::clone(&self.peak),
        )
    }
}

impl Engine for FakeEngine {
    fn launch(&self) -> Result<Box<dyn EngineSession>> {
        if let Behaviour::RefuseLaunch = self.behaviour {
            return Err(RenderError::Launch("sandbox unavailable".into()));
        }
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            behaviour: self.behaviour,
            live: Arc::clone(&self.live),
            load_delay: self.load_delay,
            document: None,
            torn_down: false,
        }))
    }
}

impl EngineSession for FakeSession {
    fn load(&mut self, document: &str, timeout: Duration) -> Result<()> {
        match self.behaviour {
            Behaviour::NeverIdle => {
                thread::sleep(timeout);
                Err(RenderError::LoadTimeout(timeout))
            }
            Behaviour::Panic => panic!("engine crashed while loading"),
            _ => {
                thread::sleep(self.load_delay);
                self.document = Some(document.to_string());
                Ok(())
            }
        }
    }

    fn print_pdf(&mut self, format: &PageFormat) -> Result<Vec<u8>> {
        let document = self
            .document
            .as_deref()
            .ok_or_else(|| RenderError::Export("nothing loaded".into()))?;
        Ok(format!(
            "%PDF-1.7\n% paper={} background={}\n{}\n%%EOF\n",
            format.paper, format.print_background, document
        )
        .into_bytes())
    }

    fn teardown(&mut self) {
        if !self.torn_down {
            self.torn_down = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

fn renderer(engine: FakeEngine, load_timeout: Duration) -> Renderer {
    Renderer::new(
        engine,
        RendererConfig {
            load_timeout,
            ..RendererConfig::default()
        },
    )
}

fn a4_print_format() -> PageFormat {
    PageFormat {
        paper: PageSize::A4,
        print_background: true,
        margins: Margins::uniform(20),
    }
}

fn all_layouts() -> Vec<LayoutSettings> {
    let mut layouts = Vec::new();
    for page_size in [PageSize::A4, PageSize::Letter, PageSize::Legal] {
        for cell_align in [CellAlign::Left, CellAlign::Center, CellAlign::Right] {
            for striped_rows in [true, false] {
                for hover_highlight in [true, false] {
                    for table_border_px in [0, 1, 4] {
                        layouts.push(LayoutSettings {
                            page_size,
                            page_margin_px: 20,
                            table_border_px,
                            striped_rows,
                            hover_highlight,
                            cell_align,
                        });
                    }
                }
            }
        }
    }
    layouts
}

fn digest(text: &str) -> Vec<u8> {
    Sha256::digest(text.as_bytes()).to_vec()
}

// =====================================================================
// Composer
// =====================================================================

#[test]
fn print_stylesheet_is_pure() {
    for layout in all_layouts() {
        let first = build_print_stylesheet(&layout);
        let second = build_print_stylesheet(&layout.clone());
        assert_eq!(digest(&first), digest(&second), "layout {:?}", layout);
    }
}

#[test]
fn stylesheet_differs_only_when_table_settings_differ() {
    // Page size and margin do not affect the stylesheet.
    let mut seen = HashSet::new();
    for layout in all_layouts() {
        if layout.page_size == PageSize::A4 {
            seen.insert(digest(&build_print_stylesheet(&layout)));
        }
    }
    // 3 alignments × 2 stripe × 2 hover × 3 border widths.
    assert_eq!(seen.len(), 36);

    for layout in all_layouts() {
        let a4 = LayoutSettings {
            page_size: PageSize::A4,
            page_margin_px: 0,
            ..layout.clone()
        };
        assert_eq!(build_print_stylesheet(&layout), build_print_stylesheet(&a4));
    }
}

#[test]
fn extract_inline_style_never_fails() {
    assert_eq!(extract_inline_style("<table><tr><td>A</td></tr></table>"), "");
    assert_eq!(extract_inline_style("<style"), "");
    assert_eq!(extract_inline_style("</style><style>"), "");
    assert_eq!(
        extract_inline_style(templates::invoice_template()).trim_start().lines().next(),
        Some("body { font-family: Arial, sans-serif; color: #1a202c; }")
    );
}

#[test]
fn page_geometry_table() {
    let a4 = resolve_page_geometry("A4");
    assert_eq!((a4.width(), a4.height()), ("210mm".to_string(), "297mm".to_string()));
    let letter = resolve_page_geometry("Letter");
    assert_eq!((letter.width(), letter.height()), ("216mm".to_string(), "279mm".to_string()));
    assert_eq!(resolve_page_geometry("unknown"), letter);
}

#[test]
fn compose_reference_example() {
    let layout = LayoutSettings {
        page_size: PageSize::A4,
        page_margin_px: 20,
        table_border_px: 1,
        striped_rows: true,
        hover_highlight: true,
        cell_align: CellAlign::Left,
    };
    let markup = "<table><tr><td>A</td></tr></table>";
    let doc = compose(markup, &layout);
    let html = doc.as_str();

    assert_eq!(html.matches(PAGE_WRAPPER_MARKER).count(), 1);
    assert!(html.contains("tr:nth-child(even) td"));
    assert!(html.contains("tr:hover td"));
    assert!(html.contains("width: 210mm"));
    assert!(html.find(PRINT_STYLE_MARKER).unwrap() < html.find(markup).unwrap());
}

#[test]
fn compose_every_layout_and_template() {
    let multi = templates::multi_page_template();
    let sources = [
        templates::invoice_template(),
        templates::letter_template(),
        multi.as_str(),
        templates::minimal_template(),
        templates::malformed_template(),
    ];
    for layout in all_layouts() {
        for source in sources {
            let doc = compose(source, &layout);
            let html = doc.as_str();
            assert_eq!(html.matches(PAGE_WRAPPER_MARKER).count(), 1);
            assert_eq!(html.matches(PRINT_STYLE_MARKER).count(), 1);
            let wrapper = html.find(PAGE_WRAPPER_MARKER).unwrap();
            assert!(html.find(PRINT_STYLE_MARKER).unwrap() < wrapper);
            assert!(html.contains(&format!("width: {}", layout.page_size.geometry().width())));
        }
    }
}

#[test]
fn malformed_export_degrades_instead_of_failing() {
    let doc = compose(templates::malformed_template(), &LayoutSettings::default());
    assert_eq!(
        doc.degradations(),
        &[Degradation::UnclosedStyleBlock, Degradation::UnclosedBody]
    );
    assert!(doc.as_str().contains("{{Lead.Company}}"));
}

#[test]
fn recomposition_is_a_no_op() {
    let request = RenderRequest::new(templates::invoice_template());
    let once = request.compose();
    let again = RenderRequest::new(once.as_str()).compose();
    assert_eq!(again.as_str(), once.as_str());
}

// =====================================================================
// Renderer
// =====================================================================

#[tokio::test]
async fn render_minimal_document() {
    let engine = FakeEngine::new(Behaviour::Succeed);
    let (live, launched, _) = engine.counters();
    let renderer = renderer(engine, Duration::from_secs(5));

    let pdf = renderer
        .render("<html><body>Hello</body></html>", &a4_print_format())
        .await
        .unwrap();

    assert!(!pdf.is_empty());
    assert_eq!(&pdf.bytes[0..5], b"%PDF-");
    assert_eq!(pdf.format, a4_print_format());
    assert_eq!(launched.load(Ordering::SeqCst), 1);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn forced_timeout_fails_and_leaves_nothing_running() {
    let engine = FakeEngine::new(Behaviour::NeverIdle);
    let (live, launched, _) = engine.counters();
    let renderer = renderer(engine, Duration::from_millis(50));

    let err = renderer
        .render("<img src=\"http://10.255.255.1/never.png\">", &a4_print_format())
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert_eq!(launched.load(Ordering::SeqCst), 1);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn engine_panic_still_tears_down() {
    let engine = FakeEngine::new(Behaviour::Panic);
    let (live, _, _) = engine.counters();
    let renderer = renderer(engine, Duration::from_secs(1));

    let err = renderer.render("<p>x</p>", &a4_print_format()).await.unwrap_err();

    assert!(matches!(err, RenderError::Task(_)), "unexpected error: {err}");
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn launch_failure_is_a_render_failure() {
    let engine = FakeEngine::new(Behaviour::RefuseLaunch);
    let (live, launched, _) = engine.counters();
    let renderer = renderer(engine, Duration::from_secs(1));

    let err = renderer.render("<p>x</p>", &a4_print_format()).await.unwrap_err();

    assert!(matches!(err, RenderError::Launch(_)));
    assert_eq!(launched.load(Ordering::SeqCst), 0);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_renders_do_not_interfere() {
    let engine = FakeEngine::new(Behaviour::Succeed).with_load_delay(Duration::from_millis(100));
    let (live, launched, peak) = engine.counters();
    let renderer = renderer(engine, Duration::from_secs(5));

    let first = RenderRequest::new("<p>first {{Account.Name}}</p>");
    let second = RenderRequest::new("<p>second {{Contact.Email}}</p>").with_layout(LayoutSettings {
        page_size: PageSize::Letter,
        ..LayoutSettings::default()
    });

    let (a, b) = tokio::join!(
        generate_pdf(&renderer, &first),
        generate_pdf(&renderer, &second)
    );
    let a = String::from_utf8(a.unwrap().into_bytes()).unwrap();
    let b = String::from_utf8(b.unwrap().into_bytes()).unwrap();

    assert!(a.contains("first {{Account.Name}}") && !a.contains("second"));
    assert!(b.contains("second {{Contact.Email}}") && !b.contains("first"));
    assert!(a.contains("paper=A4"));
    assert!(b.contains("paper=Letter"));

    assert_eq!(launched.load(Ordering::SeqCst), 2);
    assert_eq!(peak.load(Ordering::SeqCst), 2, "each call owns its own instance");
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pipeline_renders_composed_document() {
    let engine = FakeEngine::new(Behaviour::Succeed);
    let renderer = renderer(engine, Duration::from_secs(5));

    let request = RenderRequest::new("<table><tr><td>A</td></tr></table>")
        .with_css("td { font-weight: bold; }");
    let pdf = generate_pdf(&renderer, &request).await.unwrap();
    let text = String::from_utf8(pdf.bytes.clone()).unwrap();

    assert!(text.contains(PAGE_WRAPPER_MARKER));
    assert!(text.contains("td { font-weight: bold; }"));
    assert_eq!(pdf.format.margins, Margins::uniform(0));
}

// =====================================================================
// HTTP endpoint
// =====================================================================

async fn post_json(app: axum::Router, body: serde_json::Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .uri("/generate-pdf")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn endpoint_returns_pdf() {
    let engine = FakeEngine::new(Behaviour::Succeed);
    let (live, _, _) = engine.counters();
    let app = server::app(renderer(engine, Duration::from_secs(5)));

    let response = post_json(
        app,
        serde_json::json!({
            "html": "<p>{{Account.Name}}</p>",
            "css": "p { color: #333; }",
            "layout": { "pageSize": "Legal", "stripedRows": false },
            "fileName": "Account_Summary"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Account_Summary.pdf\""
    );

    let body = body_bytes(response).await;
    assert_eq!(&body[0..5], b"%PDF-");
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("paper=Legal"));
    assert!(text.contains("{{Account.Name}}"));
    assert!(!text.contains("nth-child"));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn endpoint_reports_timeout_as_text() {
    let engine = FakeEngine::new(Behaviour::NeverIdle);
    let (live, _, _) = engine.counters();
    let app = server::app(renderer(engine, Duration::from_millis(20)));

    let response = post_json(app, serde_json::json!({ "html": "<p>x</p>" })).await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with("PDF generation failed"));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn endpoint_reports_launch_failure() {
    let app = server::app(renderer(
        FakeEngine::new(Behaviour::RefuseLaunch),
        Duration::from_secs(1),
    ));

    let response = post_json(app, serde_json::json!({ "html": "<p>x</p>" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("sandbox unavailable"));
}

#[tokio::test]
async fn endpoint_rejects_bad_body() {
    let app = server::app(renderer(
        FakeEngine::new(Behaviour::Succeed),
        Duration::from_secs(1),
    ));

    let response = post_json(app, serde_json::json!({ "css": "p{}" })).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn health_routes() {
    let app = server::app(renderer(
        FakeEngine::new(Behaviour::Succeed),
        Duration::from_secs(1),
    ));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "template-forge");
}

// =====================================================================
// Real browser
// =====================================================================

#[tokio::test]
#[ignore = "requires a Chromium installation"]
async fn chromium_renders_invoice() {
    let renderer = Renderer::chrome(RendererConfig {
        sandbox: false,
        ..RendererConfig::default()
    });
    let request = RenderRequest::new(templates::invoice_template());
    let pdf = generate_pdf(&renderer, &request).await.unwrap();
    assert!(pdf.len() > 100, "PDF too small: {} bytes", pdf.len());
    assert_eq!(&pdf.bytes[0..5], b"%PDF-");
}
