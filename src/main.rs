//! forge – compose editor templates and render them to PDF.
//!
//! Usage:
//!   forge <input.html> [output.pdf] [layout flags] [--css style.css]
//!   forge compose <input.html> [output.html] [layout flags] [--css style.css]
//!   forge serve [--bind 0.0.0.0:3003]
//!
//! If the output path is omitted it is written next to the input file with
//! the same stem (e.g. `invoice.html` → `invoice.pdf`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, process};

use template_forge::layout_config::{CellAlign, LayoutSettings, PageSize};
use template_forge::pipeline::{generate_pdf, RenderRequest};
use template_forge::render::Renderer;
use template_forge::server::{self, ServerConfig};

#[derive(Clone, Copy)]
enum Mode {
    Render,
    Compose,
    Serve,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("forge");

    let mut rest = args.iter().skip(1).peekable();
    let mode = match rest.peek().map(|s| s.as_str()) {
        Some("compose") => {
            rest.next();
            Mode::Compose
        }
        Some("serve") => {
            rest.next();
            Mode::Serve
        }
        _ => Mode::Render,
    };

    // Environment first, flags override.
    let mut server_config = ServerConfig::from_env();
    let mut layout = LayoutSettings::default();
    let mut css_path: Option<PathBuf> = None;
    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut positional = 0usize;

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--page-size" | "-s" => {
                layout.page_size = PageSize::from(required(&mut rest, arg, prog).as_str())
            }
            "--margin" | "-m" => layout.page_margin_px = number(&mut rest, arg, prog),
            "--border" | "-b" => layout.table_border_px = number(&mut rest, arg, prog),
            "--align" | "-a" => {
                layout.cell_align = CellAlign::from(required(&mut rest, arg, prog).as_str())
            }
            "--no-stripes" => layout.striped_rows = false,
            "--no-hover" => layout.hover_highlight = false,
            "--css" | "-c" => css_path = Some(PathBuf::from(required(&mut rest, arg, prog))),
            "--timeout" | "-t" => {
                let secs: u64 = number(&mut rest, arg, prog);
                server_config.renderer.load_timeout = Duration::from_secs(secs.max(1));
            }
            "--chrome" => {
                server_config.renderer.chrome_path =
                    Some(PathBuf::from(required(&mut rest, arg, prog)))
            }
            "--no-sandbox" => server_config.renderer.sandbox = false,
            "--bind" => {
                let value = required(&mut rest, arg, prog);
                server_config.bind = value.parse::<SocketAddr>().unwrap_or_else(|e| {
                    eprintln!("Invalid --bind address '{value}': {e}");
                    process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage(prog);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(prog);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(prog);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    match mode {
        Mode::Serve => {
            if let Err(e) = server::serve(server_config).await {
                eprintln!("Server error: {e}");
                process::exit(1);
            }
        }
        Mode::Compose => {
            let (input, request) = load_request(input_path, css_path, layout, prog);
            let output = output_path.unwrap_or_else(|| input.with_extension("composed.html"));
            let doc = request.compose();
            for note in doc.degradations() {
                eprintln!("Warning: {note}");
            }
            write_or_exit(&output, doc.as_str().as_bytes());
            eprintln!("Wrote '{}' ({} bytes)", output.display(), doc.as_str().len());
        }
        Mode::Render => {
            let (input, request) = load_request(input_path, css_path, layout, prog);
            let output = output_path.unwrap_or_else(|| input.with_extension("pdf"));
            let renderer = Renderer::chrome(server_config.renderer);
            match generate_pdf(&renderer, &request).await {
                Ok(pdf) => {
                    write_or_exit(&output, &pdf.bytes);
                    eprintln!(
                        "Wrote '{}' ({} bytes, {})",
                        output.display(),
                        pdf.len(),
                        pdf.format.paper
                    );
                }
                Err(e) => {
                    eprintln!("Error generating PDF: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

/// Read the input (and optional stylesheet) into a request.
fn load_request(
    input_path: Option<PathBuf>,
    css_path: Option<PathBuf>,
    layout: LayoutSettings,
    prog: &str,
) -> (PathBuf, RenderRequest) {
    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file given.");
            print_usage(prog);
            process::exit(1);
        }
    };

    let mut request = RenderRequest::new(read_or_exit(&input)).with_layout(layout);
    if let Some(css) = css_path {
        request = request.with_css(read_or_exit(&css));
    }
    (input, request)
}

fn required<'a>(
    rest: &mut impl Iterator<Item = &'a String>,
    flag: &str,
    prog: &str,
) -> String {
    match rest.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn number<'a, T: std::str::FromStr>(
    rest: &mut impl Iterator<Item = &'a String>,
    flag: &str,
    prog: &str,
) -> T {
    let value = required(rest, flag, prog);
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("{flag} expects a non-negative integer, got '{value}'");
            process::exit(1);
        }
    }
}

fn read_or_exit(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", path.display());
            process::exit(1);
        }
    }
}

fn write_or_exit(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("forge – template composer and PDF renderer (template-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.html> [output.pdf] [flags]     render to PDF");
    eprintln!("  {prog} compose <input.html> [output.html]    compose only, no browser");
    eprintln!("  {prog} serve [--bind ADDR]                   run the HTTP render endpoint");
    eprintln!();
    eprintln!("Layout flags:");
    eprintln!("  --page-size, -s  A4 | Letter | Legal (default A4; unknown → Letter)");
    eprintln!("  --margin, -m     page margin in px (default 20)");
    eprintln!("  --border, -b     table border width in px (default 1)");
    eprintln!("  --align, -a      left | center | right (default left)");
    eprintln!("  --no-stripes     disable striped table rows");
    eprintln!("  --no-hover       disable hover highlight rule");
    eprintln!("  --css, -c        separate stylesheet to merge into the document");
    eprintln!();
    eprintln!("Renderer flags:");
    eprintln!("  --timeout, -t    content-load timeout in seconds (default 30)");
    eprintln!("  --chrome         path to the Chromium binary");
    eprintln!("  --no-sandbox     launch Chromium without its sandbox");
    eprintln!();
    eprintln!("Environment: RUST_LOG, FORGE_BIND, PORT, CHROME_PATH,");
    eprintln!("             FORGE_LOAD_TIMEOUT_SECS, FORGE_NO_SANDBOX");
}
