//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Memory management
//! - Buffers returned by `forge_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `forge_free_buffer` / `forge_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int` (0 = success, non-zero = error).
//! - Error details can be retrieved via `forge_last_error`.
//!
//! ## Layout settings
//! Layout is passed as a null-terminated JSON string in the same camelCase
//! shape the HTTP endpoint accepts (`{"pageSize":"Letter","stripedRows":false}`).
//! `NULL` means defaults.
//!
//! ## Thread safety
//! - `forge_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads.
//! - `forge_render` blocks the calling thread for the whole render; each call
//!   launches and tears down its own browser.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::layout_config::LayoutSettings;
use crate::pipeline::{generate_pdf_blocking, RenderRequest};
use crate::render::{Renderer, RendererConfig};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Read `len` bytes at `ptr` as UTF-8.
///
/// # Safety
/// `ptr` must point to `len` valid bytes.
unsafe fn utf8_arg<'a>(ptr: *const u8, len: u32) -> Result<&'a str, c_int> {
    let bytes = slice::from_raw_parts(ptr, len as usize);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        2
    })
}

/// Optional null-terminated string argument.
///
/// # Safety
/// `ptr`, if non-null, must point to a valid null-terminated string.
unsafe fn optional_cstr<'a>(ptr: *const c_char, what: &str) -> Result<Option<&'a str>, c_int> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr).to_str().map(Some).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8 in {what}: {e}"));
        2
    })
}

/// # Safety
/// Same as [`optional_cstr`].
unsafe fn layout_arg(layout_json: *const c_char) -> Result<LayoutSettings, c_int> {
    match optional_cstr(layout_json, "layout")? {
        None => Ok(LayoutSettings::default()),
        Some(json) => LayoutSettings::from_json(json).map_err(|e| {
            set_last_error(&format!("Invalid layout JSON: {e}"));
            4
        }),
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Compose an HTML fragment into a print-ready document. No browser involved.
///
/// # Parameters
/// - `html_ptr`, `html_len`: UTF-8 markup (not necessarily null-terminated)
/// - `css`: optional null-terminated stylesheet to merge; `NULL` for none
/// - `layout_json`: optional null-terminated layout JSON; `NULL` for defaults
/// - `out_html`: receives a null-terminated composed document
///
/// # Returns
/// `0` on success. `1` null argument, `2` invalid UTF-8, `3` output contains
/// a null byte, `4` invalid layout JSON.
///
/// # Safety
/// - `html_ptr` must point to `html_len` valid bytes.
/// - `css` / `layout_json`, if non-null, must be valid null-terminated strings.
/// - `*out_html` must be freed with `forge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn forge_compose(
    html_ptr: *const u8,
    html_len: u32,
    css: *const c_char,
    layout_json: *const c_char,
    out_html: *mut *mut c_char,
) -> c_int {
    if html_ptr.is_null() || out_html.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let request = match build_request(html_ptr, html_len, css, layout_json) {
        Ok(r) => r,
        Err(code) => return code,
    };

    match CString::new(request.compose().into_string()) {
        Ok(cs) => {
            *out_html = cs.into_raw();
            0
        }
        Err(_) => {
            set_last_error("Composed document contained null byte");
            3
        }
    }
}

/// Compose and render to PDF with headless Chromium.
///
/// # Parameters
/// - `html_ptr`, `html_len`, `css`, `layout_json`: as for [`forge_compose`]
/// - `timeout_secs`: content-load timeout; `0` for the default (30 s)
/// - `out_buf`, `out_len`: on success, the PDF bytes
///
/// # Returns
/// `0` on success; `5` if rendering failed, other codes as for
/// [`forge_compose`].
///
/// # Safety
/// - Same as [`forge_compose`].
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` by calling `forge_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn forge_render(
    html_ptr: *const u8,
    html_len: u32,
    css: *const c_char,
    layout_json: *const c_char,
    timeout_secs: u32,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if html_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let request = match build_request(html_ptr, html_len, css, layout_json) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let mut config = RendererConfig::default();
    if timeout_secs > 0 {
        config.load_timeout = std::time::Duration::from_secs(u64::from(timeout_secs));
    }
    let renderer = Renderer::chrome(config);

    match generate_pdf_blocking(&renderer, &request) {
        Ok(pdf) => {
            let bytes = pdf.into_bytes();
            let len = bytes.len() as u32;
            let buf = bytes.into_boxed_slice();
            *out_buf = Box::into_raw(buf) as *mut u8;
            *out_len = len;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            5
        }
    }
}

unsafe fn build_request(
    html_ptr: *const u8,
    html_len: u32,
    css: *const c_char,
    layout_json: *const c_char,
) -> Result<RenderRequest, c_int> {
    let html = utf8_arg(html_ptr, html_len)?;
    let css = optional_cstr(css, "css")?;
    let layout = layout_arg(layout_json)?;

    let mut request = RenderRequest::new(html).with_layout(layout);
    if let Some(css) = css {
        request = request.with_css(css);
    }
    Ok(request)
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a buffer previously returned by `forge_render`.
///
/// # Safety
/// `buf` must have been returned by this library with the matching `len`.
#[no_mangle]
pub unsafe extern "C" fn forge_free_buffer(buf: *mut u8, len: u32) {
    if buf.is_null() {
        return;
    }
    let slice = ptr::slice_from_raw_parts_mut(buf, len as usize);
    drop(Box::from_raw(slice));
}

/// Free a string previously returned by `forge_compose`.
///
/// # Safety
/// `s` must have been returned by this library.
#[no_mangle]
pub unsafe extern "C" fn forge_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(CString::from_raw(s));
}

/// Last error message on this thread, or `NULL`. Owned by the library; valid
/// until the next failing call on the same thread.
#[no_mangle]
pub extern "C" fn forge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cs) => cs.as_ptr(),
        None => ptr::null(),
    })
}

/// Library version as a static null-terminated string.
#[no_mangle]
pub extern "C" fn forge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
