//! Minification of rendered HTML.
//!
//! Enabled through `[render] minify`; variations are never minified since
//! their format is up to the templates producing them.

use crate::config::RenderConfig;
use std::borrow::Cow;

/// Minify `html` if the config asks for it.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify<'a>(html: &'a str, config: &RenderConfig) -> Cow<'a, str> {
    if !config.minify {
        return Cow::Borrowed(html);
    }
    let bytes = minify_html_inner(html.as_bytes());
    match String::from_utf8(bytes) {
        Ok(minified) => Cow::Owned(minified),
        Err(_) => Cow::Borrowed(html),
    }
}

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}
