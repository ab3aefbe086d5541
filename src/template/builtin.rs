//! Built-in templates.
//!
//! A minimal set so a record can be rendered without host code:
//!
//! | Key       | Kind      | Fields            | Areas   |
//! |-----------|-----------|-------------------|---------|
//! | `page`    | page      | `title`, `lang`   | `main`  |
//! | `section` | component | `title`           | `body`  |
//! | `heading` | component | `text`            |         |
//! | `text`    | component | `body`            |         |
//! | `list`    | component | `items`           | `items` |
//!
//! All of them support the `txt` variation (plain text). In edit mode every
//! component element carries a `data-folio-path` attribute.

use anyhow::{Result, bail};
use async_trait::async_trait;
use quick_xml::escape::escape;
use serde_json::Value;
use std::fmt::Write;

use super::{Template, TemplateRegistry};
use crate::render::{AreaOutputs, RenderCtx};
use crate::tree::Scope;

/// Plain-text variation understood by every built-in.
pub const TEXT_EXTENSION: &str = "txt";

/// Register every built-in template.
pub fn register(registry: &mut TemplateRegistry) {
    registry
        .register_page("page", PageTemplate)
        .register_component("section", SectionTemplate)
        .register_component("heading", HeadingTemplate)
        .register_component("text", TextTemplate)
        .register_component("list", ListTemplate);
}

/// `data-folio-path` attribute in edit mode, empty otherwise.
fn edit_attr(scope: &Scope) -> String {
    if scope.edit_mode() {
        format!(r#" data-folio-path="{}""#, escape(scope.path()))
    } else {
        String::new()
    }
}

fn header_level(scope: &Scope) -> u8 {
    scope.render_ctx().map_or(1, |ctx| ctx.header_level)
}

/// Join non-empty variation chunks with blank lines.
fn paragraphs<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim_end)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn text_only(extension: &str) -> Result<()> {
    if extension != TEXT_EXTENSION {
        bail!("unsupported variation `{extension}`");
    }
    Ok(())
}

// ============================================================================
// page
// ============================================================================

pub struct PageTemplate;

#[async_trait]
impl Template for PageTemplate {
    fn render(&self, scope: &Scope, children: &AreaOutputs) -> Result<String> {
        let title = scope.str_field("title").unwrap_or_default();
        let lang = scope
            .inherited("lang")
            .and_then(Value::as_str)
            .unwrap_or("en");

        let mut html = String::from("<!DOCTYPE html>");
        write!(
            html,
            r#"<html lang="{}"><head><meta charset="utf-8"><title>{}</title>{}</head>"#,
            escape(lang),
            escape(title),
            scope.page().head_content(),
        )?;
        write!(
            html,
            "<body{}><main>{}</main></body></html>",
            edit_attr(scope),
            children.joined("main")
        )?;
        Ok(html)
    }

    fn render_variation(
        &self,
        scope: &Scope,
        extension: &str,
        children: &AreaOutputs,
    ) -> Result<String> {
        text_only(extension)?;
        let title = scope.str_field("title").unwrap_or_default();
        let body: Vec<_> = children.get("main").iter().map(String::as_str).collect();
        let mut text = paragraphs(std::iter::once(title).chain(body));
        text.push('\n');
        Ok(text)
    }
}

// ============================================================================
// section
// ============================================================================

/// Groups its `body` under a heading one level deeper than its parent's.
pub struct SectionTemplate;

#[async_trait]
impl Template for SectionTemplate {
    async fn set_context(&self, _scope: &Scope, parent: &RenderCtx) -> Result<RenderCtx> {
        Ok(parent.nested())
    }

    fn render(&self, scope: &Scope, children: &AreaOutputs) -> Result<String> {
        let mut html = format!("<section{}>", edit_attr(scope));
        if let Some(title) = scope.str_field("title") {
            let level = header_level(scope);
            write!(html, "<h{level}>{}</h{level}>", escape(title))?;
        }
        html.push_str(&children.joined("body"));
        html.push_str("</section>");
        Ok(html)
    }

    fn render_variation(
        &self,
        scope: &Scope,
        extension: &str,
        children: &AreaOutputs,
    ) -> Result<String> {
        text_only(extension)?;
        let title = scope.str_field("title").unwrap_or_default();
        let body: Vec<_> = children.get("body").iter().map(String::as_str).collect();
        Ok(paragraphs(std::iter::once(title).chain(body)))
    }
}

// ============================================================================
// heading
// ============================================================================

/// A heading one level below the enclosing section's title.
pub struct HeadingTemplate;

#[async_trait]
impl Template for HeadingTemplate {
    fn render(&self, scope: &Scope, _children: &AreaOutputs) -> Result<String> {
        let Some(text) = scope.str_field("text") else {
            bail!("heading without `text`");
        };
        let level = header_level(scope).saturating_add(1).min(6);
        Ok(format!(
            "<h{level}{}>{}</h{level}>",
            edit_attr(scope),
            escape(text)
        ))
    }

    fn render_variation(
        &self,
        scope: &Scope,
        extension: &str,
        _children: &AreaOutputs,
    ) -> Result<String> {
        text_only(extension)?;
        Ok(scope.str_field("text").unwrap_or_default().to_string())
    }
}

// ============================================================================
// text
// ============================================================================

pub struct TextTemplate;

#[async_trait]
impl Template for TextTemplate {
    fn render(&self, scope: &Scope, _children: &AreaOutputs) -> Result<String> {
        let body = scope.str_field("body").unwrap_or_default();
        Ok(format!("<p{}>{}</p>", edit_attr(scope), escape(body)))
    }

    fn render_variation(
        &self,
        scope: &Scope,
        extension: &str,
        _children: &AreaOutputs,
    ) -> Result<String> {
        text_only(extension)?;
        Ok(scope.str_field("body").unwrap_or_default().to_string())
    }
}

// ============================================================================
// list
// ============================================================================

/// `items` strings first, then one `<li>` per child of the `items` area.
pub struct ListTemplate;

impl ListTemplate {
    fn items(scope: &Scope) -> Result<Vec<&str>> {
        match scope.field("items") {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.as_str()),
                    other => bail!("list item must be a string, got {other}"),
                })
                .collect(),
            Some(other) => bail!("`items` must be an array, got {other}"),
        }
    }
}

#[async_trait]
impl Template for ListTemplate {
    fn render(&self, scope: &Scope, children: &AreaOutputs) -> Result<String> {
        let mut html = format!("<ul{}>", edit_attr(scope));
        for item in Self::items(scope)? {
            write!(html, "<li>{}</li>", escape(item))?;
        }
        for child in children.get("items").iter().filter(|c| !c.is_empty()) {
            write!(html, "<li>{child}</li>")?;
        }
        html.push_str("</ul>");
        Ok(html)
    }

    fn render_variation(
        &self,
        scope: &Scope,
        extension: &str,
        children: &AreaOutputs,
    ) -> Result<String> {
        text_only(extension)?;
        let children = children.get("items").iter().map(String::as_str);
        let lines: Vec<_> = Self::items(scope)?
            .into_iter()
            .chain(children)
            .filter(|line| !line.is_empty())
            .map(|line| format!("- {line}"))
            .collect();
        Ok(lines.join("\n"))
    }
}
