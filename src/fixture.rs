//! Build [`VNode`] trees from HTML markup, for fixtures and the CLI.
//!
//! Conversion follows what a hyperscript call would produce: the selector is
//! `tag.class…#id`, other attributes land in the property bag, and an element
//! whose only content is one text run keeps it as inline `text`.

use std::path::Path;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Node};
use serde_json::Value;
use tracing::debug;

use crate::vnode::{Properties, VNode};

/// Parse an HTML fragment and return its first top-level element.
pub fn parse(html: &str) -> Result<VNode> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    let first = root
        .children()
        .find_map(ElementRef::wrap)
        .context("HTML fragment contains no element")?;
    let node = convert(first);
    debug!(html_len = html.len(), selector = %node.selector, "parsed fixture");
    Ok(node)
}

/// Read and [`parse`] an HTML file.
pub fn load(path: impl AsRef<Path>) -> Result<VNode> {
    let path = path.as_ref();
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    parse(&html)
}

fn convert(element: ElementRef) -> VNode {
    let el = element.value();
    let mut node = VNode::new(build_selector(el));

    let attributes: Vec<(&str, &str)> = el
        .attrs()
        .filter(|(name, _)| *name != "class" && *name != "id")
        .collect();
    if !attributes.is_empty() {
        let properties = attributes
            .into_iter()
            .fold(Properties::new(), |props, (name, value)| {
                props.attr(name, Value::String(value.to_string()))
            });
        node = node.with_properties(properties);
    }

    let mut children = Vec::new();
    for child in element.children() {
        if let Some(elem) = ElementRef::wrap(child) {
            children.push(convert(elem));
        } else if let Node::Text(text) = child.value() {
            if !text.trim().is_empty() {
                children.push(VNode::text(collapse_whitespace(text)));
            }
        }
    }
    trim_edges(&mut children);

    if let [only] = children.as_slice() {
        if let (true, Some(text)) = (only.is_text(), &only.text) {
            return node.with_text(text.clone());
        }
    }
    if children.is_empty() {
        node
    } else {
        node.with_children(children)
    }
}

fn build_selector(el: &scraper::node::Element) -> String {
    let mut selector = el.name().to_string();
    // Read from the attribute to keep source order.
    if let Some(classes) = el.attr("class") {
        for class in classes.split_whitespace() {
            selector.push('.');
            selector.push_str(class);
        }
    }
    if let Some(id) = el.attr("id").filter(|id| !id.is_empty()) {
        selector.push('#');
        selector.push_str(id);
    }
    selector
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Strip leading whitespace of the first and trailing whitespace of the last text run.
fn trim_edges(children: &mut [VNode]) {
    if let Some(first) = children.first_mut().filter(|n| n.is_text()) {
        first.text = first.text.as_deref().map(|t| t.trim_start().to_string());
    }
    if let Some(last) = children.last_mut().filter(|n| n.is_text()) {
        last.text = last.text.as_deref().map(|t| t.trim_end().to_string());
    }
}
